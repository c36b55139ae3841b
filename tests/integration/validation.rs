//! Configuration error tests.
//!
//! Every malformed sequence must be rejected synchronously, before any task
//! starts and before a listener is registered on the host.

use runseq::{ConfigError, Error, TaskGroup, TaskHandle};

use crate::fixtures::FakeScheduler;

fn assert_rejected(groups: &[TaskGroup], expected: ConfigError) {
    let (host, _starts) = FakeScheduler::new(&["a", "b", "c"]);
    let runner = runseq::bind(host.clone());

    match runner.run(groups, None) {
        Err(Error::Config(err)) => assert_eq!(err, expected),
        Err(other) => panic!("expected config error, got {}", other),
        Ok(_) => panic!("expected {:?} to be rejected", groups),
    }
    assert!(host.started().is_empty(), "no task may start");
    assert_eq!(host.subscriber_count(), 0, "no listener may remain");
}

#[tokio::test]
async fn test_empty_input_rejected() {
    assert_rejected(&[], ConfigError::NoTasks);
}

#[tokio::test]
async fn test_empty_set_rejected() {
    assert_rejected(
        &[TaskGroup::from("a"), TaskGroup::Set(vec![])],
        ConfigError::EmptySet,
    );
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    assert_rejected(
        &runseq::groups!["a", ["b", "c"], "b"],
        ConfigError::DuplicateTask("b".to_string()),
    );
}

#[tokio::test]
async fn test_unknown_name_rejected() {
    assert_rejected(
        &runseq::groups!["a", "deploy"],
        ConfigError::TaskNotConfigured("deploy".to_string()),
    );
}

#[tokio::test]
async fn test_nested_set_rejected() {
    let nested = TaskGroup::Set(vec![TaskGroup::from("a"), TaskGroup::from(["b", "c"])]);
    let (host, _starts) = FakeScheduler::new(&["a", "b", "c"]);
    let runner = runseq::bind(host.clone());

    let result = runner.run(&[nested], None);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidTask(_)))
    ));
    assert!(host.started().is_empty());
}

#[tokio::test]
async fn test_error_late_in_input_still_starts_nothing() {
    // The bad group is last; validation must still run before the first start.
    let handle = TaskHandle::new(|| async { Ok(()) });
    assert_rejected(
        &[
            TaskGroup::from(handle),
            TaskGroup::from("a"),
            TaskGroup::from("missing"),
        ],
        ConfigError::TaskNotConfigured("missing".to_string()),
    );
}

#[test]
fn test_config_error_messages() {
    assert_eq!(
        ConfigError::EmptySet.to_string(),
        "An empty set was provided as a task group"
    );
    assert!(ConfigError::TaskNotConfigured("x".to_string())
        .to_string()
        .contains("not configured"));
}
