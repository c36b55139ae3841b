//! End-to-end tests with real shell commands.
//!
//! Each task appends its name to `out.txt` so the observed order can be
//! checked after the sequence ends.

#![cfg(unix)]

use std::sync::Arc;

use runseq::config::TaskFile;
use runseq::host::ProcessScheduler;
use runseq::Error;

use crate::fixtures::TaskDir;

const TASKS: &str = r#"
sequence = ["first", ["left", "right"], "last"]

[tasks.first]
command = "echo first >> out.txt"
cwd = "."

[tasks.left]
command = "sleep 0.05 && echo left >> out.txt"
cwd = "."

[tasks.right]
command = "echo right >> out.txt"
cwd = "."

[tasks.last]
command = "echo last >> out.txt"
cwd = "."

[tasks.broken]
command = "exit 7"
"#;

fn host_for(dir: &TaskDir) -> (TaskFile, Arc<ProcessScheduler>) {
    let file = TaskFile::load(&dir.path).unwrap();
    let host = Arc::new(ProcessScheduler::from_task_file(&file, "sh"));
    (file, host)
}

#[tokio::test]
async fn test_task_file_sequence_runs_in_order() {
    let dir = TaskDir::new(TASKS);
    let (file, host) = host_for(&dir);
    let runner = runseq::bind(host.clone());

    runner.run(&file.groups(), None).unwrap().wait().await.unwrap();

    let lines = dir.output_lines();
    assert_eq!(lines.len(), 4, "got {:?}", lines);
    assert_eq!(lines[0], "first");
    assert_eq!(lines[3], "last");
    assert!(lines[1..3].contains(&"left".to_string()));
    assert!(lines[1..3].contains(&"right".to_string()));
    assert_eq!(host.subscriber_count(), 0);
}

#[tokio::test]
async fn test_failing_command_aborts_sequence() {
    let dir = TaskDir::new(TASKS);
    let (_file, host) = host_for(&dir);
    let runner = runseq::bind(host.clone());

    let handle = runner
        .sequence()
        .then("first")
        .then("broken")
        .then("last")
        .run()
        .unwrap();

    match handle.wait().await {
        Err(Error::TaskFailed(failure)) => assert!(failure.message.contains("code 7")),
        other => panic!("expected task failure, got {:?}", other),
    }
    assert_eq!(dir.output_lines(), vec!["first".to_string()]);
}
