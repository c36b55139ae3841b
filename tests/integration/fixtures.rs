//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - A fake host scheduler driven by hand-delivered notifications
//! - Recording start requests and completion callbacks
//! - Temporary task files

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use runseq::host::{
    HostScheduler, Notification, NotificationHub, Subscription, SubscriptionId, TaskEvent,
};
use runseq::{Callback, Outcome, TaskFailure, TaskKey, TaskRef};

/// How long to wait for something that should happen.
pub const EXPECT_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait to be confident something did not happen.
pub const QUIET_PERIOD: Duration = Duration::from_millis(50);

/// A host scheduler that never runs anything.
///
/// Start requests are recorded; tests complete or fail tasks by publishing
/// notifications themselves.
pub struct FakeScheduler {
    known: HashSet<String>,
    hub: NotificationHub,
    started: Mutex<Vec<Vec<TaskKey>>>,
    starts_tx: mpsc::UnboundedSender<Vec<TaskKey>>,
}

impl FakeScheduler {
    /// Create a fake that recognizes `names`, plus the receiver of its start
    /// requests.
    pub fn new(names: &[&str]) -> (Arc<Self>, StartLog) {
        let (starts_tx, starts_rx) = mpsc::unbounded_channel();
        let host = Arc::new(Self {
            known: names.iter().map(|n| n.to_string()).collect(),
            hub: NotificationHub::new(),
            started: Mutex::new(Vec::new()),
            starts_tx,
        });
        (host, StartLog { rx: starts_rx })
    }

    /// Report a task finished with a bare identifier.
    pub fn finish(&self, name: &str) {
        self.hub.publish(Notification::finished(TaskKey::name(name)));
    }

    /// Report a task finished with an event object.
    pub fn finish_event(&self, task: TaskKey) {
        self.hub.publish(Notification::finished(TaskEvent {
            task,
            duration: Duration::from_millis(1),
        }));
    }

    pub fn fail(&self, name: &str, message: &str) {
        self.hub.publish(Notification::error(TaskFailure::new(
            Some(TaskKey::name(name)),
            message,
        )));
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    /// Every start request so far, in order.
    pub fn started(&self) -> Vec<Vec<TaskKey>> {
        self.started.lock().unwrap().clone()
    }
}

impl HostScheduler for FakeScheduler {
    fn has_task(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    fn start(&self, tasks: &[TaskRef]) {
        let keys: Vec<TaskKey> = tasks.iter().map(TaskRef::key).collect();
        self.started.lock().unwrap().push(keys.clone());
        let _ = self.starts_tx.send(keys);
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.unsubscribe(id);
    }
}

/// Start requests made to a [`FakeScheduler`].
pub struct StartLog {
    rx: mpsc::UnboundedReceiver<Vec<TaskKey>>,
}

impl StartLog {
    /// Wait for the next start request.
    pub async fn next(&mut self) -> Vec<TaskKey> {
        tokio::time::timeout(EXPECT_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for a group to start")
            .expect("start log closed")
    }

    /// Assert no group starts within the quiet period.
    pub async fn assert_quiet(&mut self) {
        if let Ok(Some(keys)) = tokio::time::timeout(QUIET_PERIOD, self.rx.recv()).await {
            panic!("unexpected group start: {:?}", keys);
        }
    }
}

/// Records completion callback invocations.
#[derive(Clone)]
pub struct CallbackProbe {
    calls: Arc<Mutex<Vec<Outcome>>>,
    tx: mpsc::UnboundedSender<Outcome>,
}

/// A callback and the receiver of the outcomes it is invoked with.
pub fn probe() -> (Callback, CallbackProbe, mpsc::UnboundedReceiver<Outcome>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let probe = CallbackProbe {
        calls: Arc::new(Mutex::new(Vec::new())),
        tx,
    };
    let recorder = probe.clone();
    let callback: Callback = Box::new(move |outcome| {
        recorder.calls.lock().unwrap().push(outcome.clone());
        let _ = recorder.tx.send(outcome);
    });
    (callback, probe, rx)
}

impl CallbackProbe {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Wait for the callback to fire.
pub async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<Outcome>) -> Outcome {
    tokio::time::timeout(EXPECT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for completion callback")
        .expect("callback channel closed")
}

/// Let spawned sequence drivers process what is queued.
pub async fn settle() {
    tokio::time::sleep(QUIET_PERIOD).await;
}

pub fn keys(names: &[&str]) -> Vec<TaskKey> {
    names.iter().map(|n| TaskKey::name(*n)).collect()
}

/// Keys sorted by display form, for comparing concurrent sets.
pub fn sorted(mut keys: Vec<TaskKey>) -> Vec<TaskKey> {
    keys.sort_by_key(|k| k.to_string());
    keys
}

/// A temporary directory holding a task file.
pub struct TaskDir {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TaskDir {
    pub fn new(contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("runseq.toml");
        std::fs::write(&path, contents).expect("Failed to write task file");
        Self { temp_dir, path }
    }

    /// Lines written to `out.txt` in the directory, if any.
    pub fn output_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.temp_dir.path().join("out.txt"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
