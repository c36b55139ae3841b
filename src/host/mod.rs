//! Host scheduler contract.
//!
//! The host scheduler is the system that actually executes tasks. A sequence
//! only needs to ask it whether a name is registered, to start a batch of
//! tasks concurrently, and to listen for its completion and error
//! notifications.

mod hub;
mod process;

pub use hub::NotificationHub;
pub use process::ProcessScheduler;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::task::{TaskKey, TaskRef};
use crate::error::TaskFailure;

/// Rich completion event some hosts emit instead of a bare identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    /// The task that finished.
    pub task: TaskKey,
    /// Wall-clock time the task ran for.
    pub duration: Duration,
}

/// Payload of a "task finished" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finished {
    /// Bare task identifier.
    Id(TaskKey),
    /// Event object carrying the identifier.
    Event(TaskEvent),
}

impl Finished {
    /// The identifier of the finished task, whatever shape it arrived in.
    pub fn task(&self) -> &TaskKey {
        match self {
            Finished::Id(task) => task,
            Finished::Event(event) => &event.task,
        }
    }
}

impl From<TaskKey> for Finished {
    fn from(task: TaskKey) -> Self {
        Self::Id(task)
    }
}

impl From<TaskEvent> for Finished {
    fn from(event: TaskEvent) -> Self {
        Self::Event(event)
    }
}

/// Notifications broadcast by a host scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A task finished successfully.
    TaskStop(Finished),
    /// A task failed.
    TaskErr(TaskFailure),
}

impl Notification {
    pub fn finished(task: impl Into<Finished>) -> Self {
        Self::TaskStop(task.into())
    }

    pub fn error(failure: TaskFailure) -> Self {
        Self::TaskErr(failure)
    }
}

/// Identifies one live subscription on a host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiving end of a host subscription.
///
/// Receives both "task finished" and "task error" notifications in the order
/// the host emitted them.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, rx: mpsc::UnboundedReceiver<Notification>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next notification. Returns `None` once the host has
    /// dropped this subscription.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Take a notification that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}

/// A system that runs tasks and reports their completion.
pub trait HostScheduler: Send + Sync {
    /// Whether `name` is registered as a runnable task.
    fn has_task(&self, name: &str) -> bool;

    /// Start all `tasks` concurrently. Fire-and-forget: outcomes arrive as
    /// notifications.
    fn start(&self, tasks: &[TaskRef]);

    /// Register a listener for finished and error notifications.
    fn subscribe(&self) -> Subscription;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
