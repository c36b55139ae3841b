//! Task references and groups.
//!
//! A sequence is an ordered list of [`TaskGroup`]s. Each group is either a
//! single task (registered by name on the host scheduler, or a direct
//! [`TaskHandle`]) or a concurrent set of tasks that start together.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome reported by a directly-invoked task.
pub type TaskResult = std::result::Result<(), String>;

type TaskFn = dyn Fn() -> BoxFuture<'static, TaskResult> + Send + Sync;

/// Identifier of a direct task handle.
///
/// Handles are not registered by name, so the host scheduler reports their
/// completion under this generated id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(pub Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity under which the host scheduler reports a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Name(String),
    Handle(HandleId),
}

impl TaskKey {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKey::Name(name) => write!(f, "{}", name),
            TaskKey::Handle(id) => write!(f, "<handle {}>", id.short()),
        }
    }
}

impl From<&str> for TaskKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<HandleId> for TaskKey {
    fn from(id: HandleId) -> Self {
        Self::Handle(id)
    }
}

/// A runnable unit passed to the host scheduler directly instead of by name.
#[derive(Clone)]
pub struct TaskHandle {
    id: HandleId,
    label: Option<String>,
    run: Arc<TaskFn>,
}

impl TaskHandle {
    /// Wrap an async closure as a task handle with a fresh id.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        Self {
            id: HandleId::new(),
            label: None,
            run: Arc::new(move || f().boxed()),
        }
    }

    /// Attach a human-readable label used in logs.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Create the future for one execution of this task.
    pub fn invoke(&self) -> BoxFuture<'static, TaskResult> {
        (self.run)()
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A single task the host scheduler can start.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskRef {
    Name(String),
    Handle(TaskHandle),
}

impl TaskRef {
    pub fn key(&self) -> TaskKey {
        match self {
            TaskRef::Name(name) => TaskKey::Name(name.clone()),
            TaskRef::Handle(handle) => TaskKey::Handle(handle.id()),
        }
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskRef::Name(name) => write!(f, "{}", name),
            TaskRef::Handle(handle) => match handle.label() {
                Some(label) => write!(f, "{}", label),
                None => write!(f, "{}", self.key()),
            },
        }
    }
}

impl From<&str> for TaskRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TaskRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<TaskHandle> for TaskRef {
    fn from(handle: TaskHandle) -> Self {
        Self::Handle(handle)
    }
}

/// One entry of a sequence.
///
/// `Set` may syntactically hold further sets; validation rejects that, as
/// sets nest only one level deep.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskGroup {
    Name(String),
    Handle(TaskHandle),
    Set(Vec<TaskGroup>),
}

impl TaskGroup {
    /// Number of tasks that start when this group runs.
    pub fn len(&self) -> usize {
        match self {
            TaskGroup::Set(members) => members.iter().map(TaskGroup::len).sum(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten this group into the task references to start together.
    pub fn into_refs(self) -> Vec<TaskRef> {
        match self {
            TaskGroup::Name(name) => vec![TaskRef::Name(name)],
            TaskGroup::Handle(handle) => vec![TaskRef::Handle(handle)],
            TaskGroup::Set(members) => members
                .into_iter()
                .flat_map(TaskGroup::into_refs)
                .collect(),
        }
    }
}

impl std::fmt::Display for TaskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskGroup::Name(name) => write!(f, "{:?}", name),
            TaskGroup::Handle(handle) => write!(f, "{}", TaskKey::Handle(handle.id())),
            TaskGroup::Set(members) => {
                write!(f, "[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for TaskGroup {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TaskGroup {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<TaskHandle> for TaskGroup {
    fn from(handle: TaskHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<TaskRef> for TaskGroup {
    fn from(task: TaskRef) -> Self {
        match task {
            TaskRef::Name(name) => Self::Name(name),
            TaskRef::Handle(handle) => Self::Handle(handle),
        }
    }
}

impl<T: Into<TaskGroup>> From<Vec<T>> for TaskGroup {
    fn from(members: Vec<T>) -> Self {
        Self::Set(members.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<TaskGroup>, const N: usize> From<[T; N]> for TaskGroup {
    fn from(members: [T; N]) -> Self {
        Self::Set(members.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<TaskGroup>` from names, handles, and arrays of them.
///
/// ```ignore
/// let groups = runseq::groups!["clean", ["build", "lint"], "test"];
/// ```
#[macro_export]
macro_rules! groups {
    ($($group:expr),* $(,)?) => {
        vec![$($crate::core::task::TaskGroup::from($group)),*]
    };
}
