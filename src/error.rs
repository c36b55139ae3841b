use thiserror::Error;

use crate::core::task::TaskKey;

/// Structural problems with a sequence, detected before any task starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No tasks were provided to the sequence")]
    NoTasks,

    #[error("Task {0} is not a valid task")]
    InvalidTask(String),

    #[error("Task {0} is not configured on the host scheduler")]
    TaskNotConfigured(String),

    #[error("Task {0} is listed more than once. This is probably a typo.")]
    DuplicateTask(String),

    #[error("An empty set was provided as a task group")]
    EmptySet,
}

/// A task reported failure while a sequence was running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe_failure(.task, .message))]
pub struct TaskFailure {
    /// The failing task, when the host scheduler knows it.
    pub task: Option<TaskKey>,
    pub message: String,
}

impl TaskFailure {
    pub fn new(task: Option<TaskKey>, message: impl Into<String>) -> Self {
        Self {
            task,
            message: message.into(),
        }
    }
}

fn describe_failure(task: &Option<TaskKey>, message: &str) -> String {
    match task {
        Some(task) => format!("Task {} failed: {}", task, message),
        None => format!("Task failed: {}", message),
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid sequence: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    TaskFailed(#[from] TaskFailure),

    #[error("No home directory")]
    NoHomeDir,

    #[error("No tokio runtime available: {0}")]
    Runtime(String),

    #[error("Invalid sequence transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
