pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod log;
pub mod sequence;

pub use crate::core::task::{TaskGroup, TaskHandle, TaskKey, TaskRef};
pub use error::{ConfigError, Error, Result, TaskFailure};
pub use sequence::{bind, run, Callback, Outcome, Runner, SequenceHandle};
