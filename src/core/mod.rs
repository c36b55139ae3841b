//! Core domain models for runseq.
//!
//! Task references, groups, and the identifiers the host scheduler uses to
//! report on them.

pub mod task;

pub use task::{HandleId, TaskGroup, TaskHandle, TaskKey, TaskRef, TaskResult};
