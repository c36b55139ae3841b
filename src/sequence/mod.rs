//! Sequential execution of task groups on a host scheduler.
//!
//! A sequence runs its groups strictly one after another: the next group is
//! started only once every task of the current group has reported
//! completion, and the first task error aborts the rest.

pub mod machine;
mod runner;
pub mod validate;

pub use machine::{SequenceMachine, SequencePhase, Step};
pub use runner::{bind, run, Callback, Outcome, Runner, SequenceBuilder, SequenceHandle};
pub use validate::validate;
