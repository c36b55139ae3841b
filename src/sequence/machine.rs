//! Group-by-group state machine.
//!
//! `SequenceMachine` holds no I/O: every transition returns a [`Step`] telling
//! the driver what to do with the host scheduler. This keeps the ordering
//! rules testable without a runtime.

use std::collections::{HashSet, VecDeque};

use crate::core::task::{TaskGroup, TaskKey, TaskRef};
use crate::error::{Error, Result, TaskFailure};
use crate::{rlog_debug, rlog_error};

/// Lifecycle of one sequence run.
///
/// Idle -> AwaitingGroup -> Advancing -> AwaitingGroup ... -> Done
///
/// Any non-terminal phase may move to Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePhase {
    /// Constructed, nothing started yet.
    Idle,
    /// One group is running and its pending set is non-empty.
    AwaitingGroup,
    /// The active group just emptied; the next one is about to start.
    Advancing,
    /// Every group completed.
    Done,
    /// A task reported an error.
    Failed,
}

impl SequencePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SequencePhase::Done | SequencePhase::Failed)
    }
}

impl std::fmt::Display for SequencePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SequencePhase::Idle => "idle",
            SequencePhase::AwaitingGroup => "awaiting_group",
            SequencePhase::Advancing => "advancing",
            SequencePhase::Done => "done",
            SequencePhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Action the driver must take after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Ask the host to start these tasks concurrently.
    Start(Vec<TaskRef>),
    /// Nothing to do until the next notification.
    Wait,
    /// All groups finished.
    Complete,
    /// The sequence failed.
    Abort(TaskFailure),
}

#[derive(Debug)]
pub struct SequenceMachine {
    phase: SequencePhase,
    queue: VecDeque<Vec<TaskRef>>,
    pending: HashSet<TaskKey>,
    started_groups: usize,
    total_groups: usize,
}

impl SequenceMachine {
    /// Build a machine over already-validated groups.
    pub fn new(groups: Vec<TaskGroup>) -> Self {
        let queue: VecDeque<Vec<TaskRef>> = groups.into_iter().map(TaskGroup::into_refs).collect();
        let total_groups = queue.len();
        Self {
            phase: SequencePhase::Idle,
            queue,
            pending: HashSet::new(),
            started_groups: 0,
            total_groups,
        }
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    /// Tasks of the active group that have not reported completion.
    pub fn pending(&self) -> &HashSet<TaskKey> {
        &self.pending
    }

    /// Groups not yet started.
    pub fn remaining_groups(&self) -> usize {
        self.queue.len()
    }

    /// 1-based position of the active group, 0 before start.
    pub fn current_group(&self) -> usize {
        self.started_groups
    }

    pub fn total_groups(&self) -> usize {
        self.total_groups
    }

    pub fn can_transition(&self, target: SequencePhase) -> bool {
        use SequencePhase::*;
        matches!(
            (self.phase, target),
            (Idle, AwaitingGroup)
                | (Idle, Done)
                | (Idle, Failed)
                | (AwaitingGroup, Advancing)
                | (AwaitingGroup, Failed)
                | (Advancing, AwaitingGroup)
                | (Advancing, Done)
                | (Advancing, Failed)
        )
    }

    /// Start the first group.
    pub fn start(&mut self) -> Result<Step> {
        if self.phase != SequencePhase::Idle {
            return Err(Error::InvalidTransition {
                from: self.phase.to_string(),
                to: SequencePhase::AwaitingGroup.to_string(),
            });
        }
        Ok(self.advance())
    }

    /// React to a "task finished" notification.
    ///
    /// Only members of the active group's pending set count; anything else is
    /// a late notification from an earlier group and is ignored.
    pub fn on_finished(&mut self, task: &TaskKey) -> Step {
        if self.phase != SequencePhase::AwaitingGroup {
            rlog_debug!("Ignoring finish of {} in phase {}", task, self.phase);
            return Step::Wait;
        }
        if !self.pending.remove(task) {
            rlog_debug!(
                "Ignoring finish of {}: not pending in group {}",
                task,
                self.started_groups
            );
            return Step::Wait;
        }
        rlog_debug!(
            "Task {} finished, {} pending in group {}",
            task,
            self.pending.len(),
            self.started_groups
        );
        if !self.pending.is_empty() {
            return Step::Wait;
        }
        self.set_phase(SequencePhase::Advancing);
        self.advance()
    }

    /// React to a "task error" notification. Terminal phases ignore it so
    /// the outcome is reported once.
    pub fn on_error(&mut self, failure: TaskFailure) -> Step {
        if self.phase.is_terminal() {
            rlog_debug!("Ignoring error after sequence ended: {}", failure);
            return Step::Wait;
        }
        rlog_error!(
            "Sequence failed in group {}/{}: {}",
            self.started_groups,
            self.total_groups,
            failure
        );
        self.set_phase(SequencePhase::Failed);
        self.pending.clear();
        self.queue.clear();
        Step::Abort(failure)
    }

    fn advance(&mut self) -> Step {
        while let Some(group) = self.queue.pop_front() {
            self.started_groups += 1;
            // Empty groups cannot pass validation; skip rather than stall.
            if group.is_empty() {
                continue;
            }
            self.pending = group.iter().map(TaskRef::key).collect();
            self.set_phase(SequencePhase::AwaitingGroup);
            return Step::Start(group);
        }
        self.pending.clear();
        self.set_phase(SequencePhase::Done);
        Step::Complete
    }

    fn set_phase(&mut self, target: SequencePhase) {
        debug_assert!(
            self.can_transition(target),
            "invalid transition {} -> {}",
            self.phase,
            target
        );
        self.phase = target;
    }
}
