//! Drives a [`SequenceMachine`] from host scheduler notifications.

use std::sync::Arc;

use crossterm::style::Stylize;
use tokio::task::JoinHandle;

use super::machine::{SequenceMachine, Step};
use super::validate::validate;
use crate::config::Config;
use crate::core::task::TaskGroup;
use crate::error::{Error, Result, TaskFailure};
use crate::host::{HostScheduler, Notification, ProcessScheduler, Subscription};
use crate::{rlog, rlog_trace, rlog_warn};

/// Outcome passed to a completion callback.
pub type Outcome = std::result::Result<(), TaskFailure>;

/// Completion callback, invoked exactly once per sequence.
pub type Callback = Box<dyn FnOnce(Outcome) + Send + 'static>;

/// Runs sequences against one host scheduler.
///
/// # Example
///
/// ```ignore
/// let runner = runseq::bind(Arc::new(host));
/// let handle = runner
///     .sequence()
///     .then("clean")
///     .then(["build", "lint"])
///     .then("test")
///     .on_complete(|outcome| println!("done: {:?}", outcome))
///     .run()?;
/// handle.wait().await?;
/// ```
pub struct Runner<S: HostScheduler> {
    scheduler: Arc<S>,
}

impl<S: HostScheduler> Clone for Runner<S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl Default for Runner<ProcessScheduler> {
    /// A runner over a [`ProcessScheduler`] holding the user's task file
    /// (`runseq.toml` unless `~/.runseq/config.toml` names another).
    fn default() -> Self {
        let config = Config::load().unwrap_or_else(|e| {
            rlog_warn!("Ignoring user config: {}", e);
            Config::default()
        });
        Self::bind(Arc::new(ProcessScheduler::from_config(&config)))
    }
}

impl<S: HostScheduler + 'static> Runner<S> {
    /// Create a runner bound to `scheduler`.
    pub fn bind(scheduler: Arc<S>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Arc<S> {
        &self.scheduler
    }

    /// Start building a sequence fluently.
    pub fn sequence(&self) -> SequenceBuilder<'_, S> {
        SequenceBuilder {
            runner: self,
            groups: Vec::new(),
            callback: None,
        }
    }

    /// Validate `groups` and start the first one.
    ///
    /// Configuration errors are returned here, before any task starts. Task
    /// failures are reported only through `callback` and the returned handle.
    /// The caller's groups are copied, never mutated.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self, groups: &[TaskGroup], callback: Option<Callback>) -> Result<SequenceHandle> {
        validate(self.scheduler.as_ref(), groups)?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;

        let mut machine = SequenceMachine::new(groups.to_vec());
        let step = machine.start()?;
        let mut driver = Driver {
            scheduler: Arc::clone(&self.scheduler),
            machine,
            subscription: self.scheduler.subscribe(),
            callback,
        };

        let join = match driver.apply(step) {
            Some(outcome) => {
                let outcome = driver.finish(outcome);
                runtime.spawn(async move { outcome })
            }
            None => runtime.spawn(driver.drive()),
        };
        Ok(SequenceHandle { join })
    }
}

/// Fluent construction of one sequence.
pub struct SequenceBuilder<'a, S: HostScheduler> {
    runner: &'a Runner<S>,
    groups: Vec<TaskGroup>,
    callback: Option<Callback>,
}

impl<S: HostScheduler + 'static> SequenceBuilder<'_, S> {
    /// Append a group: a name, a handle, or an array of them.
    pub fn then(mut self, group: impl Into<TaskGroup>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn run(self) -> Result<SequenceHandle> {
        self.runner.run(&self.groups, self.callback)
    }
}

/// A running sequence.
///
/// Dropping the handle does not stop the sequence.
#[derive(Debug)]
pub struct SequenceHandle {
    join: JoinHandle<Outcome>,
}

impl SequenceHandle {
    /// Wait for the sequence to end.
    pub async fn wait(self) -> Result<()> {
        match self.join.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(failure)) => Err(Error::TaskFailed(failure)),
            Err(e) => Err(Error::TaskJoin(e.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

struct Driver<S: HostScheduler> {
    scheduler: Arc<S>,
    machine: SequenceMachine,
    subscription: Subscription,
    callback: Option<Callback>,
}

impl<S: HostScheduler> Driver<S> {
    async fn drive(mut self) -> Outcome {
        loop {
            let Some(first) = self.subscription.recv().await else {
                let failure =
                    TaskFailure::new(None, "host scheduler closed the notification channel");
                let step = self.machine.on_error(failure);
                let outcome = self.apply(step).unwrap_or(Ok(()));
                return self.finish(outcome);
            };

            // Everything already queued belongs to the same turn.
            let mut batch = vec![first];
            while let Some(next) = self.subscription.try_recv() {
                batch.push(next);
            }

            if let Some(outcome) = self.handle_batch(batch) {
                return self.finish(outcome);
            }
        }
    }

    /// Process one turn of notifications. An error anywhere in the turn wins
    /// over completions in the same turn.
    fn handle_batch(&mut self, batch: Vec<Notification>) -> Option<Outcome> {
        let failure = batch.iter().find_map(|n| match n {
            Notification::TaskErr(failure) => Some(failure.clone()),
            Notification::TaskStop(_) => None,
        });
        if let Some(failure) = failure {
            let step = self.machine.on_error(failure);
            return self.apply(step);
        }

        for notification in batch {
            rlog_trace!("Notification: {:?}", notification);
            if let Notification::TaskStop(finished) = notification {
                let step = self.machine.on_finished(finished.task());
                if let Some(outcome) = self.apply(step) {
                    return Some(outcome);
                }
            }
        }
        None
    }

    /// Carry out a step. Returns the outcome once the sequence is terminal.
    fn apply(&mut self, step: Step) -> Option<Outcome> {
        match step {
            Step::Start(tasks) => {
                let names: Vec<String> = tasks.iter().map(ToString::to_string).collect();
                rlog!(
                    "Starting group {}/{}: [{}]",
                    self.machine.current_group(),
                    self.machine.total_groups(),
                    names.join(", ")
                );
                self.scheduler.start(&tasks);
                None
            }
            Step::Wait => None,
            Step::Complete => Some(Ok(())),
            Step::Abort(failure) => Some(Err(failure)),
        }
    }

    /// Terminal path: drop the subscription, then report.
    fn finish(mut self, outcome: Outcome) -> Outcome {
        self.scheduler.unsubscribe(self.subscription.id());
        match &outcome {
            Ok(()) => rlog!("Sequence complete ({} groups)", self.machine.total_groups()),
            Err(failure) => rlog!("Sequence aborted: {}", failure),
        }

        match self.callback.take() {
            Some(callback) => callback(outcome.clone()),
            None => {
                if let Err(failure) = &outcome {
                    eprintln!("{}", failure_diagnostic(failure));
                }
            }
        }
        outcome
    }
}

/// The stderr line for a failure nobody is listening for.
fn failure_diagnostic(failure: &TaskFailure) -> String {
    format!("{} {}", "Error running task sequence:".red(), failure)
}

/// Create a runner bound to a specific host scheduler.
pub fn bind<S: HostScheduler + 'static>(scheduler: Arc<S>) -> Runner<S> {
    Runner::bind(scheduler)
}

/// Run a sequence on the default [`ProcessScheduler`].
///
/// Named tasks resolve against the user's task file; direct handles always
/// work.
pub fn run(groups: &[TaskGroup], callback: Option<Callback>) -> Result<SequenceHandle> {
    Runner::default().run(groups, callback)
}
