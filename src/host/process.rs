//! Host scheduler that runs named tasks as shell commands.
//!
//! Named tasks are registered [`TaskSpec`]s executed through
//! `<shell> -c <command>`; direct handles are spawned as futures. Every task
//! runs on its own tokio task, so a started group executes concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::process::Command;

use super::{
    HostScheduler, Notification, NotificationHub, Subscription, SubscriptionId, TaskEvent,
};
use crate::config::{Config, TaskFile, TaskSpec};
use crate::core::task::{TaskHandle, TaskKey, TaskRef};
use crate::error::TaskFailure;
use crate::{rlog, rlog_debug, rlog_error, rlog_warn};

/// Runs registered shell commands and direct task handles.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use runseq::config::TaskSpec;
/// use runseq::host::ProcessScheduler;
///
/// let mut host = ProcessScheduler::new();
/// host.register("build", TaskSpec::new("make build"));
/// let runner = runseq::bind(Arc::new(host));
/// ```
#[derive(Debug)]
pub struct ProcessScheduler {
    shell: String,
    tasks: HashMap<String, TaskSpec>,
    hub: Arc<NotificationHub>,
}

impl ProcessScheduler {
    /// Create an empty scheduler that runs commands through `sh`.
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    pub fn with_shell(shell: &str) -> Self {
        Self {
            shell: shell.to_string(),
            tasks: HashMap::new(),
            hub: Arc::new(NotificationHub::new()),
        }
    }

    /// Create a scheduler with every task of a task file registered.
    pub fn from_task_file(file: &TaskFile, shell: &str) -> Self {
        let mut scheduler = Self::with_shell(shell);
        for (name, spec) in &file.tasks {
            scheduler.register(name, spec.clone());
        }
        scheduler
    }

    /// Create a scheduler from the user's task file and shell.
    ///
    /// A missing or unreadable task file leaves the scheduler with no named
    /// tasks.
    pub fn from_config(config: &Config) -> Self {
        let path = config.effective_task_file();
        if !path.exists() {
            rlog_debug!("No task file at {}, no named tasks", path.display());
            return Self::with_shell(config.effective_shell());
        }
        match TaskFile::load(&path) {
            Ok(file) => Self::from_task_file(&file, config.effective_shell()),
            Err(e) => {
                rlog_warn!("Ignoring task file {}: {}", path.display(), e);
                Self::with_shell(config.effective_shell())
            }
        }
    }

    /// Register (or replace) a named task.
    pub fn register(&mut self, name: &str, spec: TaskSpec) {
        self.tasks.insert(name.to_string(), spec);
    }

    /// Registered task names, sorted.
    pub fn task_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn fail(&self, task: TaskKey, message: String) {
        rlog_error!("Task {} failed: {}", task, message);
        self.hub
            .publish(Notification::error(TaskFailure::new(Some(task), message)));
    }
}

impl Default for ProcessScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl HostScheduler for ProcessScheduler {
    fn has_task(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    fn start(&self, tasks: &[TaskRef]) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                for task in tasks {
                    self.fail(task.key(), format!("no tokio runtime: {}", e));
                }
                return;
            }
        };

        for task in tasks {
            match task {
                TaskRef::Name(name) => {
                    let Some(spec) = self.tasks.get(name) else {
                        self.fail(task.key(), "task is not registered".to_string());
                        continue;
                    };
                    rlog!("Starting task {}: {}", name, spec.command);
                    runtime.spawn(run_command(
                        self.shell.clone(),
                        name.clone(),
                        spec.clone(),
                        Arc::clone(&self.hub),
                    ));
                }
                TaskRef::Handle(handle) => {
                    rlog!("Starting task {}", task);
                    runtime.spawn(run_handle(handle.clone(), Arc::clone(&self.hub)));
                }
            }
        }
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.unsubscribe(id);
    }
}

async fn run_command(shell: String, name: String, spec: TaskSpec, hub: Arc<NotificationHub>) {
    let started = Instant::now();
    let mut command = Command::new(&shell);
    command.arg("-c").arg(&spec.command).kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }

    let task = TaskKey::Name(name);
    let notification = match command.status().await {
        Ok(status) if status.success() => {
            let duration = started.elapsed();
            rlog!("Finished task {} after {:?}", task, duration);
            Notification::finished(TaskEvent { task, duration })
        }
        Ok(status) => {
            let message = match status.code() {
                Some(code) => format!("command exited with code {}", code),
                None => "command terminated by signal".to_string(),
            };
            rlog_error!("Task {} failed: {}", task, message);
            Notification::error(TaskFailure::new(Some(task), message))
        }
        Err(e) => {
            let message = format!("failed to spawn {}: {}", shell, e);
            rlog_error!("Task {} failed: {}", task, message);
            Notification::error(TaskFailure::new(Some(task), message))
        }
    };
    hub.publish(notification);
}

async fn run_handle(handle: TaskHandle, hub: Arc<NotificationHub>) {
    let started = Instant::now();
    let task = TaskKey::Handle(handle.id());
    let notification = match handle.invoke().await {
        Ok(()) => {
            let duration = started.elapsed();
            rlog_debug!("Finished task {} after {:?}", task, duration);
            Notification::finished(TaskEvent { task, duration })
        }
        Err(message) => {
            rlog_error!("Task {} failed: {}", task, message);
            Notification::error(TaskFailure::new(Some(task), message))
        }
    };
    hub.publish(notification);
}
