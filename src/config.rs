use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::task::TaskGroup;
use crate::{rlog_debug, Error, Result};

/// Default name of the task file looked up in the working directory.
pub const DEFAULT_TASK_FILE: &str = "runseq.toml";

/// User-level settings from `~/.runseq/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Shell used to run task commands.
    pub shell: Option<String>,
    /// Task file used when `--file` is not given.
    pub task_file: Option<String>,
}

impl Config {
    pub fn runseq_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".runseq"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::runseq_dir()?.join("config.toml"))
    }

    pub fn effective_shell(&self) -> &str {
        self.shell.as_deref().unwrap_or("sh")
    }

    pub fn effective_task_file(&self) -> PathBuf {
        match &self.task_file {
            Some(path) => expand_tilde(path),
            None => PathBuf::from(DEFAULT_TASK_FILE),
        }
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from `path`, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        rlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            rlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        rlog_debug!(
            "Config loaded: shell={:?}, task_file={:?}",
            config.shell,
            config.task_file
        );
        Ok(config)
    }
}

/// A shell command registered as a named task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSpec {
    pub command: String,
    /// Working directory, relative to the task file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl TaskSpec {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            cwd: None,
        }
    }
}

/// One entry of the task file's `sequence`: a task name or a concurrent set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GroupSpec {
    Task(String),
    Set(Vec<String>),
}

impl From<&GroupSpec> for TaskGroup {
    fn from(spec: &GroupSpec) -> Self {
        match spec {
            GroupSpec::Task(name) => TaskGroup::Name(name.clone()),
            GroupSpec::Set(names) => {
                TaskGroup::Set(names.iter().cloned().map(TaskGroup::Name).collect())
            }
        }
    }
}

/// Task definitions plus the default sequence, as read from `runseq.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskFile {
    #[serde(default)]
    pub sequence: Vec<GroupSpec>,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskSpec>,
}

impl TaskFile {
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read a task file. Relative `cwd` entries are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        rlog_debug!("TaskFile::load path={}", path.display());
        let mut file = Self::parse(&fs::read_to_string(path)?)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for spec in file.tasks.values_mut() {
            if let Some(cwd) = spec.cwd.as_mut() {
                if cwd.is_relative() {
                    *cwd = base.join(&*cwd);
                }
            }
        }
        rlog_debug!(
            "TaskFile loaded: {} tasks, {} groups",
            file.tasks.len(),
            file.sequence.len()
        );
        Ok(file)
    }

    /// The default sequence as task groups.
    pub fn groups(&self) -> Vec<TaskGroup> {
        self.sequence.iter().map(TaskGroup::from).collect()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
