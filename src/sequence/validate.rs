//! Upfront structural checks on a sequence.

use std::collections::HashSet;

use crate::core::task::{TaskGroup, TaskKey};
use crate::error::ConfigError;
use crate::host::HostScheduler;

/// Check a list of groups before anything starts.
///
/// Rejects an empty list, nested or empty sets, names the host does not know,
/// and any task listed more than once across the flattened top level. Never
/// mutates `groups`.
pub fn validate<S: HostScheduler + ?Sized>(
    scheduler: &S,
    groups: &[TaskGroup],
) -> Result<(), ConfigError> {
    if groups.is_empty() {
        return Err(ConfigError::NoTasks);
    }
    let mut seen = HashSet::new();
    validate_groups(scheduler, groups, false, &mut seen)
}

/// `in_set` forbids further nesting; `seen` carries duplicate tracking across
/// the recursion.
fn validate_groups<S: HostScheduler + ?Sized>(
    scheduler: &S,
    groups: &[TaskGroup],
    in_set: bool,
    seen: &mut HashSet<TaskKey>,
) -> Result<(), ConfigError> {
    for group in groups {
        match group {
            TaskGroup::Name(name) => {
                if name.trim().is_empty() {
                    return Err(ConfigError::InvalidTask(group.to_string()));
                }
                if !scheduler.has_task(name) {
                    return Err(ConfigError::TaskNotConfigured(name.clone()));
                }
                if !seen.insert(TaskKey::Name(name.clone())) {
                    return Err(ConfigError::DuplicateTask(name.clone()));
                }
            }
            TaskGroup::Handle(handle) => {
                let key = TaskKey::Handle(handle.id());
                if !seen.insert(key.clone()) {
                    return Err(ConfigError::DuplicateTask(key.to_string()));
                }
            }
            TaskGroup::Set(members) => {
                if in_set {
                    return Err(ConfigError::InvalidTask(group.to_string()));
                }
                if members.is_empty() {
                    return Err(ConfigError::EmptySet);
                }
                validate_groups(scheduler, members, true, seen)?;
            }
        }
    }
    Ok(())
}
