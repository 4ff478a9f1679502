// src/core/task.rs

//! Tasks and task sets, with the lock guard and the freezable reset.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised when a task is created or modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The named task is locked.
    #[error("Task '{0}' is locked and cannot be modified.")]
    Locked(String),
    /// A task with this name is already registered.
    #[error("A task named '{0}' already exists.")]
    Duplicate(String),
}

/// Options accepted when a task is created.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Human-readable description.
    pub description: Option<String>,
    /// Initial step.
    pub exec: Option<String>,
    /// Whether extra command-line arguments are passed through to the steps.
    pub receive_args: bool,
    /// Task-local environment.
    pub env: BTreeMap<String, String>,
}

/// Options accepted by [`Task::reset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetOptions {
    /// Replaces the task's "receives raw extra arguments" flag when set.
    pub receive_args: Option<bool>,
}

/// A named unit of executable work scoped to one project.
///
/// A locked task rejects every in-place redefinition until [`Task::unlock`] is called.
/// A task whose reset has been frozen ignores all further resets for the rest of its
/// lifetime; freezing cannot be undone.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    name: String,
    description: Option<String>,
    steps: Vec<String>,
    env: BTreeMap<String, String>,
    receive_args: bool,
    locked: bool,
    #[serde(skip)]
    reset_frozen: bool,
}

impl Task {
    /// Creates an unlocked task.
    pub fn new(name: impl Into<String>, options: TaskOptions) -> Self {
        Self {
            name: name.into(),
            description: options.description,
            steps: options.exec.into_iter().collect(),
            env: options.env,
            receive_args: options.receive_args,
            locked: false,
            reset_frozen: false,
        }
    }

    /// Task name, unique within its [`TaskSet`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Shell steps, run in order.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Task-local environment, without the [`TaskSet`] overlay.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Whether extra command-line arguments are passed through.
    pub fn receives_args(&self) -> bool {
        self.receive_args
    }

    /// True while the task rejects redefinition.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True once [`Task::freeze_reset`] has been called.
    pub fn is_reset_frozen(&self) -> bool {
        self.reset_frozen
    }

    /// True when the task has no steps left to run.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Rejects further redefinition until [`Task::unlock`].
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Allows redefinition again.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Makes every later [`Task::reset`] a no-op.
    pub fn freeze_reset(&mut self) {
        self.reset_frozen = true;
    }

    fn ensure_unlocked(&self) -> Result<(), TaskError> {
        if self.locked {
            return Err(TaskError::Locked(self.name.clone()));
        }
        Ok(())
    }

    /// Clears all steps and, if given, installs `command` as the only step.
    ///
    /// # Errors
    /// Returns [`TaskError::Locked`] if the task is locked and its reset is not frozen.
    pub fn reset(&mut self, command: Option<&str>, options: ResetOptions) -> Result<(), TaskError> {
        if self.reset_frozen {
            log::trace!("Ignoring reset of frozen task '{}'", self.name);
            return Ok(());
        }
        self.ensure_unlocked()?;

        self.steps.clear();
        if let Some(command) = command {
            self.steps.push(command.to_string());
        }
        if let Some(receive_args) = options.receive_args {
            self.receive_args = receive_args;
        }
        Ok(())
    }

    /// Appends a step.
    pub fn exec(&mut self, command: impl Into<String>) -> Result<(), TaskError> {
        self.ensure_unlocked()?;
        self.steps.push(command.into());
        Ok(())
    }

    /// Sets an environment variable for this task only.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), TaskError> {
        self.ensure_unlocked()?;
        self.env.insert(key.into(), value.into());
        Ok(())
    }

    /// Appends `suffix` to the description. An absent description is treated as empty.
    pub fn append_description(&mut self, suffix: &str) {
        self.description
            .get_or_insert_with(String::new)
            .push_str(suffix);
    }
}

/// The tasks of one project, keyed by name, plus an environment overlay shared by all of them.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: BTreeMap<String, Task>,
    env: BTreeMap<String, String>,
}

impl TaskSet {
    /// Registers a new task.
    ///
    /// # Errors
    /// Returns [`TaskError::Duplicate`] if a task with the same name already exists.
    pub fn add_task(&mut self, name: &str, options: TaskOptions) -> Result<&mut Task, TaskError> {
        if self.tasks.contains_key(name) {
            return Err(TaskError::Duplicate(name.to_string()));
        }
        log::trace!("Registering task '{}'", name);
        Ok(self
            .tasks
            .entry(name.to_string())
            .or_insert_with(|| Task::new(name, options)))
    }

    /// Looks up a task by name.
    pub fn try_find(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Looks up a task by name for modification.
    pub fn try_find_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    /// Returns the named task, creating an empty one if it does not exist yet.
    pub fn find_or_add(&mut self, name: &str) -> &mut Task {
        self.tasks
            .entry(name.to_string())
            .or_insert_with(|| Task::new(name, TaskOptions::default()))
    }

    /// Sets an environment variable on every task of the set.
    pub fn add_environment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// The environment shared by every task of the set.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// The environment a task runs with: the shared overlay, then the task's own variables.
    pub fn effective_env(&self, task: &Task) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        env.extend(task.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Tasks in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_task() -> Task {
        Task::new(
            "build",
            TaskOptions {
                description: Some("Full release build".to_string()),
                exec: Some("tsc".to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_locked_task_rejects_reset_and_exec() {
        let mut task = build_task();
        task.lock();

        assert_eq!(
            task.reset(Some("echo"), ResetOptions::default()),
            Err(TaskError::Locked("build".to_string()))
        );
        assert!(task.exec("echo").is_err());
        assert!(task.set_env("A", "B").is_err());
        assert_eq!(task.steps(), ["tsc".to_string()]);
    }

    #[test]
    fn test_unlock_allows_reset() {
        let mut task = build_task();
        task.lock();
        task.unlock();

        task.reset(Some("npx nx run-many"), ResetOptions { receive_args: Some(true) })
            .unwrap();
        assert_eq!(task.steps(), ["npx nx run-many".to_string()]);
        assert!(task.receives_args());
    }

    #[test]
    fn test_frozen_reset_is_a_no_op_even_when_locked() {
        let mut task = build_task();
        task.freeze_reset();
        task.lock();

        assert!(task.reset(None, ResetOptions::default()).is_ok());
        assert_eq!(task.steps(), ["tsc".to_string()]);
    }

    #[test]
    fn test_append_description_on_empty_description() {
        let mut task = Task::new("test", TaskOptions::default());
        task.append_description(" for all affected projects");
        assert_eq!(task.description(), Some(" for all affected projects"));
    }

    #[test]
    fn test_task_set_rejects_duplicates() {
        let mut tasks = TaskSet::default();
        tasks.add_task("build", TaskOptions::default()).unwrap();
        assert_eq!(
            tasks.add_task("build", TaskOptions::default()).err(),
            Some(TaskError::Duplicate("build".to_string()))
        );
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_effective_env_prefers_task_variables() {
        let mut tasks = TaskSet::default();
        tasks.add_environment("PATH", "/shared");
        tasks.add_environment("CI", "1");
        let task = tasks.add_task("build", TaskOptions::default()).unwrap();
        task.set_env("PATH", "/task").unwrap();

        let task = tasks.try_find("build").unwrap().clone();
        let env = tasks.effective_env(&task);
        assert_eq!(env.get("PATH").map(String::as_str), Some("/task"));
        assert_eq!(env.get("CI").map(String::as_str), Some("1"));
    }
}
