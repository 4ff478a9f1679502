// src/core/configurator.rs

//! The Nx configurator attached to a workspace root.
//!
//! Attaching registers the standing `run-many` and `graph` tasks and the Nx cache
//! ignore. After that the external driver calls [`NxConfigurator::pre_synthesize`]
//! and [`NxConfigurator::synthesize`] exactly once each, in that order.

use crate::{
    constants::{
        DEFAULT_RELEASE_BRANCH, DEFAULT_TASK_NAME, NX_CACHE_DIR, NX_RUNNER_PACKAGES,
        NX_VERSION_CONSTRAINT, OVERRIDE_DESCRIPTION_SUFFIX, WORKSPACE_MANIFEST_FILENAME,
    },
    core::{
        env_patch, graph, paths,
        run_many::{compose_run_many_command, exec_run_many_command},
        task::{ResetOptions, Task, TaskError, TaskOptions},
        workspace::{GeneratedFile, ProjectId, Workspace},
    },
    models::{Ecosystem, EcosystemKind, OverrideOptions, PackageManager, RunManyOptions, WorkspaceManifest},
};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by the lifecycle phases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A phase was called twice or before the previous one.
    #[error("Lifecycle phase '{requested}' cannot run while the configurator is '{current}'.")]
    OutOfOrder {
        /// The phase the call would have entered.
        requested: Phase,
        /// The phase the configurator is in.
        current: Phase,
    },
    /// A task could not be reset.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// The workspace manifest could not be serialized.
    #[error("Failed to render the workspace manifest: {0}")]
    Manifest(String),
}

/// The lifecycle position of a configurator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Attached; no phase has run yet.
    Configured,
    /// [`NxConfigurator::pre_synthesize`] has run.
    PreSynthesized,
    /// Both phases have run.
    Synthesized,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configured => "configured",
            Self::PreSynthesized => "pre-synthesized",
            Self::Synthesized => "synthesized",
        };
        f.write_str(label)
    }
}

/// Options accepted by [`NxConfigurator::attach`].
#[derive(Debug, Clone, Default)]
pub struct NxConfiguratorOptions {
    /// Branch `nx affected` runs against. Defaults to `mainline`.
    pub default_release_branch: Option<String>,
}

/// Nx configuration owned by the workspace root.
#[derive(Debug)]
pub struct NxConfigurator {
    package_manager: PackageManager,
    nx_plugins: BTreeMap<String, String>,
    phase: Phase,
}

impl NxConfigurator {
    /// Attaches the configurator to the workspace root.
    ///
    /// # Errors
    /// Fails if the root already defines a `run-many` or `graph` task.
    pub fn attach(workspace: &mut Workspace, options: NxConfiguratorOptions) -> Result<Self, TaskError> {
        let package_manager = match &workspace.root().ecosystem {
            Ecosystem::Node(settings) => settings.package_manager,
            _ => PackageManager::default(),
        };

        let root = workspace.root_mut();
        root.add_gitignore(NX_CACHE_DIR);
        root.tasks.add_task(
            "run-many",
            TaskOptions {
                description: Some("Run task against multiple workspace projects".to_string()),
                exec: Some(package_manager.exec(&["nx", "run-many"])),
                receive_args: true,
                ..Default::default()
            },
        )?;
        root.tasks.add_task(
            "graph",
            TaskOptions {
                description: Some("Generate dependency graph for monorepo".to_string()),
                exec: Some(package_manager.exec(&["nx", "graph"])),
                receive_args: true,
                ..Default::default()
            },
        )?;

        workspace.nx.default_base = options
            .default_release_branch
            .unwrap_or_else(|| DEFAULT_RELEASE_BRANCH.to_string());
        log::debug!(
            "Nx configurator attached to '{}' (package manager: {:?}, default base: {})",
            workspace.root().name,
            package_manager,
            workspace.nx.default_base
        );

        Ok(Self {
            package_manager,
            nx_plugins: BTreeMap::new(),
            phase: Phase::Configured,
        })
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The package manager whose exec prefix fronts every Nx command.
    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    /// Plugins recorded by [`Self::ensure_nx_install_task`], by package name.
    pub fn nx_plugins(&self) -> &BTreeMap<String, String> {
        &self.nx_plugins
    }

    /// The `nx run-many` argument list for `options`.
    pub fn compose_nx_run_many_command(&self, options: &RunManyOptions) -> Vec<String> {
        compose_run_many_command(options)
    }

    /// The full `nx run-many` command line, behind the package manager's exec prefix.
    pub fn exec_nx_run_many_command(&self, options: &RunManyOptions) -> String {
        exec_run_many_command(self.package_manager, options)
    }

    /// Adds a root task that runs `nx run-many` with the given options.
    pub fn add_nx_run_many_task<'w>(
        &self,
        workspace: &'w mut Workspace,
        name: &str,
        options: &RunManyOptions,
    ) -> Result<&'w mut Task, TaskError> {
        let exec = self.exec_nx_run_many_command(options);
        workspace.root_mut().tasks.add_task(
            name,
            TaskOptions {
                exec: Some(exec),
                receive_args: true,
                ..Default::default()
            },
        )
    }

    /// Rewrites `task` into a fan-out task that runs `nx run-many`.
    ///
    /// With `force` the task is unlocked first; without it a locked task is rejected,
    /// unless its reset is frozen: then the steps stay as they are and only the
    /// description changes. The description suffix is appended on every call, so overriding the same task
    /// twice repeats it. With `disable_reset` the task ignores every later reset.
    pub fn override_task(
        &self,
        task: &mut Task,
        options: &RunManyOptions,
        overrides: OverrideOptions,
    ) -> Result<(), TaskError> {
        if overrides.force {
            task.unlock();
        }

        task.reset(
            Some(&self.exec_nx_run_many_command(options)),
            ResetOptions {
                receive_args: Some(true),
            },
        )?;
        task.append_description(OVERRIDE_DESCRIPTION_SUFFIX);

        if overrides.disable_reset {
            task.freeze_reset();
        }
        log::debug!("Task '{}' now fans out to '{}'", task.name(), options.target);
        Ok(())
    }

    /// Looks up `task_name` in `project` and overrides it (see [`Self::override_task`]).
    /// A missing task is not an error: `Ok(None)` is returned and nothing changes.
    pub fn override_nx_build_task<'w>(
        &self,
        workspace: &'w mut Workspace,
        project: ProjectId,
        task_name: &str,
        options: &RunManyOptions,
        overrides: OverrideOptions,
    ) -> Result<Option<&'w mut Task>, TaskError> {
        let Some(task) = workspace.project_mut(project).tasks.try_find_mut(task_name) else {
            log::trace!("No task '{}' to override", task_name);
            return Ok(None);
        };
        self.override_task(task, options, overrides)?;
        Ok(Some(task))
    }

    /// Records the Nx plugins for the workspace manifest and makes sure the root has
    /// `install` and `install:ci` tasks that install them. Meant for non-Node roots.
    pub fn ensure_nx_install_task<'w>(
        &mut self,
        workspace: &'w mut Workspace,
        nx_plugins: BTreeMap<String, String>,
    ) -> Result<&'w mut Task, TaskError> {
        self.nx_plugins = nx_plugins;

        let tasks = &mut workspace.root_mut().tasks;
        tasks
            .find_or_add("install:ci")
            .exec("yarn install --check-files --frozen-lockfile")?;
        let install = tasks.find_or_add("install");
        install.exec("yarn install --check-files")?;
        Ok(install)
    }

    /// Runs before any file is rendered: joins every sub-project to the project graph,
    /// emits the workspace manifest for non-Node roots and patches poetry environments.
    pub fn pre_synthesize(&mut self, workspace: &mut Workspace) -> Result<(), LifecycleError> {
        self.advance(Phase::Configured, Phase::PreSynthesized)?;

        graph::ensure_project_graph(workspace);
        self.emit_package_json(workspace)?;
        let patched = env_patch::patch_python_projects(workspace, ProjectId::ROOT);
        log::debug!("Pre-synthesis done ({} poetry project(s) patched)", patched);
        Ok(())
    }

    /// Clears the default task of every direct sub-project; in a monorepo all work
    /// flows through the fan-out tasks of the root.
    pub fn synthesize(&mut self, workspace: &mut Workspace) -> Result<(), LifecycleError> {
        self.advance(Phase::PreSynthesized, Phase::Synthesized)?;

        let subprojects = workspace.root().subprojects().to_vec();
        for id in subprojects {
            let project = workspace.project_mut(id);
            if let Some(task) = project.tasks.try_find_mut(DEFAULT_TASK_NAME) {
                log::trace!("Clearing default task of '{}'", project.name);
                task.reset(None, ResetOptions::default())?;
            }
        }
        Ok(())
    }

    fn advance(&mut self, expected: Phase, next: Phase) -> Result<(), LifecycleError> {
        if self.phase != expected {
            return Err(LifecycleError::OutOfOrder {
                requested: next,
                current: self.phase,
            });
        }
        self.phase = next;
        Ok(())
    }

    fn emit_package_json(&self, workspace: &mut Workspace) -> Result<(), LifecycleError> {
        let root = workspace.root();
        if root.ecosystem.kind() == EcosystemKind::Node || root.has_file(WORKSPACE_MANIFEST_FILENAME) {
            log::trace!("Skipping workspace manifest for '{}'", root.name);
            return Ok(());
        }

        let mut dev_dependencies = self.nx_plugins.clone();
        for package in NX_RUNNER_PACKAGES {
            dev_dependencies.insert(package.to_string(), NX_VERSION_CONSTRAINT.to_string());
        }
        let workspaces = root
            .subprojects()
            .iter()
            .map(|id| workspace.project(*id))
            .filter(|p| p.ecosystem.kind() == EcosystemKind::Node)
            .map(|p| paths::to_posix(&paths::relative_path(&root.outdir, &p.outdir)))
            .collect();

        let manifest = WorkspaceManifest {
            dev_dependencies,
            private: true,
            workspaces,
        };
        let value = serde_json::to_value(&manifest)
            .map_err(|e| LifecycleError::Manifest(e.to_string()))?;
        log::debug!("Emitting {} for '{}'", WORKSPACE_MANIFEST_FILENAME, root.name);
        workspace
            .root_mut()
            .add_file(WORKSPACE_MANIFEST_FILENAME, GeneratedFile::Json(value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DepsManager, NodeSettings, PythonSettings};

    fn python_root() -> Workspace {
        Workspace::new(
            "monorepo",
            Ecosystem::Python(PythonSettings {
                deps_manager: DepsManager::Poetry,
                ..Default::default()
            }),
        )
    }

    fn with_build_task(workspace: &mut Workspace, locked: bool) {
        let task = workspace
            .root_mut()
            .tasks
            .add_task(
                "build",
                TaskOptions {
                    description: Some("Full release build".to_string()),
                    exec: Some("make".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        if locked {
            task.lock();
        }
    }

    #[test]
    fn test_attach_registers_standing_tasks() {
        let mut ws = Workspace::new("monorepo", Ecosystem::Node(NodeSettings { package_manager: PackageManager::Pnpm }));
        NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();

        let run_many = ws.root().tasks.try_find("run-many").unwrap();
        assert_eq!(run_many.steps(), ["pnpm exec nx run-many".to_string()]);
        assert!(run_many.receives_args());
        let graph = ws.root().tasks.try_find("graph").unwrap();
        assert_eq!(graph.steps(), ["pnpm exec nx graph".to_string()]);
        assert_eq!(ws.root().gitignore(), [".nx/cache".to_string()]);
        assert_eq!(ws.nx.default_base, "mainline");
    }

    #[test]
    fn test_override_rejects_locked_task_without_force() {
        let mut ws = python_root();
        with_build_task(&mut ws, true);
        let nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();

        let result = nx.override_nx_build_task(
            &mut ws,
            ProjectId::ROOT,
            "build",
            &RunManyOptions::for_target("build"),
            OverrideOptions::default(),
        );
        assert_eq!(result.err(), Some(TaskError::Locked("build".to_string())));
        let task = ws.root().tasks.try_find("build").unwrap();
        assert_eq!(task.steps(), ["make".to_string()]);
        assert!(task.is_locked());
    }

    #[test]
    fn test_forced_override_unlocks_and_rewrites() {
        let mut ws = python_root();
        with_build_task(&mut ws, true);
        let nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();

        let task = nx
            .override_nx_build_task(
                &mut ws,
                ProjectId::ROOT,
                "build",
                &RunManyOptions::for_target("build"),
                OverrideOptions { force: true, disable_reset: false },
            )
            .unwrap()
            .unwrap();

        assert!(!task.is_locked());
        assert!(task.receives_args());
        assert_eq!(
            task.steps(),
            ["npx nx run-many --target=build --output-style=stream --nx-bail".to_string()]
        );
        assert_eq!(task.description(), Some("Full release build for all affected projects"));
    }

    #[test]
    fn test_disable_reset_keeps_override() {
        let mut ws = python_root();
        with_build_task(&mut ws, false);
        let nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        nx.override_nx_build_task(
            &mut ws,
            ProjectId::ROOT,
            "build",
            &RunManyOptions::for_target("build"),
            OverrideOptions { force: false, disable_reset: true },
        )
        .unwrap();

        let task = ws.root_mut().tasks.try_find_mut("build").unwrap();
        task.reset(Some("eslint"), ResetOptions::default()).unwrap();
        assert_eq!(
            task.steps(),
            ["npx nx run-many --target=build --output-style=stream --nx-bail".to_string()]
        );
    }

    #[test]
    fn test_frozen_locked_task_keeps_command_but_gains_suffix() {
        // A frozen reset wins over the lock: the override succeeds without touching
        // the steps, and only the description changes.
        let mut ws = python_root();
        with_build_task(&mut ws, false);
        let task = ws.root_mut().tasks.try_find_mut("build").unwrap();
        task.freeze_reset();
        task.lock();
        let nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();

        let task = nx
            .override_nx_build_task(
                &mut ws,
                ProjectId::ROOT,
                "build",
                &RunManyOptions::for_target("build"),
                OverrideOptions::default(),
            )
            .unwrap()
            .unwrap();

        assert!(task.is_locked());
        assert_eq!(task.steps(), ["make".to_string()]);
        assert_eq!(task.description(), Some("Full release build for all affected projects"));
    }

    #[test]
    fn test_missing_task_is_a_no_op() {
        let mut ws = python_root();
        let nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        let result = nx
            .override_nx_build_task(
                &mut ws,
                ProjectId::ROOT,
                "compile",
                &RunManyOptions::for_target("compile"),
                OverrideOptions::default(),
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_repeated_override_accumulates_description_suffix() {
        // Known characteristic: the suffix is appended on every override.
        let mut ws = python_root();
        with_build_task(&mut ws, false);
        let nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        let options = RunManyOptions::for_target("build");
        for _ in 0..2 {
            nx.override_nx_build_task(&mut ws, ProjectId::ROOT, "build", &options, OverrideOptions::default())
                .unwrap();
        }
        assert_eq!(
            ws.root().tasks.try_find("build").unwrap().description(),
            Some("Full release build for all affected projects for all affected projects")
        );
    }

    #[test]
    fn test_ensure_install_task_records_plugins() {
        let mut ws = python_root();
        let mut nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        let plugins = BTreeMap::from([("@nxlv/python".to_string(), "^16.1.0".to_string())]);
        let install = nx.ensure_nx_install_task(&mut ws, plugins.clone()).unwrap();
        assert_eq!(install.steps(), ["yarn install --check-files".to_string()]);
        assert_eq!(nx.nx_plugins(), &plugins);
        assert!(ws.root().tasks.try_find("install:ci").is_some());
    }

    #[test]
    fn test_phases_must_run_in_order_once() {
        let mut ws = python_root();
        let mut nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();

        assert!(matches!(
            nx.synthesize(&mut ws),
            Err(LifecycleError::OutOfOrder { current: Phase::Configured, .. })
        ));
        nx.pre_synthesize(&mut ws).unwrap();
        assert!(nx.pre_synthesize(&mut ws).is_err());
        nx.synthesize(&mut ws).unwrap();
        assert_eq!(nx.phase(), Phase::Synthesized);
    }

    #[test]
    fn test_node_root_gets_no_manifest() {
        let mut ws = Workspace::new("monorepo", Ecosystem::Node(NodeSettings::default()));
        let mut nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        nx.pre_synthesize(&mut ws).unwrap();
        assert!(!ws.root().has_file("package.json"));
    }
}
