//! # Config Loader
//!
//! Builds a configured [`Workspace`] from a `monorail.toml` description. Loading
//! happens in four steps:
//!
//! 1. **Tree construction:** the root and every `[[projects]]` entry, in file order.
//!    A parent must be declared before its children.
//! 2. **Configurator:** the Nx configurator is attached to the root. Non-Node roots
//!    also get the install tasks and the plugin list for their workspace manifest.
//! 3. **Dependencies:** each project's `dependencies` are bound by ecosystem
//!    (Java to Java, Python to Python, unknown names as external targets).
//! 4. **Overrides:** every `[[overrides]]` entry turns a task into a fan-out task.
use crate::{
    core::{
        configurator::{NxConfigurator, NxConfiguratorOptions},
        graph,
        task::{TaskError, TaskOptions},
        workspace::{ConfigError, ProjectId, Workspace},
    },
    models::{
        DepsManager, Ecosystem, EcosystemKind, JavaSettings, NodeSettings, OverrideOptions,
        PackageManager, PythonSettings, TomlExec, TomlTask, WorkspaceConfig,
    },
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a workspace description.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Could not read '{path}': {source}")]
    Read {
        /// The description file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid description.
    #[error("Failed to parse workspace description: {0}")]
    Parse(#[from] toml::de::Error),
    /// The tree or a dependency is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A task could not be registered or overridden.
    #[error("Invalid task in '{project}': {source}")]
    Task {
        /// Owner of the task.
        project: String,
        /// What went wrong.
        #[source]
        source: TaskError,
    },
    /// An argv step contains a NUL byte.
    #[error("Task '{task}' in '{project}' has a step that cannot be quoted for the shell.")]
    Unquotable {
        /// Owner of the task.
        project: String,
        /// The task.
        task: String,
    },
    /// A Java project has no Maven coordinates.
    #[error("Java project '{0}' needs a [projects.java] table with its Maven coordinates.")]
    MissingCoordinates(String),
}

/// A workspace with its configurator attached, ready for synthesis.
#[derive(Debug)]
pub struct LoadedWorkspace {
    /// The project tree.
    pub workspace: Workspace,
    /// The configurator attached to its root.
    pub configurator: NxConfigurator,
}

/// Reads and loads a `monorail.toml` file.
pub fn load_workspace(path: &Path) -> Result<LoadedWorkspace, LoadError> {
    log::debug!("Loading workspace description from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    load_workspace_str(&content)
}

/// Loads a workspace from the text of a `monorail.toml` file.
pub fn load_workspace_str(content: &str) -> Result<LoadedWorkspace, LoadError> {
    let config: WorkspaceConfig = toml::from_str(content)?;
    build_workspace(config)
}

/// Builds a configured workspace from an already parsed description.
pub fn build_workspace(config: WorkspaceConfig) -> Result<LoadedWorkspace, LoadError> {
    let root = &config.workspace;

    // --- 1. Tree construction ---
    let root_ecosystem = ecosystem_for(
        &root.name,
        root.kind,
        root.package_manager,
        root.deps_manager,
        None,
    )?;
    let mut workspace = Workspace::new(root.name.clone(), root_ecosystem);
    add_tasks(&mut workspace, ProjectId::ROOT, &root.tasks)?;

    for project in &config.projects {
        let parent = match &project.parent {
            Some(name) => workspace
                .find(name)
                .ok_or_else(|| ConfigError::UnknownProject(name.clone()))?,
            None => ProjectId::ROOT,
        };
        let ecosystem = ecosystem_for(
            &project.name,
            project.kind,
            project.package_manager,
            project.deps_manager,
            project.java.clone(),
        )?;
        let id = workspace.add_project(parent, project.name.clone(), &project.path, ecosystem)?;
        add_tasks(&mut workspace, id, &project.tasks)?;
    }

    // --- 2. Configurator ---
    let mut configurator = NxConfigurator::attach(
        &mut workspace,
        NxConfiguratorOptions {
            default_release_branch: root.default_release_branch.clone(),
        },
    )
    .map_err(|source| LoadError::Task {
        project: root.name.clone(),
        source,
    })?;
    if root.kind != EcosystemKind::Node {
        configurator
            .ensure_nx_install_task(&mut workspace, root.nx_plugins.clone())
            .map_err(|source| LoadError::Task {
                project: root.name.clone(),
                source,
            })?;
    }

    // --- 3. Dependencies ---
    for project in &config.projects {
        let Some(dependent) = workspace.find(&project.name) else {
            continue;
        };
        if !project.dependencies.is_empty() {
            graph::ensure_graph_participation(&mut workspace, dependent);
        }
        for dependency in &project.dependencies {
            bind_dependency(&mut workspace, dependent, dependency)?;
        }
    }

    // --- 4. Overrides ---
    for entry in &config.overrides {
        let project = match &entry.project {
            Some(name) => workspace
                .find(name)
                .ok_or_else(|| ConfigError::UnknownProject(name.clone()))?,
            None => ProjectId::ROOT,
        };
        let overridden = configurator
            .override_nx_build_task(
                &mut workspace,
                project,
                &entry.task,
                &entry.run_many,
                OverrideOptions {
                    force: entry.force,
                    disable_reset: entry.disable_reset,
                },
            )
            .map_err(|source| LoadError::Task {
                project: entry.project.clone().unwrap_or_else(|| root.name.clone()),
                source,
            })?;
        if overridden.is_none() {
            log::warn!("Override skipped: no task named '{}'", entry.task);
        }
    }

    Ok(LoadedWorkspace {
        workspace,
        configurator,
    })
}

fn ecosystem_for(
    name: &str,
    kind: EcosystemKind,
    package_manager: Option<PackageManager>,
    deps_manager: Option<DepsManager>,
    java: Option<crate::models::MavenCoordinates>,
) -> Result<Ecosystem, LoadError> {
    Ok(match kind {
        EcosystemKind::Node => Ecosystem::Node(NodeSettings {
            package_manager: package_manager.unwrap_or_default(),
        }),
        EcosystemKind::Java => Ecosystem::Java(JavaSettings {
            coordinates: java.ok_or_else(|| LoadError::MissingCoordinates(name.to_string()))?,
            ..Default::default()
        }),
        EcosystemKind::Python => Ecosystem::Python(PythonSettings {
            deps_manager: deps_manager.unwrap_or_default(),
            ..Default::default()
        }),
        EcosystemKind::Other => Ecosystem::Other,
    })
}

fn add_tasks(
    workspace: &mut Workspace,
    id: ProjectId,
    tasks: &BTreeMap<String, TomlTask>,
) -> Result<(), LoadError> {
    let project = workspace.project_mut(id);
    for (name, task) in tasks {
        let mut steps = Vec::with_capacity(task.exec.len());
        for exec in &task.exec {
            steps.push(render_step(exec).ok_or_else(|| LoadError::Unquotable {
                project: project.name.clone(),
                task: name.clone(),
            })?);
        }

        let created = project
            .tasks
            .add_task(
                name,
                TaskOptions {
                    description: task.description.clone(),
                    exec: None,
                    receive_args: task.receive_args,
                    env: task.env.clone(),
                },
            )
            .map_err(|source| LoadError::Task {
                project: project.name.clone(),
                source,
            })?;
        for step in steps {
            // A fresh task is never locked.
            created.exec(step).map_err(|source| LoadError::Task {
                project: project.name.clone(),
                source,
            })?;
        }
        if task.locked {
            created.lock();
        }
    }
    Ok(())
}

fn render_step(exec: &TomlExec) -> Option<String> {
    match exec {
        TomlExec::Line(line) => Some(line.clone()),
        TomlExec::Argv(argv) => shlex::try_join(argv.iter().map(String::as_str)).ok(),
    }
}

fn bind_dependency(workspace: &mut Workspace, dependent: ProjectId, dependency: &str) -> Result<(), ConfigError> {
    let Some(dependee) = workspace.find(dependency) else {
        log::debug!("'{}' is not a project; recording it as an external target", dependency);
        return graph::add_implicit_dependency(workspace, dependent, dependency);
    };

    let dependent_kind = workspace.project(dependent).ecosystem.kind();
    let dependee_kind = workspace.project(dependee).ecosystem.kind();
    match (dependent_kind, dependee_kind) {
        (EcosystemKind::Java, EcosystemKind::Java) => {
            graph::add_java_dependency(workspace, dependent, dependee)
        }
        (EcosystemKind::Python, EcosystemKind::Python) => {
            graph::add_python_poetry_dependency(workspace, dependent, dependee)
        }
        _ => graph::add_implicit_dependency(workspace, dependent, dependee),
    }
}
