// src/core/graph.rs

//! Implicit dependency edges consumed by the Nx task runner.
//!
//! A project takes part in the graph once it carries an [`NxProject`] record.
//! Dependencies can only be declared on participating projects; cycles are not
//! checked here, Nx reports them itself.

use crate::{
    core::{
        paths,
        workspace::{ConfigError, ProjectId, SkipRoot, Workspace},
    },
    models::{Ecosystem, MavenRepository},
};

/// The target side of a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependee {
    /// A project of the same workspace.
    Project(ProjectId),
    /// An opaque identifier Nx resolves on its own (another project name, a glob, `!excluded`).
    Target(String),
}

impl From<ProjectId> for Dependee {
    fn from(id: ProjectId) -> Self {
        Self::Project(id)
    }
}

impl From<&str> for Dependee {
    fn from(target: &str) -> Self {
        Self::Target(target.to_string())
    }
}

impl From<String> for Dependee {
    fn from(target: String) -> Self {
        Self::Target(target)
    }
}

/// Graph participation record of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NxProject {
    implicit_dependencies: Vec<Dependee>,
}

impl NxProject {
    /// Declared edges, in declaration order.
    pub fn implicit_dependencies(&self) -> &[Dependee] {
        &self.implicit_dependencies
    }

    /// The dependency names as written to `project.json`.
    pub fn dependency_names(&self, workspace: &Workspace) -> Vec<String> {
        self.implicit_dependencies
            .iter()
            .map(|dependee| match dependee {
                Dependee::Project(id) => workspace.project(*id).name.clone(),
                Dependee::Target(target) => target.clone(),
            })
            .collect()
    }
}

/// Marks the project as a graph participant. Safe to call any number of times.
pub fn ensure_graph_participation(workspace: &mut Workspace, id: ProjectId) -> &mut NxProject {
    let project = workspace.project_mut(id);
    if project.nx.is_none() {
        log::trace!("Project '{}' joins the project graph", project.name);
    }
    project.nx.get_or_insert_with(NxProject::default)
}

/// Ensures graph participation for every project below the root, top-down.
pub fn ensure_project_graph(workspace: &mut Workspace) {
    for id in workspace.descendants(ProjectId::ROOT, &SkipRoot) {
        ensure_graph_participation(workspace, id);
    }
}

fn ensure_known(workspace: &Workspace, id: ProjectId) -> Result<(), ConfigError> {
    if workspace.contains(id) {
        Ok(())
    } else {
        Err(ConfigError::UnknownProject(id.to_string()))
    }
}

fn participating(workspace: &mut Workspace, id: ProjectId) -> Result<&mut NxProject, ConfigError> {
    ensure_known(workspace, id)?;
    let project = workspace.project_mut(id);
    let name = project.name.clone();
    project.nx.as_mut().ok_or(ConfigError::NotInGraph(name))
}

/// Records that `dependent` builds after `dependee`.
///
/// # Errors
/// Returns [`ConfigError::NotInGraph`] if `dependent` does not participate in the graph,
/// and [`ConfigError::UnknownProject`] for ids this workspace did not create.
pub fn add_implicit_dependency(
    workspace: &mut Workspace,
    dependent: ProjectId,
    dependee: impl Into<Dependee>,
) -> Result<(), ConfigError> {
    let dependee = dependee.into();
    if let Dependee::Project(id) = &dependee {
        ensure_known(workspace, *id)?;
    }
    let nx = participating(workspace, dependent)?;
    nx.implicit_dependencies.push(dependee);
    log::debug!(
        "Implicit dependency added on '{}'",
        workspace.project(dependent).name
    );
    Ok(())
}

/// Declares a build dependency between two Java projects: the dependee's Maven
/// coordinates become a dependency of the dependent, its local `dist/java` output is
/// registered as a repository, and the build-order edge is recorded.
///
/// # Errors
/// Fails if either id is unknown, the dependent is not in the graph or either side
/// is not a Java project.
pub fn add_java_dependency(
    workspace: &mut Workspace,
    dependent: ProjectId,
    dependee: ProjectId,
) -> Result<(), ConfigError> {
    ensure_known(workspace, dependee)?;
    participating(workspace, dependent)?;
    if !matches!(workspace.project(dependent).ecosystem, Ecosystem::Java(_)) {
        return Err(mismatch(workspace, dependent, "java"));
    }

    let dependee_project = workspace.project(dependee);
    let Ecosystem::Java(dependee_java) = &dependee_project.ecosystem else {
        return Err(mismatch(workspace, dependee, "java"));
    };
    let coordinates = &dependee_java.coordinates;
    let dependency = format!(
        "{}/{}@{}",
        coordinates.group_id, coordinates.artifact_id, coordinates.version
    );
    let relative = paths::relative_path(
        &workspace.project(dependent).outdir,
        &dependee_project.outdir,
    );
    let repository = MavenRepository {
        id: dependee_project.name.clone(),
        url: format!("file://{}", paths::to_posix(&relative.join("dist").join("java"))),
    };

    if let Ecosystem::Java(java) = &mut workspace.project_mut(dependent).ecosystem {
        java.dependencies.push(dependency);
        java.repositories.push(repository);
    }

    add_implicit_dependency(workspace, dependent, dependee)
}

/// Declares a dependency between two Python projects: the dependee is added to the
/// dependent's poetry dependencies as a local, editable path dependency and the
/// build-order edge is recorded.
///
/// # Errors
/// Fails with [`ConfigError::PoetryRequired`] (recording nothing) if the dependent is
/// not a poetry project, or if either side is unknown, not in the graph or not a
/// Python project.
pub fn add_python_poetry_dependency(
    workspace: &mut Workspace,
    dependent: ProjectId,
    dependee: ProjectId,
) -> Result<(), ConfigError> {
    ensure_known(workspace, dependee)?;
    participating(workspace, dependent)?;

    let dependent_project = workspace.project(dependent);
    if !matches!(dependent_project.ecosystem, Ecosystem::Python(_)) {
        return Err(mismatch(workspace, dependent, "python"));
    }
    if !dependent_project.ecosystem.uses_poetry() {
        return Err(ConfigError::PoetryRequired(dependent_project.name.clone()));
    }
    if !matches!(workspace.project(dependee).ecosystem, Ecosystem::Python(_)) {
        return Err(mismatch(workspace, dependee, "python"));
    }

    let dependee_project = workspace.project(dependee);
    let relative = paths::relative_path(&dependent_project.outdir, &dependee_project.outdir);
    let dependency = format!(
        "{}@{{path=\"{}\", develop=true}}",
        dependee_project.name,
        paths::to_posix(&relative)
    );

    if let Ecosystem::Python(python) = &mut workspace.project_mut(dependent).ecosystem {
        python.dependencies.push(dependency);
    }
    add_implicit_dependency(workspace, dependent, dependee)
}

fn mismatch(workspace: &Workspace, id: ProjectId, expected: &str) -> ConfigError {
    ConfigError::EcosystemMismatch {
        project: workspace.project(id).name.clone(),
        expected: expected.to_string(),
    }
}
