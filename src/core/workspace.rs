// src/core/workspace.rs

//! The project tree the configurator operates on.
//!
//! A [`Workspace`] is an arena of [`Project`]s. The root is always
//! [`ProjectId::ROOT`]; every other project has exactly one parent. The tree is a
//! single-pass, build-time construct: projects are added, configured, synthesized,
//! and the whole tree is dropped together.

use crate::{
    core::{graph::NxProject, task::TaskSet},
    models::Ecosystem,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while building the tree or binding dependencies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The dependent has not joined the project graph.
    #[error("Project '{0}' does not participate in the project graph. Ensure graph participation before declaring dependencies.")]
    NotInGraph(String),
    /// A poetry dependency was declared on a project without poetry.
    #[error("Project '{0}' must have poetry enabled to declare poetry dependencies.")]
    PoetryRequired(String),
    /// A project has the wrong ecosystem for the requested dependency.
    #[error("Project '{project}' is not a {expected} project.")]
    EcosystemMismatch {
        /// The offending project.
        project: String,
        /// The ecosystem it should have.
        expected: String,
    },
    /// A project name or id does not belong to this workspace.
    #[error("Project '{0}' is not defined in this workspace.")]
    UnknownProject(String),
    /// Project names must be unique across the workspace.
    #[error("A project named '{0}' already exists in this workspace.")]
    DuplicateProject(String),
}

/// Index of a project inside its [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(usize);

impl ProjectId {
    /// The workspace root.
    pub const ROOT: Self = Self(0);

    /// True for [`ProjectId::ROOT`].
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A file registered for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedFile {
    /// Rendered as pretty-printed JSON.
    Json(serde_json::Value),
    /// Written as-is.
    Text(String),
}

/// Nx workspace-wide settings rendered into `nx.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NxWorkspaceSettings {
    /// Branch `nx affected` compares against.
    pub default_base: String,
}

/// One node of the project tree.
#[derive(Debug, Clone)]
pub struct Project {
    /// Unique name, also used as the Nx project name.
    pub name: String,
    /// Output directory, relative to the workspace root.
    pub outdir: PathBuf,
    /// Ecosystem tag and settings.
    pub ecosystem: Ecosystem,
    /// The project's tasks.
    pub tasks: TaskSet,
    pub(crate) nx: Option<NxProject>,
    gitignore: Vec<String>,
    files: BTreeMap<PathBuf, GeneratedFile>,
    parent: Option<ProjectId>,
    children: Vec<ProjectId>,
}

impl Project {
    fn new(name: String, outdir: PathBuf, ecosystem: Ecosystem, parent: Option<ProjectId>) -> Self {
        Self {
            name,
            outdir,
            ecosystem,
            tasks: TaskSet::default(),
            nx: None,
            gitignore: Vec::new(),
            files: BTreeMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// The parent project; `None` for the root.
    pub fn parent(&self) -> Option<ProjectId> {
        self.parent
    }

    /// Direct sub-projects, in insertion order.
    pub fn subprojects(&self) -> &[ProjectId] {
        &self.children
    }

    /// The graph participation record, if the project takes part in the Nx graph.
    pub fn nx(&self) -> Option<&NxProject> {
        self.nx.as_ref()
    }

    /// Adds an ignore pattern once.
    pub fn add_gitignore(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.gitignore.contains(&pattern) {
            self.gitignore.push(pattern);
        }
    }

    /// Ignore patterns, in insertion order.
    pub fn gitignore(&self) -> &[String] {
        &self.gitignore
    }

    /// True if a file is registered at `path`.
    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// The file registered at `path`, if any.
    pub fn try_find_file(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        self.files.get(path.as_ref())
    }

    /// Registers a generated file, replacing any previous file at the same path.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, file: GeneratedFile) {
        self.files.insert(path.into(), file);
    }

    /// Registered files, by path.
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &GeneratedFile)> {
        self.files.iter()
    }
}

/// Walk predicate that skips the workspace root.
#[derive(Debug, Clone, Copy)]
pub struct SkipRoot;

/// Decides whether a node is visited during [`Workspace::walk`].
pub trait SkipPredicate {
    /// Returns `true` to leave `id` out of the traversal.
    fn skip(&self, workspace: &Workspace, id: ProjectId) -> bool;
}

impl SkipPredicate for SkipRoot {
    fn skip(&self, _workspace: &Workspace, id: ProjectId) -> bool {
        id.is_root()
    }
}

/// Visits every node.
#[derive(Debug, Clone, Copy)]
pub struct SkipNone;

impl SkipPredicate for SkipNone {
    fn skip(&self, _workspace: &Workspace, _id: ProjectId) -> bool {
        false
    }
}

impl<F> SkipPredicate for F
where
    F: Fn(&Workspace, ProjectId) -> bool,
{
    fn skip(&self, workspace: &Workspace, id: ProjectId) -> bool {
        self(workspace, id)
    }
}

/// The monorepo: a tree of projects with a single root.
#[derive(Debug, Clone)]
pub struct Workspace {
    projects: Vec<Project>,
    /// Workspace-wide Nx settings.
    pub nx: NxWorkspaceSettings,
}

impl Workspace {
    /// Creates a workspace whose root project lives at the output directory itself.
    pub fn new(name: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            projects: vec![Project::new(name.into(), PathBuf::new(), ecosystem, None)],
            nx: NxWorkspaceSettings::default(),
        }
    }

    /// Attaches a new project under `parent`.
    ///
    /// # Errors
    /// Fails if the parent does not exist or the name is already taken.
    pub fn add_project(
        &mut self,
        parent: ProjectId,
        name: impl Into<String>,
        outdir: impl Into<PathBuf>,
        ecosystem: Ecosystem,
    ) -> Result<ProjectId, ConfigError> {
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(ConfigError::DuplicateProject(name));
        }
        if self.projects.get(parent.0).is_none() {
            return Err(ConfigError::UnknownProject(parent.to_string()));
        }

        let id = ProjectId(self.projects.len());
        log::debug!("Adding project '{}' ({}) under {}", name, ecosystem.kind(), parent);
        self.projects
            .push(Project::new(name, outdir.into(), ecosystem, Some(parent)));
        self.project_mut(parent).children.push(id);
        Ok(id)
    }

    /// The root project.
    pub fn root(&self) -> &Project {
        self.project(ProjectId::ROOT)
    }

    /// The root project, mutably.
    pub fn root_mut(&mut self) -> &mut Project {
        self.project_mut(ProjectId::ROOT)
    }

    /// Returns the project with the given id.
    ///
    /// Ids are only minted by [`Workspace::add_project`] and projects are never removed,
    /// so every id handed out by this workspace is valid.
    pub fn project(&self, id: ProjectId) -> &Project {
        match self.projects.get(id.0) {
            Some(project) => project,
            None => unreachable!("project id {} was not created by this workspace", id),
        }
    }

    /// Mutable counterpart of [`Workspace::project`].
    pub fn project_mut(&mut self, id: ProjectId) -> &mut Project {
        match self.projects.get_mut(id.0) {
            Some(project) => project,
            None => unreachable!("project id {} was not created by this workspace", id),
        }
    }

    /// True if `id` was minted by this workspace.
    pub fn contains(&self, id: ProjectId) -> bool {
        id.0 < self.projects.len()
    }

    /// Looks up a project by name.
    pub fn find(&self, name: &str) -> Option<ProjectId> {
        self.projects
            .iter()
            .position(|p| p.name == name)
            .map(ProjectId)
    }

    /// All project ids, root first, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = ProjectId> + '_ {
        (0..self.projects.len()).map(ProjectId)
    }

    /// Number of projects, root included.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Always false: a workspace has at least its root.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Collects the pre-order (top-down) traversal starting at `start`, leaving out
    /// every node for which `skip` returns `true`. Children of a skipped node are
    /// still visited.
    pub fn descendants(&self, start: ProjectId, skip: &impl SkipPredicate) -> Vec<ProjectId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !skip.skip(self, id) {
                order.push(id);
            }
            stack.extend(self.project(id).children.iter().rev().copied());
        }
        order
    }

    /// Walks the tree top-down from `start`, calling `visit` on every node not skipped.
    pub fn walk<F, E>(&mut self, start: ProjectId, skip: &impl SkipPredicate, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&mut Self, ProjectId) -> Result<(), E>,
    {
        for id in self.descendants(start, skip) {
            visit(self, id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeSettings, PythonSettings};

    fn sample() -> (Workspace, ProjectId, ProjectId, ProjectId) {
        let mut ws = Workspace::new("root", Ecosystem::Other);
        let a = ws
            .add_project(ProjectId::ROOT, "a", "packages/a", Ecosystem::Node(NodeSettings::default()))
            .unwrap();
        let a1 = ws
            .add_project(a, "a1", "packages/a/nested", Ecosystem::Other)
            .unwrap();
        let b = ws
            .add_project(ProjectId::ROOT, "b", "packages/b", Ecosystem::Python(PythonSettings::default()))
            .unwrap();
        (ws, a, a1, b)
    }

    #[test]
    fn test_descendants_are_top_down_and_skip_root() {
        let (ws, a, a1, b) = sample();
        assert_eq!(ws.descendants(ProjectId::ROOT, &SkipRoot), vec![a, a1, b]);
        assert_eq!(
            ws.descendants(ProjectId::ROOT, &SkipNone),
            vec![ProjectId::ROOT, a, a1, b]
        );
    }

    #[test]
    fn test_skip_predicate_keeps_children_of_skipped_node() {
        let (ws, a, a1, b) = sample();
        let skip_a = move |_: &Workspace, id: ProjectId| id == a;
        assert_eq!(ws.descendants(ProjectId::ROOT, &skip_a), vec![ProjectId::ROOT, a1, b]);
    }

    #[test]
    fn test_add_project_rejects_duplicate_names() {
        let (mut ws, ..) = sample();
        let err = ws
            .add_project(ProjectId::ROOT, "a", "elsewhere", Ecosystem::Other)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateProject("a".to_string()));
    }

    #[test]
    fn test_parent_and_subprojects_are_linked() {
        let (ws, a, a1, b) = sample();
        assert_eq!(ws.root().subprojects(), [a, b]);
        assert_eq!(ws.project(a1).parent(), Some(a));
        assert_eq!(ws.root().parent(), None);
    }

    #[test]
    fn test_walk_propagates_visitor_errors() {
        let (mut ws, a, ..) = sample();
        let mut visited = Vec::new();
        let result: Result<(), String> = ws.walk(ProjectId::ROOT, &SkipRoot, |_, id| {
            visited.push(id);
            if id == a { Err("stop".to_string()) } else { Ok(()) }
        });
        assert_eq!(result, Err("stop".to_string()));
        assert_eq!(visited, vec![a]);
    }
}
