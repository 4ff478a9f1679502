// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// --- ECOSYSTEM MODELS ---
// Every project carries one of these tags, set at construction and checked by value.

/// The Node package manager used to prefix executor invocations.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// `npx`
    #[default]
    Npm,
    /// `yarn`
    Yarn,
    /// `pnpm exec`
    Pnpm,
    /// `bunx`
    Bun,
}

impl PackageManager {
    /// The command prefix that runs a binary installed in the workspace.
    pub fn exec_prefix(self) -> &'static str {
        match self {
            Self::Npm => "npx",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm exec",
            Self::Bun => "bunx",
        }
    }

    /// Renders `<prefix> <args...>`, joined with single spaces.
    pub fn exec<S: AsRef<str>>(self, args: &[S]) -> String {
        let mut line = String::from(self.exec_prefix());
        for arg in args {
            line.push(' ');
            line.push_str(arg.as_ref());
        }
        line
    }
}

/// How a Python project manages its dependencies.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DepsManager {
    /// Plain `requirements.txt`.
    #[default]
    Pip,
    /// A local virtualenv.
    Venv,
    /// Lock-manager mode: isolated environments that need patching when nested.
    Poetry,
}

/// Node settings.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSettings {
    /// Package manager of the project.
    pub package_manager: PackageManager,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// Maven coordinates of a Java project.
pub struct MavenCoordinates {
    /// `groupId`
    pub group_id: String,
    /// `artifactId`
    pub artifact_id: String,
    /// `version`
    pub version: String,
}

/// A Maven repository, pointing at another project's local build output.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MavenRepository {
    /// Repository id; the name of the project it belongs to.
    pub id: String,
    /// `file://` URL of the output directory.
    pub url: String,
}

/// Java settings. `dependencies` and `repositories` are filled in by the graph binder.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct JavaSettings {
    /// Own coordinates.
    pub coordinates: MavenCoordinates,
    /// Dependencies as `group/artifact@version`.
    pub dependencies: Vec<String>,
    /// Repositories the dependencies resolve from.
    pub repositories: Vec<MavenRepository>,
}

/// Python settings. `dependencies` is filled in by the graph binder.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PythonSettings {
    /// Dependency-management mode.
    pub deps_manager: DepsManager,
    /// Dependencies as `name@{path="...", develop=true}`.
    pub dependencies: Vec<String>,
}

/// The ecosystem a project belongs to, with its ecosystem-specific settings.
/// Serialized into the task manifest as `{"kind": "java", ...settings}`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Ecosystem {
    /// A Node package.
    Node(NodeSettings),
    /// A Maven project.
    Java(JavaSettings),
    /// A Python package.
    Python(PythonSettings),
    /// Anything else.
    #[default]
    Other,
}

impl Ecosystem {
    /// The bare tag.
    pub fn kind(&self) -> EcosystemKind {
        match self {
            Self::Node(_) => EcosystemKind::Node,
            Self::Java(_) => EcosystemKind::Java,
            Self::Python(_) => EcosystemKind::Python,
            Self::Other => EcosystemKind::Other,
        }
    }

    /// True only for Python projects in poetry mode.
    pub fn uses_poetry(&self) -> bool {
        matches!(self, Self::Python(settings) if settings.deps_manager == DepsManager::Poetry)
    }
}

/// The bare ecosystem tag, as written in `monorail.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum EcosystemKind {
    Node,
    Java,
    Python,
    #[default]
    Other,
}

impl fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Node => "node",
            Self::Java => "java",
            Self::Python => "python",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

// --- RUN-MANY MODELS ---

/// Describes one `nx run-many` fan-out invocation.
///
/// Flags that are unset (or `false`) are omitted from the composed command, with the
/// single exception of `no_bail`: `--nx-bail` is emitted unless `no_bail` is `true`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunManyOptions {
    /// Task to run in every selected project.
    pub target: String,
    /// `--output-style`; `stream` when unset.
    pub output_style: Option<String>,
    /// `--configuration`
    pub configuration: Option<String>,
    /// `--runner`
    pub runner: Option<String>,
    /// `--parallel`; `0` counts as unset.
    pub parallel: Option<u32>,
    /// `--skip-nx-cache`
    #[serde(default)]
    pub skip_cache: bool,
    /// `--nx-ignore-cycles`
    #[serde(default)]
    pub ignore_cycles: bool,
    /// Suppresses `--nx-bail`.
    #[serde(default)]
    pub no_bail: bool,
    /// `--projects`, comma-joined.
    pub projects: Option<Vec<String>>,
    /// `--exclude`
    pub exclude: Option<String>,
    /// `--verbose`
    #[serde(default)]
    pub verbose: bool,
}

impl RunManyOptions {
    /// Options with only the target set.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }
}

/// Controls how an existing task is turned into a fan-out task.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OverrideOptions {
    /// Unlock the task before rewriting it.
    #[serde(default)]
    pub force: bool,
    /// Freeze the task so later lifecycle stages cannot reset it.
    #[serde(default)]
    pub disable_reset: bool,
}

// --- GENERATED FILE MODELS ---

/// The `package.json` emitted for non-Node workspace roots.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceManifest {
    /// Nx runner packages and plugins.
    pub dev_dependencies: BTreeMap<String, String>,
    /// Always `true`.
    pub private: bool,
    /// Relative paths of the Node sub-projects.
    pub workspaces: Vec<String>,
}

// --- `monorail.toml` MODELS (What is read from the description file) ---

/// A task as written in `monorail.toml`. `exec` accepts a command line or an argv array.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlTask {
    /// Human-readable description.
    pub description: Option<String>,
    /// Steps, run in order.
    #[serde(default)]
    pub exec: Vec<TomlExec>,
    /// Task-local environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Pass extra command-line arguments through.
    #[serde(default)]
    pub receive_args: bool,
    /// Lock the task after creation.
    #[serde(default)]
    pub locked: bool,
}

/// One task step.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum TomlExec {
    /// A shell line, used verbatim.
    Line(String),
    /// An argument list, quoted and joined.
    Argv(Vec<String>),
}

/// The `[workspace]` table: the root project.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlWorkspace {
    /// Root project name.
    pub name: String,
    /// Root ecosystem.
    #[serde(default)]
    pub kind: EcosystemKind,
    /// Package manager of a Node root.
    pub package_manager: Option<PackageManager>,
    /// Dependency manager of a Python root.
    pub deps_manager: Option<DepsManager>,
    /// Branch `nx affected` compares against.
    pub default_release_branch: Option<String>,
    /// Nx plugins installed by non-Node roots, by package name.
    #[serde(default)]
    pub nx_plugins: BTreeMap<String, String>,
    /// Root tasks.
    #[serde(default)]
    pub tasks: BTreeMap<String, TomlTask>,
}

/// A `[[projects]]` entry.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlProject {
    /// Unique project name.
    pub name: String,
    /// Output directory, relative to the workspace root.
    pub path: String,
    /// Name of the parent project; the workspace root when omitted.
    pub parent: Option<String>,
    /// Project ecosystem.
    #[serde(default)]
    pub kind: EcosystemKind,
    /// Package manager of a Node project.
    pub package_manager: Option<PackageManager>,
    /// Dependency manager of a Python project.
    pub deps_manager: Option<DepsManager>,
    /// Maven coordinates; required for Java projects.
    pub java: Option<MavenCoordinates>,
    /// Project names or external target identifiers this project builds after.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Project tasks.
    #[serde(default)]
    pub tasks: BTreeMap<String, TomlTask>,
}

/// An `[[overrides]]` entry: turns a task into a fan-out task.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlOverride {
    /// Name of the task to override.
    pub task: String,
    /// The project owning the task; the workspace root when omitted.
    pub project: Option<String>,
    /// Unlock the task first.
    #[serde(default)]
    pub force: bool,
    /// Freeze the task against later resets.
    #[serde(default)]
    pub disable_reset: bool,
    /// The `nx run-many` invocation the task runs.
    pub run_many: RunManyOptions,
}

/// Represents the deserialized structure of a `monorail.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// The root.
    pub workspace: TomlWorkspace,
    /// Sub-projects, parents first.
    #[serde(default)]
    pub projects: Vec<TomlProject>,
    /// Fan-out overrides, applied in order.
    #[serde(default)]
    pub overrides: Vec<TomlOverride>,
}
