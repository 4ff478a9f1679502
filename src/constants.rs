// src/constants.rs

/// The default name of the workspace description file.
pub const WORKSPACE_CONFIG_FILENAME: &str = "monorail.toml";

/// The workspace manifest emitted for non-Node roots.
pub const WORKSPACE_MANIFEST_FILENAME: &str = "package.json";

/// The Nx workspace configuration file (root only).
pub const NX_CONFIG_FILENAME: &str = "nx.json";

/// The Nx per-project configuration file.
pub const NX_PROJECT_FILENAME: &str = "project.json";

/// The task manifest written for every project.
pub const TASKS_MANIFEST_FILENAME: &str = ".tasks.json";

/// Version-control ignore file, written per project.
pub const GITIGNORE_FILENAME: &str = ".gitignore";

/// The Nx local cache directory, excluded from version control.
pub const NX_CACHE_DIR: &str = ".nx/cache";

/// Branch `nx affected` compares against when none is configured.
pub const DEFAULT_RELEASE_BRANCH: &str = "mainline";

/// Name of the per-project default task.
pub const DEFAULT_TASK_NAME: &str = "default";

/// Output style used by `nx run-many` when none is requested.
pub const DEFAULT_OUTPUT_STYLE: &str = "stream";

/// Suffix appended to the description of every overridden build task.
pub const OVERRIDE_DESCRIPTION_SUFFIX: &str = " for all affected projects";

/// Version constraint pinned for the runner packages in the workspace manifest.
pub const NX_VERSION_CONSTRAINT: &str = "^16";

/// Runner packages always listed as dev dependencies of the workspace manifest.
pub const NX_RUNNER_PACKAGES: [&str; 2] = ["nx", "@nx/devkit"];

/// Isolation-root variable of the poetry virtual environment.
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";

/// Executable search path variable.
pub const PATH_VAR: &str = "PATH";

/// Shell expression that resolves the project's own poetry environment, with the
/// inherited `VIRTUAL_ENV` removed for the query. Degrades to an empty string.
pub const POETRY_ENV_QUERY: &str = "$(env -u VIRTUAL_ENV poetry env info -p || echo '')";
