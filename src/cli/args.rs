// src/cli/args.rs

//! Arguments of each subcommand.
use crate::{
    constants::WORKSPACE_CONFIG_FILENAME,
    models::{PackageManager, RunManyOptions},
};
use clap::Args;

/// Selects the workspace description.
#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Path to the workspace description.
    #[arg(long, short, default_value = WORKSPACE_CONFIG_FILENAME)]
    pub config: String,
}

/// Arguments of `monorail synth`.
#[derive(Args, Debug, Clone)]
pub struct SynthArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Directory the generated files are written to. Defaults to the directory of the description.
    #[arg(long, short)]
    pub outdir: Option<String>,

    /// Render everything but only print the paths instead of writing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments of `monorail tasks`.
#[derive(Args, Debug, Clone)]
pub struct TasksArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Project whose tasks are listed. Defaults to the workspace root.
    pub project: Option<String>,
}

/// Arguments of `monorail command`, mirroring [`RunManyOptions`].
#[derive(Args, Debug, Clone, Default)]
pub struct RunManyArgs {
    /// Task to run in every selected project.
    #[arg(long)]
    pub target: String,

    /// Nx output style. Defaults to `stream`.
    #[arg(long)]
    pub output_style: Option<String>,

    /// Named configuration of the target.
    #[arg(long)]
    pub configuration: Option<String>,

    /// Tasks runner from nx.json.
    #[arg(long)]
    pub runner: Option<String>,

    /// Maximum number of parallel processes.
    #[arg(long)]
    pub parallel: Option<u32>,

    /// Skip the Nx cache.
    #[arg(long)]
    pub skip_cache: bool,

    /// Ignore cycles in the task graph.
    #[arg(long)]
    pub ignore_cycles: bool,

    /// Keep going after the first failure.
    #[arg(long)]
    pub no_bail: bool,

    /// Restrict the run to these projects.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub projects: Vec<String>,

    /// Exclude projects matching this pattern.
    #[arg(long)]
    pub exclude: Option<String>,

    /// Print additional Nx output.
    #[arg(long)]
    pub verbose: bool,

    /// Package manager whose exec prefix is used.
    #[arg(long, value_enum, default_value_t = PackageManager::Npm)]
    pub package_manager: PackageManager,
}

impl From<RunManyArgs> for RunManyOptions {
    fn from(args: RunManyArgs) -> Self {
        Self {
            target: args.target,
            output_style: args.output_style,
            configuration: args.configuration,
            runner: args.runner,
            parallel: args.parallel,
            skip_cache: args.skip_cache,
            ignore_cycles: args.ignore_cycles,
            no_bail: args.no_bail,
            projects: (!args.projects.is_empty()).then_some(args.projects),
            exclude: args.exclude,
            verbose: args.verbose,
        }
    }
}
