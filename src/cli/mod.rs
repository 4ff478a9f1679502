// src/cli/mod.rs

//! Command-line interface: clap definitions and handlers.

use clap::{Parser, Subcommand};

/// Argument structs for each subcommand.
pub mod args;
pub mod handlers;

/// monorail: configures the Nx task graph of a polyglot monorepo.
///
/// The workspace is described in `monorail.toml`: the root, every sub-project with
/// its ecosystem, the dependencies between them and the build tasks that should fan
/// out to all affected projects.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// The available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configure the workspace and write nx.json, project.json and task manifests.
    Synth(args::SynthArgs),
    /// Print the `nx run-many` command line for the given options.
    Command(args::RunManyArgs),
    /// Show the project tree with ecosystems and dependencies.
    Graph(args::WorkspaceArgs),
    /// List the tasks of a project after finalization.
    Tasks(args::TasksArgs),
}
