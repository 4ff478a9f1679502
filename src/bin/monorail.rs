// src/bin/monorail.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use monorail::cli::{Cli, Command, handlers};

/// The main entry point of the `monorail` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    match cli.command {
        Command::Synth(args) => handlers::synth::handle(args),
        Command::Command(args) => handlers::command::handle(args),
        Command::Graph(args) => handlers::graph::handle(args),
        Command::Tasks(args) => handlers::tasks::handle(args),
    }
}
