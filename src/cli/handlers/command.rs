// src/cli/handlers/command.rs

use crate::{cli::args::RunManyArgs, core::run_many, models::RunManyOptions};
use anyhow::Result;

/// Prints the composed `nx run-many` command line.
pub fn handle(args: RunManyArgs) -> Result<()> {
    let package_manager = args.package_manager;
    let options = RunManyOptions::from(args);
    println!("{}", run_many::exec_run_many_command(package_manager, &options));
    Ok(())
}
