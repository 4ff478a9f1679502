// src/cli/handlers/commons.rs

// Shared helpers used by multiple handlers.

use crate::{
    cli::args::WorkspaceArgs,
    core::{
        config_loader::{self, LoadedWorkspace},
        paths,
    },
};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Expands the description path given on the command line.
pub fn config_path(args: &WorkspaceArgs) -> Result<PathBuf> {
    paths::expand_user_path(&args.config)
}

/// Loads the workspace description named on the command line.
pub fn load(args: &WorkspaceArgs) -> Result<LoadedWorkspace> {
    let path = config_path(args)?;
    config_loader::load_workspace(&path)
        .with_context(|| format!("Failed to load workspace from '{}'", path.display()))
}
