// src/cli/handlers/graph.rs

use crate::{
    cli::{args::WorkspaceArgs, handlers::commons},
    core::{graph, graph_display},
};
use anyhow::Result;

/// Prints the project tree.
pub fn handle(args: WorkspaceArgs) -> Result<()> {
    let mut loaded = commons::load(&args)?;
    // Show every sub-project as a graph participant, as synthesis would.
    graph::ensure_project_graph(&mut loaded.workspace);
    print!("{}", graph_display::render_project_tree(&loaded.workspace));
    Ok(())
}
