// src/core/graph_display.rs

use crate::core::workspace::{ProjectId, Workspace};
use colored::Colorize;
use std::fmt::Write;

/// Renders an ASCII tree of the workspace, with each project's ecosystem, path and
/// declared dependencies.
pub fn render_project_tree(workspace: &Workspace) -> String {
    let mut out = String::new();
    let root = workspace.root();
    let _ = writeln!(
        out,
        "{} [{}]",
        root.name.bold(),
        root.ecosystem.kind().to_string().dimmed()
    );

    let children = root.subprojects();
    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();
        render_node(workspace, *child, "", is_last, &mut out);
    }
    out
}

/// Recursive function to render a tree node and its descendants.
fn render_node(workspace: &Workspace, id: ProjectId, prefix: &str, is_last: bool, out: &mut String) {
    let project = workspace.project(id);
    let connector = if is_last { "└─" } else { "├─" };

    let _ = write!(
        out,
        "{}{}{} [{}] {}",
        prefix,
        connector,
        project.name,
        project.ecosystem.kind().to_string().dimmed(),
        project.outdir.display()
    );
    if let Some(nx) = project.nx() {
        let dependencies = nx.dependency_names(workspace);
        if !dependencies.is_empty() {
            let _ = write!(out, " {} {}", "->".cyan(), dependencies.join(", "));
        }
    }
    out.push('\n');

    // Prepare the prefix for the children of this node
    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });

    let children = project.subprojects();
    for (i, child) in children.iter().enumerate() {
        let is_last_child = i + 1 == children.len();
        render_node(workspace, *child, &child_prefix, is_last_child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph;
    use crate::models::Ecosystem;

    #[test]
    fn test_render_project_tree_shape() {
        colored::control::set_override(false);

        let mut ws = Workspace::new("monorepo", Ecosystem::Other);
        let a = ws.add_project(ProjectId::ROOT, "a", "packages/a", Ecosystem::Other).unwrap();
        ws.add_project(a, "a1", "packages/a/a1", Ecosystem::Other).unwrap();
        let b = ws.add_project(ProjectId::ROOT, "b", "packages/b", Ecosystem::Other).unwrap();
        graph::ensure_graph_participation(&mut ws, b);
        graph::add_implicit_dependency(&mut ws, b, a).unwrap();

        let tree = render_project_tree(&ws);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(
            lines,
            vec![
                "monorepo [other]",
                "├─a [other] packages/a",
                "│  └─a1 [other] packages/a/a1",
                "└─b [other] packages/b -> a",
            ]
        );
    }
}
