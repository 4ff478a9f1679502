// src/core/paths.rs

use anyhow::{Result, anyhow};
use std::path::{Component, Path, PathBuf};

/// Expands a user-supplied path, resolving the home directory (`~`) and
/// environment variables (`$VAR`).
pub fn expand_user_path(template: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(template)
        .map_err(|e| anyhow!("Failed to expand path '{}': {}", template, e))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Computes the path of `to` relative to `from`. Both paths must be expressed
/// relative to the same base (the workspace root); `.` components are ignored.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = normal_components(from);
    let to: Vec<Component<'_>> = normal_components(to);

    let shared = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..from.len() {
        relative.push("..");
    }
    for component in to.iter().skip(shared) {
        relative.push(component.as_os_str());
    }
    relative
}

/// Renders a relative path with forward slashes, as Node and Nx expect.
pub fn to_posix(path: &Path) -> String {
    let rendered = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if rendered.is_empty() {
        ".".to_string()
    } else {
        rendered
    }
}

fn normal_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
