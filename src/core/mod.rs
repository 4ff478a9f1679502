// src/core/mod.rs

//! Pure configuration logic: the project tree, tasks, the dependency graph and the
//! configurator lifecycle. Nothing here touches the filesystem except the loader.

pub mod config_loader;
pub mod configurator;
pub mod env_patch;
pub mod graph;
/// Text rendering of the project tree.
pub mod graph_display;
/// Path expansion and relative POSIX paths.
pub mod paths;
/// Composition of `nx run-many` command lines.
pub mod run_many;
pub mod synthesizer;
pub mod task;
pub mod workspace;
