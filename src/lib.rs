//! # monorail
//!
//! Configures the task graph of a polyglot monorepo for the Nx task runner.
//!
//! The library owns a small project-tree model ([`core::workspace`]) and the logic
//! layered on top of it:
//!
//! - **`core::run_many`**: composes `nx run-many` invocations from [`models::RunManyOptions`].
//! - **`core::task`**: tasks with a lock guard and a freezable reset.
//! - **`core::graph`**: implicit dependency edges between projects.
//! - **`core::env_patch`**: poetry environment isolation for nested Python projects.
//! - **`core::configurator`**: the workspace root lifecycle (pre-synthesis and synthesis).
//! - **`core::synthesizer`** and **`system::writer`**: rendering and writing the generated files.

pub mod cli;
/// Fixed names and values shared across the crate.
pub mod constants;
pub mod core;
/// Data types shared across the crate and the `monorail.toml` models.
pub mod models;
pub mod system;
