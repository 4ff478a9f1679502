// src/cli/handlers/mod.rs

//! One handler per subcommand.

/// `monorail command`
pub mod command;
/// Helpers shared by the handlers.
pub mod commons;
/// `monorail graph`
pub mod graph;
/// `monorail synth`
pub mod synth;
/// `monorail tasks`
pub mod tasks;
