//! # System Interaction Layer
//!
//! The boundary between the pure configuration logic in `core` and the filesystem.
//!
//! ## Modules
//!
//! - **`writer`**: writes rendered files below the output directory, creating
//!   directories and skipping files that are already up to date.

pub mod writer;
