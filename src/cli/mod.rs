//! Command-line interface for ideaforge.
//!
//! Provides commands for running exploration batches, inspecting progress,
//! cancellation, report synthesis, and data reset.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
