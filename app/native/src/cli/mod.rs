//! Command-line interface.
//!
//! Commands talk to the running app over IPC. When the app is not running,
//! collection commands edit the website store directly.

mod commands;
pub mod output;

use clap::Parser;
pub use commands::Cli;
pub use commands::website::OfflineStore;

use crate::error::PlashError;

/// Parses the command line and runs the command.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn run() -> Result<(), PlashError> { Cli::parse().execute() }
