#![allow(clippy::multiple_crate_versions)]

//! Plash - Make any website your desktop wallpaper.
//!
//! This binary serves as both the desktop application and CLI:
//! - With no arguments, with `--desktop`, with the process serial number
//!   Finder passes, or with a `plash://` URL: runs the desktop app
//! - With subcommands (e.g., `plash add time.is`): runs CLI commands
//!
//! CLI commands talk to the running app over IPC. When it is not running,
//! collection commands edit the website store directly.

fn main() {
    plash_lib::logging::init();

    let args: Vec<String> = std::env::args().collect();

    let run_desktop = args
        .get(1)
        .is_none_or(|arg| arg == "--desktop" || arg.starts_with("-psn_") || is_command_url(arg));

    let result = if run_desktop { plash_lib::run() } else { plash_lib::cli::run() };

    if let Err(err) = result {
        eprintln!("plash: {err}");
        std::process::exit(1);
    }
}

/// Whether `arg` is a `plash://` URL handed over by the system.
fn is_command_url(arg: &str) -> bool {
    arg.to_lowercase().starts_with(&format!("{}:", plash_lib::constants::URL_SCHEME))
}
