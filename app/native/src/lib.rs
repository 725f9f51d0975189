//! Plash - Make any website your desktop wallpaper.
//!
//! This library provides both the desktop application and CLI functionality.
//! The app core is an actor that owns the website collection and the
//! renderer state; the desktop shell, the CLI (over IPC), `plash://` URLs
//! and the system monitors all drive it through a [`app::ControllerHandle`].

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod ipc;
pub mod logging;
pub mod platform;
pub mod renderer;
pub mod system;
pub mod url_scheme;
pub mod websites;

#[cfg(feature = "desktop")]
pub mod desktop;

use error::PlashError;

/// Runs the desktop application.
///
/// # Errors
///
/// Returns an error if the desktop shell fails to start, or if this build
/// does not include it.
pub fn run() -> Result<(), PlashError> {
    #[cfg(feature = "desktop")]
    {
        desktop::run()
    }

    #[cfg(not(feature = "desktop"))]
    {
        Err(PlashError::CommandError(
            "This build of Plash has no desktop app. Rebuild with `--features desktop`.".to_string(),
        ))
    }
}
