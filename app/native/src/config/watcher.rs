//! Configuration file watcher for live reloading.
//!
//! Watches the configuration file's directory and re-reads the file once
//! the burst of events from a save has settled.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use super::{PlashConfig, get_config_path, reload};
use crate::platform::thread::spawn_named_thread;

/// Debounce duration for config file changes.
/// Some editors trigger multiple events per save (write to temp, rename, etc.).
const CONFIG_DEBOUNCE_MS: u64 = 200;

/// Starts watching the configuration file for changes.
///
/// `on_change` is called from the watcher thread with the new configuration
/// after each successful reload. Parse errors are logged and the previous
/// configuration stays in effect.
pub fn watch_config_file<F>(on_change: F)
where F: Fn(PlashConfig) + Send + 'static {
    let Some(config_path) = get_config_path().cloned() else {
        tracing::debug!("no configuration file loaded, not watching");
        return;
    };

    spawn_named_thread("config-watcher", move || run(&config_path, &on_change));
}

fn run<F>(config_path: &PathBuf, on_change: &F)
where F: Fn(PlashConfig) {
    let config_filename = config_path.file_name().map(OsString::from).unwrap_or_default();
    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
        Ok(w) => w,
        Err(err) => {
            tracing::warn!(error = %err, "failed to create config watcher");
            return;
        }
    };

    // Watch the parent directory to catch editors that save by renaming.
    let watch_path = config_path.parent().unwrap_or(config_path);
    if let Err(err) = watcher.watch(watch_path, RecursiveMode::NonRecursive) {
        tracing::warn!(error = %err, path = %watch_path.display(), "failed to watch config file");
        return;
    }

    tracing::debug!(path = %config_path.display(), "watching configuration file");

    let debounce = Duration::from_millis(CONFIG_DEBOUNCE_MS);
    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if !affects(&event, &config_filename) {
                    continue;
                }
                if !settle(&rx, debounce) {
                    break;
                }

                match reload() {
                    Ok(config) => {
                        tracing::info!("configuration reloaded");
                        on_change(config);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring invalid configuration change");
                    }
                }
            }
            Ok(Err(err)) => tracing::warn!(error = %err, "config watch error"),
            Err(_) => break,
        }
    }
}

fn affects(event: &Event, filename: &OsString) -> bool {
    event.paths.iter().any(|p| p.file_name().is_some_and(|name| name == filename))
}

/// Waits until no event has arrived for `quiet`. Returns `false` if the
/// watcher went away.
fn settle(rx: &Receiver<notify::Result<Event>>, quiet: Duration) -> bool {
    loop {
        match rx.recv_timeout(quiet) {
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => return true,
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
}
