//! Configuration module for Plash.
//!
//! This module provides configuration types, loading functionality, and file watching
//! for applying configuration changes while the app runs.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod schema;
pub mod template;
pub mod types;
mod watcher;

use std::path::PathBuf;
use std::sync::OnceLock;

use parking_lot::RwLock;
pub use types::{
    ConfigError, MIN_RELOAD_INTERVAL_SECS, PlashConfig, config_paths,
    load_config as load_config_default, load_config_from_path, parse_config,
};
pub use watcher::watch_config_file;

/// Global configuration instance, loaded once at startup and replaced when
/// the file changes.
static CONFIG: OnceLock<RwLock<PlashConfig>> = OnceLock::new();

/// Path to the currently loaded configuration file.
static CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// This must be called before `init()` or `get_config()` to take effect.
///
/// Returns `true` if the path was set successfully, `false` if a path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

/// Loads the configuration from the custom path or the default search paths.
fn load() -> Result<(PlashConfig, PathBuf), ConfigError> {
    CUSTOM_CONFIG_PATH.get().map_or_else(load_config_default, load_config_from_path)
}

/// Loads the configuration from disk.
///
/// Returns the loaded configuration, or a default configuration if loading fails.
/// If no configuration file exists, creates a template configuration file.
fn load_or_default() -> PlashConfig {
    match load() {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            let _ = CONFIG_PATH.set(path);
            config
        }
        Err(ConfigError::NotFound) => {
            create_default_config_file();
            PlashConfig::default()
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            PlashConfig::default()
        }
    }
}

/// Creates a template configuration file at the default location.
fn create_default_config_file() {
    let Some(config_path) = default_config_path() else {
        tracing::debug!("no config path available for creating template");
        return;
    };

    if config_path.exists() {
        return;
    }

    match template::create_config_file(&config_path) {
        Ok(()) => {
            let _ = CONFIG_PATH.set(config_path.clone());
            tracing::info!(path = %config_path.display(), "created default configuration file");
        }
        Err(err) => {
            tracing::debug!(
                error = %err,
                path = %config_path.display(),
                "failed to create default configuration file"
            );
        }
    }
}

/// The path a new configuration file is created at.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    CUSTOM_CONFIG_PATH.get().cloned().or_else(|| config_paths().into_iter().next())
}

fn global() -> &'static RwLock<PlashConfig> {
    CONFIG.get_or_init(|| RwLock::new(load_or_default()))
}

/// Initializes and returns the global configuration.
///
/// This function is idempotent: the file is read only on the first call.
pub fn init() -> PlashConfig { global().read().clone() }

/// Returns a copy of the current configuration, loading it if necessary.
#[must_use]
pub fn get_config() -> PlashConfig { global().read().clone() }

/// Replaces the global configuration.
pub fn set_config(config: PlashConfig) { *global().write() = config; }

/// Returns the path to the loaded configuration file, if any.
pub fn get_config_path() -> Option<&'static PathBuf> { CONFIG_PATH.get() }

/// Re-reads the configuration file and updates the global copy.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed. The global copy
/// is left unchanged in that case.
pub fn reload() -> Result<PlashConfig, ConfigError> {
    let (config, _) = match get_config_path() {
        Some(path) => load_config_from_path(path)?,
        None => load()?,
    };
    set_config(config.clone());
    Ok(config)
}

/// Creates the configuration file from the template if it does not exist.
///
/// Returns the path and whether the file was created.
///
/// # Errors
///
/// Returns an error if no location is available or the file cannot be
/// written.
pub fn ensure_config_file() -> Result<(PathBuf, bool), ConfigError> {
    if let Some(existing) = get_config_path().filter(|p| p.exists()) {
        return Ok((existing.clone(), false));
    }

    let path = default_config_path().ok_or(ConfigError::NotFound)?;
    if path.exists() {
        return Ok((path, false));
    }

    template::create_config_file(&path)?;
    Ok((path, true))
}
