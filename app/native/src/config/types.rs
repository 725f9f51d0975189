//! Configuration types and file loading for Plash.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default reload interval: never.
const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 0;

/// Smallest accepted non-zero reload interval.
pub const MIN_RELOAD_INTERVAL_SECS: u64 = 10;

/// Root configuration structure.
///
/// Every field is optional in the file; missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PlashConfig {
    /// Seconds between automatic reloads of the current website.
    /// Default: 0 (never reload)
    pub reload_interval: u64,

    /// Opacity of the wallpaper window, from 0.0 (invisible) to 1.0.
    /// Default: 1.0
    pub opacity: f64,

    /// Display to show the website on, 1-based. Absent means the main display.
    pub display: Option<u32>,

    /// Show the website on every Space instead of only the current one.
    /// Default: true
    pub show_on_all_spaces: bool,

    /// Mute audio and video played by websites.
    /// Default: true
    pub mute_audio: bool,

    /// Hide the website while running on battery power.
    /// Default: false
    pub deactivate_on_battery: bool,

    /// Raise the window above other windows in browsing mode.
    /// Default: false
    pub bring_browsing_mode_to_front: bool,

    /// Hide the menu bar icon. Use `plash` commands or the URL scheme to
    /// control the app.
    /// Default: false
    pub hide_menu_bar_icon: bool,

    /// Custom user agent sent by the web view and title fetches.
    pub user_agent: Option<String>,
}

impl Default for PlashConfig {
    fn default() -> Self {
        Self {
            reload_interval: DEFAULT_RELOAD_INTERVAL_SECS,
            opacity: 1.0,
            display: None,
            show_on_all_spaces: true,
            mute_audio: true,
            deactivate_on_battery: false,
            bring_browsing_mode_to_front: false,
            hide_menu_bar_icon: false,
            user_agent: None,
        }
    }
}

impl PlashConfig {
    /// Reload interval, with `Duration::ZERO` meaning no reload. Non-zero
    /// values below the minimum are raised to it.
    #[must_use]
    pub fn reload_interval(&self) -> Duration {
        match self.reload_interval {
            0 => Duration::ZERO,
            secs => Duration::from_secs(secs.max(MIN_RELOAD_INTERVAL_SECS)),
        }
    }

    /// Opacity clamped to `0.0..=1.0`. Invalid numbers fall back to opaque.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        if self.opacity.is_finite() { self.opacity.clamp(0.0, 1.0) } else { 1.0 }
    }

    /// The configured user agent, ignoring blank values.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref().map(str::trim).filter(|ua| !ua.is_empty())
    }
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/plash/config.jsonc or \
        ~/Library/Application Support/plash/config.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Directory name used under the config roots.
const CONFIG_DIR_NAME: &str = "plash";

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/plash/config.jsonc` or `config.json`, if set
/// 2. `~/.config/plash/config.jsonc` or `config.json`
/// 3. `~/Library/Application Support/plash/…` (the platform config dir)
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        roots.push(PathBuf::from(xdg_config));
    }

    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".config"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        roots.push(config_dir);
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for root in roots {
        let dir = root.join(CONFIG_DIR_NAME);
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    paths
}

/// Parses JSONC text into a configuration.
///
/// # Errors
///
/// Returns `ConfigError::ParseError` if the text is not valid JSON once
/// comments are stripped.
pub fn parse_config(text: &str) -> Result<PlashConfig, ConfigError> {
    let reader = json_comments::StripComments::new(text.as_bytes());
    Ok(serde_json::from_reader(reader)?)
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, or an I/O or
/// parse error.
pub fn load_config_from_path(path: &PathBuf) -> Result<(PlashConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }
    let config = read_config(path)?;
    Ok((config, path.clone()))
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of
/// the expected locations, or an I/O or parse error for the first one found.
pub fn load_config() -> Result<(PlashConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            let config = read_config(&path)?;
            return Ok((config, path));
        }
    }

    Err(ConfigError::NotFound)
}

fn read_config(path: &Path) -> Result<PlashConfig, ConfigError> {
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    Ok(serde_json::from_reader(reader)?)
}
