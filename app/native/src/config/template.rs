//! Configuration template generation.
//!
//! Generates a commented configuration template with all available options.

use std::fs;
use std::path::Path;

/// Generates a configuration template with all options commented out.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// Plash Configuration File
// =========================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.
// Changes are applied while Plash is running.
//
// Run `plash schema` to get a JSON Schema for editor validation.

{
  // ============================================================================
  // Reloading
  // ============================================================================
  // Seconds between automatic reloads of the current website (0 = never).
  // Reloading pauses in browsing mode and while the screen is locked.
  // "reloadInterval": 0,

  // ============================================================================
  // Appearance
  // ============================================================================
  // Opacity of the website, from 0.0 (invisible) to 1.0 (opaque).
  // "opacity": 1.0,

  // Display to show the website on (1 = first display). Omit for the main display.
  // "display": 1,

  // Show the website on all Spaces instead of only the current one.
  // "showOnAllSpaces": true,

  // Raise the website above other windows in browsing mode.
  // "bringBrowsingModeToFront": false,

  // Hide the menu bar icon. Control Plash with the `plash` command or
  // plash:// URLs instead.
  // "hideMenuBarIcon": false,

  // ============================================================================
  // Behavior
  // ============================================================================
  // Mute audio and video played by websites.
  // "muteAudio": true,

  // Hide the website while running on battery power.
  // "deactivateOnBattery": false,

  // Custom user agent sent to websites.
  // "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15"
}
"#
    .to_string()
}

/// Creates a configuration file with the template at the specified path.
///
/// Creates parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlashConfig, parse_config};

    #[test]
    fn test_template_parses_to_defaults() {
        let config = parse_config(&generate_config_template()).unwrap();
        assert_eq!(config, PlashConfig::default());
    }

    #[test]
    fn test_template_mentions_every_option() {
        let template = generate_config_template();
        for key in [
            "reloadInterval",
            "opacity",
            "display",
            "showOnAllSpaces",
            "bringBrowsingModeToFront",
            "hideMenuBarIcon",
            "muteAudio",
            "deactivateOnBattery",
            "userAgent",
        ] {
            assert!(template.contains(key), "template is missing {key}");
        }
    }

    #[test]
    fn test_create_config_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plash").join("config.jsonc");
        create_config_file(&path).unwrap();
        assert!(path.exists());
    }
}
