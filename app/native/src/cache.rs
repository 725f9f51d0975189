//! Cache and data directory utilities.
//!
//! Uses `~/Library/Caches/{APP_BUNDLE_ID}/` (or the platform equivalent) for
//! ephemeral files like the IPC socket, and the platform data directory for
//! the website store. Both fall back to `/tmp/{APP_BUNDLE_ID}/`.

use std::path::PathBuf;

use crate::constants::APP_BUNDLE_ID;

/// Returns the root cache directory for the application.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from(format!("/tmp/{APP_BUNDLE_ID}")),
        |cache| cache.join(APP_BUNDLE_ID),
    )
}

/// Returns the directory holding downloaded website icons.
#[must_use]
pub fn get_favicon_dir() -> PathBuf { get_cache_dir().join("favicons") }

/// Returns the directory where persistent application data is stored.
///
/// On macOS this is `~/Library/Application Support/{APP_BUNDLE_ID}`.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(format!("/tmp/{APP_BUNDLE_ID}")),
        |data| data.join(APP_BUNDLE_ID),
    )
}
