//! Application-wide constants.

/// Human readable application name.
pub const APP_NAME: &str = "Plash";

/// Reverse-domain identifier used for cache, data, and socket paths.
pub const APP_BUNDLE_ID: &str = "com.plash.desktop";

/// Custom URL scheme handled by [`crate::url_scheme`].
pub const URL_SCHEME: &str = "plash";

/// Label of the webview window that renders the wallpaper.
pub const DESKTOP_WINDOW_LABEL: &str = "desktop";
