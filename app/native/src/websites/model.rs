//! The website record rendered as wallpaper.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// When the page colors should be inverted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvertColors {
    /// Never invert.
    #[default]
    Never,
    /// Always invert.
    Always,
    /// Invert only while the system appearance is dark.
    DarkMode,
}

impl InvertColors {
    /// Returns whether colors are inverted for the given system appearance.
    #[must_use]
    pub const fn applies(self, dark_appearance: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::DarkMode => dark_appearance,
        }
    }
}

/// A single website in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    /// Opaque unique identifier (UUID v7).
    pub id: Uuid,

    /// Display title. Empty until the user sets one or it is fetched.
    #[serde(default)]
    pub title: String,

    /// Remote `http(s)` address or `file` URL of a local site.
    pub url: Url,

    /// Whether this website is the one currently rendered.
    #[serde(default)]
    pub is_current: bool,

    /// Color inversion mode.
    #[serde(default)]
    pub invert_colors: InvertColors,

    /// Render with the page's print stylesheet.
    #[serde(default)]
    pub use_print_styles: bool,

    /// Custom CSS injected after load.
    #[serde(default)]
    pub css: String,

    /// Custom JavaScript evaluated after load.
    #[serde(default)]
    pub javascript: String,

    /// Accept self-signed TLS certificates for this website.
    #[serde(default)]
    pub allow_self_signed_certificate: bool,
}

impl Website {
    /// Creates a new, non-current website with default customization.
    #[must_use]
    pub fn new(url: Url, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into().trim().to_string(),
            url,
            is_current: false,
            invert_colors: InvertColors::Never,
            use_print_styles: false,
            css: String::new(),
            javascript: String::new(),
            allow_self_signed_certificate: false,
        }
    }

    /// Whether this website points at a local directory or file.
    #[must_use]
    pub fn is_local(&self) -> bool { self.url.scheme() == "file" }

    /// Title shown in menus: the title, or a name derived from the URL.
    #[must_use]
    pub fn display_title(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }

        if self.is_local() {
            if let Some(name) = self
                .url
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            {
                return name.to_string();
            }
        } else if let Some(host) = self.url.host_str() {
            return host.trim_start_matches("www.").to_string();
        }

        self.url.to_string()
    }

    /// The URL without its scheme, used as a secondary label.
    #[must_use]
    pub fn subtitle(&self) -> String {
        let url = self.url.as_str();
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        without_scheme.trim_end_matches('/').to_string()
    }

    /// Whether the title is empty and should be fetched.
    #[must_use]
    pub fn needs_title(&self) -> bool { self.title.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn website(url: &str, title: &str) -> Website { Website::new(Url::parse(url).unwrap(), title) }

    #[test]
    fn test_new_website_defaults() {
        let site = website("https://time.is", "  Clock  ");
        assert_eq!(site.title, "Clock");
        assert!(!site.is_current);
        assert_eq!(site.invert_colors, InvertColors::Never);
        assert!(!site.allow_self_signed_certificate);
        assert!(site.css.is_empty());
    }

    #[test]
    fn test_new_websites_have_unique_ids() {
        let a = website("https://a.com", "");
        let b = website("https://a.com", "");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_display_title_prefers_title() {
        assert_eq!(website("https://time.is", "Clock").display_title(), "Clock");
    }

    #[test]
    fn test_display_title_falls_back_to_host() {
        assert_eq!(website("https://www.time.is/London", "").display_title(), "time.is");
    }

    #[test]
    fn test_display_title_for_local_site_uses_directory_name() {
        let site = website("file:///Users/me/Sites/weather/", "");
        assert!(site.is_local());
        assert_eq!(site.display_title(), "weather");
    }

    #[test]
    fn test_subtitle_strips_scheme_and_trailing_slash() {
        assert_eq!(website("https://time.is/", "").subtitle(), "time.is");
        assert_eq!(website("https://time.is/London", "").subtitle(), "time.is/London");
    }

    #[test]
    fn test_invert_colors_applies() {
        assert!(!InvertColors::Never.applies(true));
        assert!(InvertColors::Always.applies(false));
        assert!(InvertColors::DarkMode.applies(true));
        assert!(!InvertColors::DarkMode.applies(false));
    }

    #[test]
    fn test_deserialize_fills_missing_optional_fields() {
        let json = r#"{
            "id": "0190b6b2-5a1c-7cc3-9a4e-3f2a1b0c9d8e",
            "url": "https://time.is/"
        }"#;
        let site: Website = serde_json::from_str(json).unwrap();
        assert!(site.title.is_empty());
        assert!(!site.allow_self_signed_certificate);
        assert_eq!(site.invert_colors, InvertColors::Never);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut site = website("https://time.is", "Clock");
        site.invert_colors = InvertColors::DarkMode;
        let json = serde_json::to_string(&site).unwrap();
        assert!(json.contains(r#""isCurrent":false"#));
        assert!(json.contains(r#""invertColors":"darkMode""#));
        assert!(json.contains(r#""allowSelfSignedCertificate":false"#));
    }
}
