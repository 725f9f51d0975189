//! Parsing user-entered website addresses and resolving them for loading.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::platform::path::expand;

/// Placeholder replaced with the logical width of the target screen.
pub const SCREEN_WIDTH_PLACEHOLDER: &str = "[[screenWidth]]";

/// Placeholder replaced with the logical height of the target screen.
pub const SCREEN_HEIGHT_PLACEHOLDER: &str = "[[screenHeight]]";

/// File loaded when a local website points at a directory.
pub const LOCAL_INDEX_FILE: &str = "index.html";

/// Matches both raw and percent-encoded placeholders.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\[\[|%5[Bb]%5[Bb])screen(Width|Height)(?:\]\]|%5[Dd]%5[Dd])")
        .unwrap_or_else(|err| unreachable!("placeholder regex is valid: {err}"))
});

/// Why an address could not be used as a website.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Nothing was entered.
    #[error("URL is empty")]
    Empty,
    /// The text could not be parsed as a URL.
    #[error("'{0}' is not a valid URL")]
    Malformed(String),
    /// Only http, https and file URLs can be rendered.
    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),
    /// A remote URL without a host.
    #[error("URL has no host")]
    MissingHost,
    /// A local path that does not exist or cannot be rendered.
    #[error("local website not found: {0}")]
    LocalPathNotFound(String),
}

/// Logical size of the screen the website is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }
}

/// Parses user input into a website URL.
///
/// - `~/…` and `/…` are local paths and must exist as a directory or an
///   `.html`/`.htm` file.
/// - Input without a scheme gets `http://` for `localhost` and IP literals,
///   `https://` otherwise.
/// - Only `http`, `https` and `file` are accepted.
///
/// # Errors
///
/// Returns a [`UrlError`] describing why the input was rejected.
pub fn parse_website_url(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    if input.starts_with('~') || input.starts_with('/') {
        return local_path_to_url(&expand(input));
    }

    let candidate = if has_scheme(input) {
        input.to_string()
    } else if is_local_host(input) {
        format!("http://{input}")
    } else {
        format!("https://{input}")
    };

    let url = Url::parse(&candidate).map_err(|_| UrlError::Malformed(input.to_string()))?;

    match url.scheme() {
        "http" | "https" => {
            if url.host_str().is_none_or(str::is_empty) {
                return Err(UrlError::MissingHost);
            }
            Ok(url)
        }
        "file" => {
            let path = url.to_file_path().map_err(|()| UrlError::Malformed(input.to_string()))?;
            local_path_to_url(&path)
        }
        other => Err(UrlError::UnsupportedScheme(other.to_string())),
    }
}

/// Whether the input starts with `scheme:` followed by `//` or a known
/// opaque scheme. `localhost:3000` is a host with a port, not a scheme.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };

    let valid_scheme = !scheme.is_empty()
        && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid_scheme && (rest.starts_with("//") || !rest.chars().next().is_some_and(|c| c.is_ascii_digit()))
}

/// Whether the host part of a scheme-less input is `localhost` or an IP.
fn is_local_host(input: &str) -> bool {
    let authority = input.split(['/', '?', '#']).next().unwrap_or_default();
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    };

    host.eq_ignore_ascii_case("localhost") || host.parse::<IpAddr>().is_ok()
}

/// Converts an existing local path into a `file://` URL.
fn local_path_to_url(path: &Path) -> Result<Url, UrlError> {
    let display = path.display().to_string();

    let is_html = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

    if path.is_dir() {
        Url::from_directory_path(path).map_err(|()| UrlError::LocalPathNotFound(display))
    } else if path.is_file() && is_html {
        Url::from_file_path(path).map_err(|()| UrlError::LocalPathNotFound(display))
    } else {
        Err(UrlError::LocalPathNotFound(display))
    }
}

/// Replaces screen-size placeholders in the URL.
///
/// Returns the URL unchanged when it contains no placeholders or when no
/// screen size is known.
#[must_use]
pub fn apply_placeholders(url: &Url, screen: Option<ScreenSize>) -> Url {
    let Some(screen) = screen else {
        return url.clone();
    };

    let raw = url.as_str();
    if !PLACEHOLDER_RE.is_match(raw) {
        return url.clone();
    }

    let replaced = PLACEHOLDER_RE.replace_all(raw, |caps: &regex::Captures<'_>| {
        if &caps[1] == "Width" {
            screen.width.to_string()
        } else {
            screen.height.to_string()
        }
    });

    Url::parse(&replaced).unwrap_or_else(|err| {
        tracing::debug!(url = %raw, error = %err, "placeholder substitution produced an invalid URL");
        url.clone()
    })
}

/// Whether the URL contains a screen-size placeholder.
#[must_use]
pub fn has_placeholders(url: &Url) -> bool { PLACEHOLDER_RE.is_match(url.as_str()) }

/// Resolves a `file://` URL to the file that should be loaded.
///
/// Directories resolve to their `index.html`.
///
/// # Errors
///
/// Returns [`UrlError::LocalPathNotFound`] if the path (or the directory's
/// index file) does not exist.
pub fn resolve_local_file(url: &Url) -> Result<PathBuf, UrlError> {
    let path = url.to_file_path().map_err(|()| UrlError::Malformed(url.to_string()))?;

    if path.is_dir() {
        let index = path.join(LOCAL_INDEX_FILE);
        if index.is_file() {
            return Ok(index);
        }
        return Err(UrlError::LocalPathNotFound(format!(
            "{} has no {LOCAL_INDEX_FILE}",
            path.display()
        )));
    }

    if path.is_file() {
        Ok(path)
    } else {
        Err(UrlError::LocalPathNotFound(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(parse_website_url("   "), Err(UrlError::Empty));
    }

    #[test]
    fn test_https_is_added_to_bare_domains() {
        let url = parse_website_url("time.is").unwrap();
        assert_eq!(url.as_str(), "https://time.is/");
    }

    #[test]
    fn test_http_is_added_to_localhost_and_ips() {
        assert_eq!(parse_website_url("localhost:3000").unwrap().as_str(), "http://localhost:3000/");
        assert_eq!(parse_website_url("127.0.0.1/dash").unwrap().as_str(), "http://127.0.0.1/dash");
    }

    #[test]
    fn test_explicit_scheme_is_kept() {
        let url = parse_website_url("http://example.com/a?b=c").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.query(), Some("b=c"));
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        assert_eq!(
            parse_website_url("ftp://example.com"),
            Err(UrlError::UnsupportedScheme("ftp".to_string()))
        );
        assert_eq!(
            parse_website_url("javascript:alert(1)"),
            Err(UrlError::UnsupportedScheme("javascript".to_string()))
        );
    }

    #[test]
    fn test_malformed_url_is_rejected() {
        assert!(matches!(parse_website_url("https://exa mple.com"), Err(UrlError::Malformed(_))));
    }

    #[test]
    fn test_local_directory_becomes_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = parse_website_url(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with('/'));
    }

    #[test]
    fn test_local_html_file_becomes_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clock.html");
        std::fs::write(&file, "<html></html>").unwrap();
        let url = parse_website_url(file.to_str().unwrap()).unwrap();
        assert!(url.path().ends_with("clock.html"));
    }

    #[test]
    fn test_missing_local_path_is_rejected() {
        assert!(matches!(
            parse_website_url("/definitely/not/here"),
            Err(UrlError::LocalPathNotFound(_))
        ));
    }

    #[test]
    fn test_local_non_html_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();
        assert!(parse_website_url(file.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_placeholders_are_replaced() {
        let url = parse_website_url(
            "https://picsum.photos/[[screenWidth]]/[[screenHeight]]?w=[[screenWidth]]",
        )
        .unwrap();
        assert!(has_placeholders(&url));

        let resolved = apply_placeholders(&url, Some(ScreenSize::new(1728, 1117)));
        assert_eq!(resolved.as_str(), "https://picsum.photos/1728/1117?w=1728");
        assert!(!has_placeholders(&resolved));
    }

    #[test]
    fn test_percent_encoded_placeholders_are_replaced() {
        let url = Url::parse("https://example.com/?size=%5B%5BscreenWidth%5D%5D").unwrap();
        let resolved = apply_placeholders(&url, Some(ScreenSize::new(800, 600)));
        assert_eq!(resolved.as_str(), "https://example.com/?size=800");
    }

    #[test]
    fn test_placeholders_untouched_without_screen() {
        let url = Url::parse("https://example.com/[[screenWidth]]").unwrap();
        assert_eq!(apply_placeholders(&url, None), url);
    }

    #[test]
    fn test_resolve_local_directory_uses_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCAL_INDEX_FILE), "<html></html>").unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        let resolved = resolve_local_file(&url).unwrap();
        assert!(resolved.ends_with(LOCAL_INDEX_FILE));
    }

    #[test]
    fn test_resolve_local_directory_without_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        let err = resolve_local_file(&url).unwrap_err();
        assert!(err.to_string().contains("index.html"));
    }
}
