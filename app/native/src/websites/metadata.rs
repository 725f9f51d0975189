//! Best-effort title and icon lookup for websites.
//!
//! Icons are cached as `<website id>.png` or `<website id>.ico` so the menu
//! can show them without touching the network.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::url::resolve_local_file;
use crate::http::build_client;

/// Icon formats the menu can display, by file extension.
const FAVICON_EXTENSIONS: [&str; 2] = ["png", "ico"];

/// Why metadata could not be fetched. Never shown to the user.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read local website: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Url(#[from] super::url::UrlError),
    #[error("unsupported icon: {0}")]
    UnsupportedIcon(String),
}

/// Title and icon of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    /// The declared icon, or `/favicon.ico` on the page's origin for remote
    /// pages.
    pub favicon: Option<Url>,
}

/// Fetches the title and icon location of a website.
///
/// Remote pages are downloaded, local sites are read from disk.
///
/// # Errors
///
/// Returns a [`MetadataError`] if the page cannot be retrieved.
pub async fn fetch_metadata(
    url: &Url,
    user_agent: Option<&str>,
    allow_self_signed: bool,
) -> Result<PageMetadata, MetadataError> {
    let (html, base) = if url.scheme() == "file" {
        let path = resolve_local_file(url)?;
        let base = Url::from_file_path(&path).unwrap_or_else(|()| url.clone());
        (std::fs::read_to_string(path)?, base)
    } else {
        let client = build_client(user_agent, allow_self_signed)?;
        let response = client.get(url.clone()).send().await?.error_for_status()?;
        let base = response.url().clone();
        (response.text().await?, base)
    };

    Ok(extract_metadata(&html, &base))
}

/// Extracts the title and icon from a page. Relative icon links resolve
/// against `base`.
#[must_use]
pub fn extract_metadata(html: &str, base: &Url) -> PageMetadata {
    let document = Html::parse_document(html);
    PageMetadata {
        title: title_of(&document),
        favicon: favicon_of(&document, base),
    }
}

/// The `<title>`, falling back to the `og:title` meta tag.
fn title_of(document: &Html) -> Option<String> {
    let from_title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
    });

    let from_og = || {
        Selector::parse(r#"meta[property="og:title"]"#).ok().and_then(|selector| {
            document
                .select(&selector)
                .find_map(|el| el.value().attr("content"))
                .map(collapse_whitespace)
        })
    };

    from_title.filter(|t| !t.is_empty()).or_else(from_og).filter(|t| !t.is_empty())
}

fn favicon_of(document: &Html, base: &Url) -> Option<Url> {
    let declared = Selector::parse("link[rel~=icon][href]").ok().and_then(|selector| {
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base.join(href.trim()).ok())
            .find(|url| matches!(url.scheme(), "http" | "https" | "file"))
    });

    declared.or_else(|| match base.scheme() {
        "http" | "https" => base.join("/favicon.ico").ok(),
        _ => None,
    })
}

/// Downloads `icon` into `dir` and returns the cached file.
///
/// # Errors
///
/// Returns a [`MetadataError`] if the icon cannot be retrieved or is not a
/// PNG or ICO image.
pub async fn download_favicon(
    icon: &Url,
    id: Uuid,
    dir: &Path,
    user_agent: Option<&str>,
    allow_self_signed: bool,
) -> Result<PathBuf, MetadataError> {
    let bytes = if icon.scheme() == "file" {
        let path = icon.to_file_path().map_err(|()| MetadataError::UnsupportedIcon(icon.to_string()))?;
        std::fs::read(path)?
    } else {
        let client = build_client(user_agent, allow_self_signed)?;
        client.get(icon.clone()).send().await?.error_for_status()?.bytes().await?.to_vec()
    };

    let extension = favicon_format(&bytes).ok_or_else(|| MetadataError::UnsupportedIcon(icon.to_string()))?;

    std::fs::create_dir_all(dir)?;
    remove_cached_favicon(dir, id);
    let path = dir.join(format!("{id}.{extension}"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Sniffs the image format from its magic bytes.
#[must_use]
pub fn favicon_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0, 0, 1, 0]) {
        Some("ico")
    } else {
        None
    }
}

/// The cached icon of a website, if one was downloaded.
#[must_use]
pub fn cached_favicon(dir: &Path, id: Uuid) -> Option<PathBuf> {
    FAVICON_EXTENSIONS
        .iter()
        .map(|extension| dir.join(format!("{id}.{extension}")))
        .find(|path| path.is_file())
}

/// Deletes the cached icon of a website.
pub fn remove_cached_favicon(dir: &Path, id: Uuid) {
    for extension in FAVICON_EXTENSIONS {
        let path = dir.join(format!("{id}.{extension}"));
        if let Err(err) = std::fs::remove_file(&path)
            && err.kind() != ErrorKind::NotFound
        {
            tracing::debug!(path = %path.display(), error = %err, "failed to remove cached favicon");
        }
    }
}

fn collapse_whitespace(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn base() -> Url { Url::parse("https://time.is/London").unwrap() }

    #[test]
    fn test_extracts_title() {
        let html = "<html><head><title>\n  Time.is \n - exact time </title></head></html>";
        assert_eq!(extract_metadata(html, &base()).title.as_deref(), Some("Time.is - exact time"));
    }

    #[test]
    fn test_falls_back_to_og_title() {
        let html = r#"<html><head><title>  </title>
            <meta property="og:title" content="Weather Radar"></head></html>"#;
        assert_eq!(extract_metadata(html, &base()).title.as_deref(), Some("Weather Radar"));
    }

    #[test]
    fn test_no_title_is_none() {
        assert_eq!(extract_metadata("<html><body>hello</body></html>", &base()).title, None);
    }

    #[test]
    fn test_declared_icon_resolves_against_page() {
        let html = r#"<head><link rel="stylesheet" href="a.css">
            <link rel="shortcut icon" href="/static/icon.png"></head>"#;
        let favicon = extract_metadata(html, &base()).favicon.unwrap();
        assert_eq!(favicon.as_str(), "https://time.is/static/icon.png");
    }

    #[test]
    fn test_missing_icon_falls_back_to_favicon_ico() {
        let favicon = extract_metadata("<title>x</title>", &base()).favicon.unwrap();
        assert_eq!(favicon.as_str(), "https://time.is/favicon.ico");
    }

    #[test]
    fn test_inline_icon_is_skipped() {
        let html = r#"<link rel="icon" href="data:image/png;base64,AAAA">"#;
        let favicon = extract_metadata(html, &base()).favicon.unwrap();
        assert_eq!(favicon.as_str(), "https://time.is/favicon.ico");
    }

    #[test]
    fn test_local_page_without_icon_has_none() {
        let page = Url::parse("file:///tmp/site/index.html").unwrap();
        assert_eq!(extract_metadata("<title>x</title>", &page).favicon, None);
    }

    #[test]
    fn test_favicon_format_sniffing() {
        assert_eq!(favicon_format(PNG), Some("png"));
        assert_eq!(favicon_format(&[0, 0, 1, 0, 1, 0]), Some("ico"));
        assert_eq!(favicon_format(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), None);
        assert_eq!(favicon_format(&[]), None);
    }

    #[tokio::test]
    async fn test_local_site_reads_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<title>Local Clock</title><link rel="icon" href="icon.png">"#,
        )
        .unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();

        let metadata = fetch_metadata(&url, None, false).await.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Local Clock"));
        assert_eq!(metadata.favicon, Url::from_file_path(dir.path().join("icon.png")).ok());
    }

    #[tokio::test]
    async fn test_local_site_without_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        assert!(matches!(fetch_metadata(&url, None, false).await, Err(MetadataError::Url(_))));
    }

    #[tokio::test]
    async fn test_download_caches_and_replaces_icon() {
        let site = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let id = Uuid::now_v7();

        std::fs::write(site.path().join("icon.png"), PNG).unwrap();
        let icon = Url::from_file_path(site.path().join("icon.png")).unwrap();
        let path = download_favicon(&icon, id, cache.path(), None, false).await.unwrap();
        assert_eq!(cached_favicon(cache.path(), id), Some(path));

        std::fs::write(site.path().join("icon.ico"), [0, 0, 1, 0, 1, 0]).unwrap();
        let icon = Url::from_file_path(site.path().join("icon.ico")).unwrap();
        let path = download_favicon(&icon, id, cache.path(), None, false).await.unwrap();
        assert!(path.ends_with(format!("{id}.ico")));
        assert!(!cache.path().join(format!("{id}.png")).exists());

        remove_cached_favicon(cache.path(), id);
        assert_eq!(cached_favicon(cache.path(), id), None);
    }

    #[tokio::test]
    async fn test_unsupported_icon_is_not_cached() {
        let site = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let id = Uuid::now_v7();

        std::fs::write(site.path().join("icon.svg"), "<svg/>").unwrap();
        let icon = Url::from_file_path(site.path().join("icon.svg")).unwrap();
        let result = download_favicon(&icon, id, cache.path(), None, false).await;
        assert!(matches!(result, Err(MetadataError::UnsupportedIcon(_))));
        assert_eq!(cached_favicon(cache.path(), id), None);
    }
}
