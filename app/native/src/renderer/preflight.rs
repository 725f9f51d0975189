//! Reachability check run before the surface navigates.
//!
//! Web views report some failures (bad certificates, DNS) late or not at
//! all. A plain request with the same certificate policy surfaces them as a
//! [`NavigationError`] up front. HTTP error statuses are left to the page.
//!
//! The check sends `HEAD` and only repeats it as `GET` for servers that
//! refuse the method.

use reqwest::StatusCode;
use url::Url;

use super::errors::NavigationError;
use crate::http::build_client;
use crate::websites::url::resolve_local_file;

/// Checks that the website can be reached.
///
/// # Errors
///
/// Returns the classified transport error, or [`NavigationError::LocalFile`]
/// for a local website that no longer exists.
pub async fn preflight(
    url: &Url,
    allow_self_signed: bool,
    user_agent: Option<&str>,
) -> Result<(), NavigationError> {
    if url.scheme() == "file" {
        resolve_local_file(url)?;
        return Ok(());
    }

    let client = build_client(user_agent, allow_self_signed)?;
    let mut response = client.head(url.clone()).send().await?;
    if needs_get_fallback(response.status()) {
        tracing::trace!(%url, status = %response.status(), "HEAD refused, retrying with GET");
        response = client.get(url.clone()).send().await?;
    }

    tracing::debug!(%url, status = %response.status(), "preflight succeeded");
    Ok(())
}

/// Servers that do not implement `HEAD` answer 405 or 501.
fn needs_get_fallback(status: StatusCode) -> bool {
    matches!(status, StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED)
}
