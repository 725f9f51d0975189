//! Shared HTTP client construction for title fetching and preflight checks.

use std::time::Duration;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Safari/605.1.15";

/// Timeout applied to every request made by the app.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds a [`reqwest::Client`] with the app's timeout and user agent.
///
/// # Errors
///
/// Returns the underlying error if the TLS backend cannot be initialized.
pub fn build_client(
    user_agent: Option<&str>,
    accept_invalid_certs: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent.filter(|ua| !ua.trim().is_empty()).unwrap_or(DEFAULT_USER_AGENT))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_defaults() {
        assert!(build_client(None, false).is_ok());
    }

    #[test]
    fn test_build_client_accepting_invalid_certs() {
        assert!(build_client(Some("Plash/1.0"), true).is_ok());
    }

    #[test]
    fn test_blank_user_agent_falls_back() {
        assert!(build_client(Some("   "), false).is_ok());
    }
}
