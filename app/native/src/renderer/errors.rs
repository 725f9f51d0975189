//! Navigation failures reported by the surface or the preflight request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::websites::UrlError;

/// A failed or interrupted page load.
///
/// `Cancelled`, `FrameLoadInterrupted` and `PluginHandledLoad` happen during
/// normal navigation (a reload superseding a load, a download, a media
/// plugin taking over) and are never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum NavigationError {
    #[error("navigation was cancelled")]
    Cancelled,
    #[error("frame load interrupted")]
    FrameLoadInterrupted,
    #[error("load handled by plugin")]
    PluginHandledLoad,
    #[error("network error: {0}")]
    Network(String),
    #[error("certificate error: {0}")]
    Certificate(String),
    #[error("the website took too long to respond")]
    Timeout,
    #[error("{0}")]
    LocalFile(String),
    #[error("{0}")]
    Other(String),
}

impl NavigationError {
    /// Whether the error is part of normal navigation and should not be
    /// surfaced.
    #[must_use]
    pub const fn is_ignorable(&self) -> bool {
        matches!(self, Self::Cancelled | Self::FrameLoadInterrupted | Self::PluginHandledLoad)
    }

    /// Classifies a message reported by a web view.
    ///
    /// Web views only hand back a description, so this matches on the
    /// wording WebKit and Chromium use for each category.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("cancelled") || lower.contains("canceled") || lower.contains("err_aborted") {
            Self::Cancelled
        } else if lower.contains("frame load interrupted") {
            Self::FrameLoadInterrupted
        } else if lower.contains("plug-in handled load") || lower.contains("plugin handled load") {
            Self::PluginHandledLoad
        } else if lower.contains("timed out") || lower.contains("timeout") {
            Self::Timeout
        } else if lower.contains("certificate") || lower.contains("ssl") || lower.contains("err_cert") {
            Self::Certificate(message.to_string())
        } else if lower.contains("network")
            || lower.contains("offline")
            || lower.contains("internet connection")
            || lower.contains("could not connect")
            || lower.contains("hostname could not be found")
            || lower.contains("err_name_not_resolved")
        {
            Self::Network(message.to_string())
        } else {
            Self::Other(message.to_string())
        }
    }
}

impl From<reqwest::Error> for NavigationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }

        let description = error_chain(&err);
        let lower = description.to_lowercase();

        if lower.contains("certificate") || lower.contains("tls") || lower.contains("handshake") {
            Self::Certificate(description)
        } else if err.is_connect() || err.is_request() || err.is_redirect() {
            Self::Network(description)
        } else {
            Self::Other(description)
        }
    }
}

impl From<UrlError> for NavigationError {
    fn from(err: UrlError) -> Self { Self::LocalFile(err.to_string()) }
}

/// Joins an error with its sources, since reqwest keeps the useful part
/// (DNS, TLS) in the source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        description.push_str(": ");
        description.push_str(&inner.to_string());
        source = inner.source();
    }
    description
}
