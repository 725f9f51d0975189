//! Error types for Plash.
//!
//! This module provides the unified error type returned by CLI commands, IPC
//! handlers, and desktop commands. Module-level errors convert into it.

use serde::Serialize;
use thiserror::Error;

use crate::app::ActorError;
use crate::config::ConfigError;
use crate::ipc::IpcError;
use crate::url_scheme::UrlSchemeError;
use crate::websites::{StoreError, UrlError};

/// Errors that can occur during application execution.
///
/// Serializes as `{ "kind": ..., "message": ... }` so it can be sent over the
/// IPC socket or to the webview unchanged.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum PlashError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// The given URL is not a usable website address.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// No website matched the given id or index.
    #[error("Website not found: {0}")]
    WebsiteNotFound(String),
    /// Website store could not be read or written.
    #[error("Store error: {0}")]
    StoreError(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// IPC communication error.
    #[error("IPC error: {0}")]
    IpcError(String),
    /// The desktop app is not running.
    #[error("Plash is not running")]
    AppNotRunning,
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for PlashError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for PlashError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for PlashError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for PlashError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

impl From<UrlError> for PlashError {
    fn from(err: UrlError) -> Self { Self::InvalidUrl(err.to_string()) }
}

impl From<UrlSchemeError> for PlashError {
    fn from(err: UrlSchemeError) -> Self { Self::InvalidArguments(err.to_string()) }
}

impl From<StoreError> for PlashError {
    fn from(err: StoreError) -> Self { Self::StoreError(err.to_string()) }
}

impl From<ConfigError> for PlashError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<ActorError> for PlashError {
    fn from(err: ActorError) -> Self { Self::CommandError(err.to_string()) }
}

impl From<IpcError> for PlashError {
    fn from(err: IpcError) -> Self {
        match err {
            IpcError::AppNotRunning => Self::AppNotRunning,
            other => Self::IpcError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = PlashError::InvalidArguments("Either <ID> or <INDEX> is required".to_string());
        assert_eq!(err.to_string(), "Either <ID> or <INDEX> is required");
    }

    #[test]
    fn test_invalid_url_display() {
        let err = PlashError::InvalidUrl("missing host".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Invalid URL"));
        assert!(msg.contains("missing host"));
    }

    #[test]
    fn test_store_error_display() {
        let err = PlashError::StoreError("permission denied".to_string());
        assert!(err.to_string().starts_with("Store error"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: PlashError = io_err.into();
        assert!(matches!(err, PlashError::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_from_str() {
        let err: PlashError = "boom".into();
        assert!(matches!(err, PlashError::CommandError(_)));
    }

    #[test]
    fn test_ipc_app_not_running_maps_to_dedicated_variant() {
        let err: PlashError = IpcError::AppNotRunning.into();
        assert!(matches!(err, PlashError::AppNotRunning));
        assert_eq!(err.to_string(), "Plash is not running");
    }

    #[test]
    fn test_url_error_conversion() {
        let err: PlashError = UrlError::Empty.into();
        assert!(matches!(err, PlashError::InvalidUrl(_)));
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let err = PlashError::WebsiteNotFound("3".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"kind":"WebsiteNotFound","message":"3"}"#);
    }

    #[test]
    fn test_unit_variant_serializes_without_message() {
        let json = serde_json::to_string(&PlashError::AppNotRunning).unwrap();
        assert_eq!(json, r#"{"kind":"AppNotRunning"}"#);
    }
}
