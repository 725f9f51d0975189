//! CLI to app communication.
//!
//! The desktop app serves an [`IpcServer`] on a Unix socket in the cache
//! directory. Requests are JSON objects tagged by `type`:
//!
//! ```json
//! {"type": "websites", "filter": "clock"}
//! {"type": "setCurrent", "website": "2"}
//! {"type": "open", "url": "plash://next"}
//! ```
//!
//! Responses carry either `data` or `error`:
//!
//! ```json
//! {"data": {...}}
//! {"error": "Website not found: 9"}
//! ```

mod socket;

use serde::{Deserialize, Serialize};
pub use socket::{IpcServer, get_socket_path, send_request, send_request_to};
use thiserror::Error;
use uuid::Uuid;

use crate::app::{AppCommand, AppQuery, CommandResult, ControllerHandle, QueryResult, WebsitePatch};
use crate::error::PlashError;
use crate::url_scheme::parse_command_url;
use crate::websites::resolve_selector;

/// Error type for IPC client operations.
#[derive(Debug, Error)]
pub enum IpcError {
    /// Nothing is listening on the socket.
    #[error("Plash is not running")]
    AppNotRunning,
    #[error("Connection timed out")]
    Timeout,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Requests sent from the CLI to the app.
///
/// Websites are addressed by UUID or 1-based index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IpcRequest {
    Ping,
    Websites {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    },
    Current,
    Status,
    Add {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Remove { website: String },
    SetCurrent { website: String },
    Update { website: String, patch: WebsitePatch },
    Move { website: String, index: usize },
    Next,
    Previous,
    Random,
    Reload,
    ToggleBrowsingMode,
    SetEnabled { enabled: bool },
    /// Run a `plash://` command URL.
    Open { url: String },
}

impl IpcRequest {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Websites { .. } => "websites",
            Self::Current => "current",
            Self::Status => "status",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::SetCurrent { .. } => "setCurrent",
            Self::Update { .. } => "update",
            Self::Move { .. } => "move",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Random => "random",
            Self::Reload => "reload",
            Self::ToggleBrowsingMode => "toggleBrowsingMode",
            Self::SetEnabled { .. } => "setEnabled",
            Self::Open { .. } => "open",
        }
    }
}

/// Response from the app to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResponse {
    Success { data: serde_json::Value },
    Error { error: String },
}

impl IpcResponse {
    pub fn success(data: impl Serialize) -> Self {
        Self::Success {
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn error(message: impl Into<String>) -> Self { Self::Error { error: message.into() } }

    /// Converts the response into its data.
    ///
    /// # Errors
    ///
    /// Returns the app's error message as a [`PlashError::CommandError`].
    pub fn into_result(self) -> Result<serde_json::Value, PlashError> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Error { error } => Err(PlashError::CommandError(error)),
        }
    }
}

impl From<Result<serde_json::Value, PlashError>> for IpcResponse {
    fn from(result: Result<serde_json::Value, PlashError>) -> Self {
        match result {
            Ok(data) => Self::Success { data },
            Err(err) => Self::error(err.to_string()),
        }
    }
}

/// Starts the app's IPC server on the default socket.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound.
pub fn start_server(handle: ControllerHandle) -> Result<IpcServer, IpcError> {
    IpcServer::bind(&get_socket_path(), move |request| handle_request(&handle, request))
}

/// Answers a request by talking to the app actor. Must run outside the
/// async runtime.
pub fn handle_request(handle: &ControllerHandle, request: IpcRequest) -> IpcResponse {
    dispatch(handle, request).into()
}

fn dispatch(handle: &ControllerHandle, request: IpcRequest) -> Result<serde_json::Value, PlashError> {
    let command = match request {
        IpcRequest::Ping => return Ok(serde_json::Value::from("pong")),
        IpcRequest::Websites { filter } => return query(handle, AppQuery::Websites { filter }),
        IpcRequest::Current => return query(handle, AppQuery::Current),
        IpcRequest::Status => return query(handle, AppQuery::Status),
        IpcRequest::Add { url, title } => AppCommand::Add { url, title },
        IpcRequest::Remove { website } => AppCommand::Remove { id: resolve(handle, &website)? },
        IpcRequest::SetCurrent { website } => {
            AppCommand::SetCurrent { id: resolve(handle, &website)? }
        }
        IpcRequest::Update { website, patch } => {
            AppCommand::Update { id: resolve(handle, &website)?, patch }
        }
        IpcRequest::Move { website, index } => {
            AppCommand::Move { id: resolve(handle, &website)?, index }
        }
        IpcRequest::Next => AppCommand::Next,
        IpcRequest::Previous => AppCommand::Previous,
        IpcRequest::Random => AppCommand::Random,
        IpcRequest::Reload => AppCommand::Reload,
        IpcRequest::ToggleBrowsingMode => AppCommand::ToggleBrowsingMode,
        IpcRequest::SetEnabled { enabled } => AppCommand::SetEnabled(enabled),
        IpcRequest::Open { url } => parse_command_url(&url)?,
    };

    command_value(handle.blocking_command(command))
}

fn query(handle: &ControllerHandle, query: AppQuery) -> Result<serde_json::Value, PlashError> {
    let value = match handle.blocking_query(query)? {
        QueryResult::Websites(websites) => serde_json::to_value(websites)?,
        QueryResult::Current(website) => serde_json::to_value(website)?,
        QueryResult::Status(status) => serde_json::to_value(status)?,
    };
    Ok(value)
}

fn resolve(handle: &ControllerHandle, selector: &str) -> Result<Uuid, PlashError> {
    let QueryResult::Websites(websites) = handle.blocking_query(AppQuery::Websites { filter: None })?
    else {
        return Err(PlashError::CommandError("Unexpected response from app".to_string()));
    };
    resolve_selector(&websites, selector)
        .ok_or_else(|| PlashError::WebsiteNotFound(selector.to_string()))
}

fn command_value(result: CommandResult) -> Result<serde_json::Value, PlashError> {
    Ok(serde_json::to_value(result?)?)
}
