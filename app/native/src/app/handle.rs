//! Handle for communicating with the app actor.
//!
//! The `ControllerHandle` is cheap to clone and can be shared across threads
//! and tasks. Async methods are used from tasks; the `blocking_*` variants
//! are for plain threads such as the IPC server and system monitors.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::messages::{
    AppCommand, AppMessage, AppQuery, AppStatus, CommandResult, QueryResult, WebsitePatch,
};
use crate::config::PlashConfig;
use crate::renderer::NavigationError;
use crate::system::SystemEvent;
use crate::websites::Website;

/// Channel buffer size for the app actor.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Error types for actor communication.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to actor: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from actor: channel closed")]
    ReceiveFailed,

    /// Query timed out.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The actor answered a query with an unexpected result.
    #[error("Unexpected response from actor")]
    UnexpectedResponse,
}

/// Handle for communicating with the app actor.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    sender: mpsc::Sender<AppMessage>,
}

impl ControllerHandle {
    /// Creates the actor channel. The receiver goes to [`super::AppActor`].
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<AppMessage>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        (Self { sender }, receiver)
    }

    // ========================================================================
    // Fire-and-forget sending
    // ========================================================================

    /// Send a message without waiting. Fails if the channel is full or closed.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the message could not be queued.
    pub fn send(&self, msg: AppMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message, waiting for buffer space.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn send_async(&self, msg: AppMessage) -> Result<(), ActorError> {
        self.sender.send(msg).await.map_err(|_| ActorError::SendFailed)
    }

    /// Send a message from a thread outside the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn blocking_send(&self, msg: AppMessage) -> Result<(), ActorError> {
        self.sender.blocking_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Whether the actor is still running.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.sender.is_closed() }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Run a command and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns the command's own error, or an actor error converted into
    /// [`crate::error::PlashError`].
    pub async fn command(&self, command: AppCommand) -> CommandResult {
        let (tx, rx) = oneshot::channel();
        self.send_async(AppMessage::Command { command, respond_to: Some(tx) }).await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)?
    }

    /// Blocking variant of [`Self::command`].
    ///
    /// # Errors
    ///
    /// See [`Self::command`].
    pub fn blocking_command(&self, command: AppCommand) -> CommandResult {
        let (tx, rx) = oneshot::channel();
        self.blocking_send(AppMessage::Command { command, respond_to: Some(tx) })?;
        rx.blocking_recv().map_err(|_| ActorError::ReceiveFailed)?
    }

    /// Queue a command without waiting for its result.
    pub fn dispatch(&self, command: AppCommand) {
        let name = command.name();
        if self.send(AppMessage::Command { command, respond_to: None }).is_err() {
            tracing::warn!(command = name, "failed to dispatch command");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Execute a query and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] or [`ActorError::ReceiveFailed`]
    /// if the actor has stopped.
    pub async fn query(&self, query: AppQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(AppMessage::Query { query, respond_to: tx }).await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Execute a query with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the query doesn't complete in time,
    /// or any error from [`Self::query`].
    pub async fn query_timeout(
        &self,
        query: AppQuery,
        timeout: Duration,
    ) -> Result<QueryResult, ActorError> {
        tokio::time::timeout(timeout, self.query(query))
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    /// Blocking variant of [`Self::query`].
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    pub fn blocking_query(&self, query: AppQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.blocking_send(AppMessage::Query { query, respond_to: tx })?;
        rx.blocking_recv().map_err(|_| ActorError::ReceiveFailed)
    }

    /// All websites, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn websites(&self, filter: Option<String>) -> Result<Vec<Website>, ActorError> {
        match self.query(AppQuery::Websites { filter }).await? {
            QueryResult::Websites(websites) => Ok(websites),
            _ => Err(ActorError::UnexpectedResponse),
        }
    }

    /// The current website.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn current(&self) -> Result<Option<Website>, ActorError> {
        match self.query(AppQuery::Current).await? {
            QueryResult::Current(website) => Ok(website),
            _ => Err(ActorError::UnexpectedResponse),
        }
    }

    /// The app status.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn status(&self) -> Result<AppStatus, ActorError> {
        match self.query(AppQuery::Status).await? {
            QueryResult::Status(status) => Ok(*status),
            _ => Err(ActorError::UnexpectedResponse),
        }
    }

    // ========================================================================
    // Convenience commands
    // ========================================================================

    /// Add a website and make it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the actor has stopped.
    pub async fn add(&self, url: &str, title: Option<&str>) -> CommandResult {
        self.command(AppCommand::Add {
            url: url.to_string(),
            title: title.map(str::to_string),
        })
        .await
    }

    /// Remove a website.
    ///
    /// # Errors
    ///
    /// Returns an error if the website does not exist or the actor has stopped.
    pub async fn remove(&self, id: Uuid) -> CommandResult { self.command(AppCommand::Remove { id }).await }

    /// Make a website current.
    ///
    /// # Errors
    ///
    /// Returns an error if the website does not exist or the actor has stopped.
    pub async fn set_current(&self, id: Uuid) -> CommandResult {
        self.command(AppCommand::SetCurrent { id }).await
    }

    /// Edit a website.
    ///
    /// # Errors
    ///
    /// Returns an error if the website does not exist, the new URL is
    /// invalid, or the actor has stopped.
    pub async fn update(&self, id: Uuid, patch: WebsitePatch) -> CommandResult {
        self.command(AppCommand::Update { id, patch }).await
    }

    // ========================================================================
    // Event reporting (fire-and-forget)
    // ========================================================================

    /// Report a finished page load.
    pub fn load_finished(&self, generation: u64) {
        self.report(AppMessage::LoadFinished { generation });
    }

    /// Report a failed page load.
    pub fn load_failed(&self, generation: u64, error: NavigationError) {
        self.report(AppMessage::LoadFailed { generation, error });
    }

    /// Report a system change.
    pub fn system_event(&self, event: SystemEvent) { self.report(AppMessage::System(event)); }

    /// Report a configuration change.
    pub fn config_reloaded(&self, config: PlashConfig) {
        self.report(AppMessage::ConfigReloaded(Box::new(config)));
    }

    /// Ask the actor to stop.
    pub fn shutdown(&self) { self.report(AppMessage::Shutdown); }

    fn report(&self, msg: AppMessage) {
        let name = msg.name();
        if let Err(err) = self.send(msg) {
            tracing::debug!(message = name, error = %err, "dropped actor message");
        }
    }
}
