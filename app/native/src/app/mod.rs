//! App actor.
//!
//! The actor owns the [`Controller`] and processes messages sequentially.
//! Every handler returns effects which the [`EffectExecutor`] applies before
//! the next message is read.
//!
//! # Panic Recovery
//!
//! If a handler panics, the panic is caught and logged and the actor keeps
//! processing messages. A pending reply sender is dropped, so the caller
//! sees [`ActorError::ReceiveFailed`].

mod controller;
mod effects;
mod handle;
mod messages;

use std::panic::{AssertUnwindSafe, catch_unwind};

pub use controller::Controller;
pub use effects::{Effect, EffectExecutor, StatusListener};
pub use handle::{ActorError, ControllerHandle};
pub use messages::{
    AppCommand, AppMessage, AppQuery, AppStatus, CommandResult, QueryResult, WebsitePatch,
};
use tokio::sync::mpsc;

/// The actor that owns all app state.
pub struct AppActor {
    controller: Controller,
    executor: EffectExecutor,
    receiver: mpsc::Receiver<AppMessage>,
}

impl AppActor {
    /// Creates an actor. `receiver` is the other half of the handle passed
    /// to `executor`.
    #[must_use]
    pub const fn new(
        controller: Controller,
        executor: EffectExecutor,
        receiver: mpsc::Receiver<AppMessage>,
    ) -> Self {
        Self { controller, executor, receiver }
    }

    /// Applies the initial effects, then runs the message loop until
    /// `Shutdown` arrives or every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("app actor starting");

        let effects = self.controller.start();
        self.executor.execute(effects);

        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, AppMessage::Shutdown) {
                tracing::debug!("app actor received shutdown message");
                break;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| self.handle_message(msg)));

            match result {
                Ok(effects) => self.executor.execute(effects),
                Err(panic_info) => {
                    let panic_msg = panic_info
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| panic_info.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());

                    tracing::error!(message = msg_name, panic = %panic_msg, "panic in app actor");
                }
            }
        }

        tracing::debug!("app actor exiting");
    }

    fn handle_message(&mut self, msg: AppMessage) -> Vec<effects::Effect> {
        match msg {
            AppMessage::Command { command, respond_to } => {
                let name = command.name();
                let (result, effects) = self.controller.handle_command(command);

                if let Err(err) = &result {
                    tracing::debug!(command = name, error = %err, "command failed");
                }
                if let Some(tx) = respond_to {
                    let _ = tx.send(result);
                }
                effects
            }
            AppMessage::Query { query, respond_to } => {
                let _ = respond_to.send(self.controller.query(&query));
                Vec::new()
            }
            AppMessage::System(event) => {
                tracing::debug!(?event, "system event");
                self.controller.handle_system(event)
            }
            AppMessage::PreflightPassed { generation } => {
                self.controller.on_preflight_passed(generation)
            }
            AppMessage::LoadFinished { generation } => self.controller.on_load_finished(generation),
            AppMessage::LoadFailed { generation, error } => {
                self.controller.on_load_failed(generation, error)
            }
            AppMessage::ReloadTick { generation } => self.controller.on_reload_tick(generation),
            AppMessage::TitleFetched { id, title } => self.controller.on_title_fetched(id, &title),
            AppMessage::FaviconFetched { id } => self.controller.on_favicon_fetched(id),
            AppMessage::ConfigReloaded(config) => {
                tracing::info!("configuration reloaded");
                self.controller.on_config_reloaded(*config)
            }
            AppMessage::Shutdown => Vec::new(),
        }
    }
}
