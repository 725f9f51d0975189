//! Message types for the app actor.
//!
//! All communication with the actor happens through messages:
//! - `AppMessage` - events and commands sent to the actor
//! - `AppCommand` - user-facing verbs, answered with a `CommandResult`
//! - `AppQuery` / `QueryResult` - read-only requests for state data

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::PlashConfig;
use crate::error::PlashError;
use crate::renderer::{LoadPhase, NavigationError};
use crate::system::SystemEvent;
use crate::websites::{InvertColors, Website};

/// Result of a user command: the website it affected, if any.
pub type CommandResult = Result<Option<Website>, PlashError>;

// ============================================================================
// Actor Messages
// ============================================================================

/// Messages sent to the app actor.
#[derive(Debug)]
pub enum AppMessage {
    /// A user command, optionally answered.
    Command {
        command: AppCommand,
        respond_to: Option<oneshot::Sender<CommandResult>>,
    },

    /// A read-only query.
    Query {
        query: AppQuery,
        respond_to: oneshot::Sender<QueryResult>,
    },

    /// Power, lock, wake, display or appearance change.
    System(SystemEvent),

    /// The reachability check for a load passed.
    PreflightPassed { generation: u64 },

    /// The surface finished loading.
    LoadFinished { generation: u64 },

    /// The surface or the preflight check failed.
    LoadFailed { generation: u64, error: NavigationError },

    /// The reload timer fired.
    ReloadTick { generation: u64 },

    /// A title fetch completed.
    TitleFetched { id: Uuid, title: String },

    /// A website's icon was downloaded into the favicon cache.
    FaviconFetched { id: Uuid },

    /// The configuration file changed.
    ConfigReloaded(Box<PlashConfig>),

    /// Stop the actor.
    Shutdown,
}

impl AppMessage {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Command { command, .. } => command.name(),
            Self::Query { .. } => "Query",
            Self::System(_) => "System",
            Self::PreflightPassed { .. } => "PreflightPassed",
            Self::LoadFinished { .. } => "LoadFinished",
            Self::LoadFailed { .. } => "LoadFailed",
            Self::ReloadTick { .. } => "ReloadTick",
            Self::TitleFetched { .. } => "TitleFetched",
            Self::FaviconFetched { .. } => "FaviconFetched",
            Self::ConfigReloaded(_) => "ConfigReloaded",
            Self::Shutdown => "Shutdown",
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// User-facing verbs, shared by the tray, URL scheme, CLI and IPC.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Add a website and make it current.
    Add { url: String, title: Option<String> },
    Remove { id: Uuid },
    SetCurrent { id: Uuid },
    Next,
    Previous,
    Random,
    Reload,
    ToggleBrowsingMode,
    SetBrowsingMode(bool),
    SetEnabled(bool),
    ToggleEnabled,
    /// Edit a website's fields.
    Update { id: Uuid, patch: WebsitePatch },
    /// Reorder a website.
    Move { id: Uuid, index: usize },
}

impl AppCommand {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "Add",
            Self::Remove { .. } => "Remove",
            Self::SetCurrent { .. } => "SetCurrent",
            Self::Next => "Next",
            Self::Previous => "Previous",
            Self::Random => "Random",
            Self::Reload => "Reload",
            Self::ToggleBrowsingMode => "ToggleBrowsingMode",
            Self::SetBrowsingMode(_) => "SetBrowsingMode",
            Self::SetEnabled(_) => "SetEnabled",
            Self::ToggleEnabled => "ToggleEnabled",
            Self::Update { .. } => "Update",
            Self::Move { .. } => "Move",
        }
    }
}

/// Partial update of a website. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebsitePatch {
    pub title: Option<String>,
    /// Raw user input, validated like an added URL.
    pub url: Option<String>,
    pub invert_colors: Option<InvertColors>,
    pub use_print_styles: Option<bool>,
    pub css: Option<String>,
    pub javascript: Option<String>,
    pub allow_self_signed_certificate: Option<bool>,
}

impl WebsitePatch {
    /// Whether the patch changes anything that requires a reload.
    #[must_use]
    pub const fn affects_rendering(&self) -> bool {
        self.url.is_some()
            || self.invert_colors.is_some()
            || self.use_print_styles.is_some()
            || self.css.is_some()
            || self.javascript.is_some()
            || self.allow_self_signed_certificate.is_some()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Read-only requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppQuery {
    /// All websites, optionally filtered by title or URL.
    Websites { filter: Option<String> },
    Current,
    Status,
}

/// Responses to [`AppQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Websites(Vec<Website>),
    Current(Option<Website>),
    Status(Box<AppStatus>),
}

/// Snapshot of what the app is doing, for the tray and `plash status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    /// The user-facing enabled toggle.
    pub enabled: bool,
    /// Enabled and not deactivated by battery power.
    pub active: bool,
    pub browsing: bool,
    pub phase: LoadPhase,
    /// Message of the last real navigation error.
    pub error: Option<String>,
    pub current: Option<Website>,
    pub websites: Vec<Website>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names() {
        let msg = AppMessage::Command {
            command: AppCommand::Next,
            respond_to: None,
        };
        assert_eq!(msg.name(), "Next");
        assert_eq!(AppMessage::ReloadTick { generation: 1 }.name(), "ReloadTick");
    }

    #[test]
    fn test_patch_rendering_fields() {
        assert!(!WebsitePatch::default().affects_rendering());
        assert!(
            !WebsitePatch {
                title: Some("x".into()),
                ..WebsitePatch::default()
            }
            .affects_rendering()
        );
        assert!(
            WebsitePatch {
                css: Some("body{}".into()),
                ..WebsitePatch::default()
            }
            .affects_rendering()
        );
    }

    #[test]
    fn test_patch_deserializes_camel_case() {
        let patch: WebsitePatch =
            serde_json::from_str(r#"{ "invertColors": "darkMode", "usePrintStyles": true }"#)
                .unwrap();
        assert_eq!(patch.invert_colors, Some(InvertColors::DarkMode));
        assert_eq!(patch.use_print_styles, Some(true));
        assert!(patch.title.is_none());
    }
}
