//! Side effects computed by the controller and the executor that applies
//! them.
//!
//! The controller never touches the surface, the timer, the disk or the
//! network. It returns a list of [`Effect`]s and the [`EffectExecutor`]
//! performs them in order.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use super::handle::ControllerHandle;
use super::messages::{AppMessage, AppStatus};
use crate::cache::get_favicon_dir;
use crate::renderer::preflight::preflight;
use crate::renderer::{LoadRequest, NavigationError, Placement, RenderSurface};
use crate::websites::metadata::{cached_favicon, download_favicon, fetch_metadata, remove_cached_favicon};
use crate::websites::{StoreSnapshot, WebsiteStore};

/// A side effect requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Check reachability, then report `PreflightPassed` or `LoadFailed`.
    Preflight {
        generation: u64,
        url: Url,
        allow_self_signed: bool,
        user_agent: Option<String>,
    },
    /// Navigate the surface.
    Load(LoadRequest),
    /// Post `LoadFailed { generation, Timeout }` after `timeout`, replacing
    /// any pending watchdog. The controller drops it if the load settled.
    ArmLoadTimeout { generation: u64, timeout: Duration },
    Unload,
    /// Evaluate a script in the loaded page.
    Inject(String),
    SetInteractive { interactive: bool, bring_to_front: bool },
    SetVisible(bool),
    SetOpacity(f64),
    Reposition(Placement),
    /// Post `ReloadTick { generation }` after `interval`, replacing any
    /// pending tick.
    ArmTimer { interval: Duration, generation: u64 },
    DisarmTimer,
    /// Look up the page, reporting its title with `TitleFetched` when
    /// `want_title` is set and caching its icon unless one is cached.
    FetchMetadata {
        id: Uuid,
        url: Url,
        allow_self_signed: bool,
        user_agent: Option<String>,
        want_title: bool,
    },
    /// Delete the cached icon of a website.
    ForgetFavicon(Uuid),
    /// Write the collection to disk.
    Persist(StoreSnapshot),
    /// Show (`Some`) or clear (`None`) the error line.
    ShowError { message: Option<String>, modal: bool },
    /// Publish the new status to listeners.
    StatusChanged(Box<AppStatus>),
}

/// Callback receiving every status change.
pub type StatusListener = Arc<dyn Fn(&AppStatus) + Send + Sync>;

/// Applies effects. Lives inside the actor task.
pub struct EffectExecutor {
    surface: Arc<dyn RenderSurface>,
    store: WebsiteStore,
    handle: ControllerHandle,
    timer: Option<JoinHandle<()>>,
    load_watchdog: Option<JoinHandle<()>>,
    preflight: bool,
    favicon_dir: Option<PathBuf>,
    status_listeners: Vec<StatusListener>,
}

impl EffectExecutor {
    /// Creates an executor that drives `surface`, persists to `store` and
    /// reports async outcomes back through `handle`.
    #[must_use]
    pub fn new(surface: Arc<dyn RenderSurface>, store: WebsiteStore, handle: ControllerHandle) -> Self {
        Self {
            surface,
            store,
            handle,
            timer: None,
            load_watchdog: None,
            preflight: true,
            favicon_dir: Some(get_favicon_dir()),
            status_listeners: Vec::new(),
        }
    }

    /// Disables the network reachability check. Loads go straight to the
    /// surface.
    #[must_use]
    pub const fn without_preflight(mut self) -> Self {
        self.preflight = false;
        self
    }

    /// Caches website icons in `dir`.
    #[must_use]
    pub fn with_favicon_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.favicon_dir = Some(dir.into());
        self
    }

    /// Disables icon downloads.
    #[must_use]
    pub fn without_favicons(mut self) -> Self {
        self.favicon_dir = None;
        self
    }

    /// Registers a status listener.
    #[must_use]
    pub fn with_status_listener(mut self, listener: StatusListener) -> Self {
        self.status_listeners.push(listener);
        self
    }

    /// Whether a reload tick is pending.
    #[must_use]
    pub fn timer_pending(&self) -> bool { self.timer.as_ref().is_some_and(|t| !t.is_finished()) }

    /// Executes a batch of effects in order.
    pub fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Preflight { generation, url, allow_self_signed, user_agent } => {
                self.spawn_preflight(generation, url, allow_self_signed, user_agent);
            }
            Effect::Load(request) => {
                tracing::info!(url = %request.url, generation = request.generation, "loading website");
                self.surface.load(&request);
            }
            Effect::ArmLoadTimeout { generation, timeout } => self.arm_load_watchdog(generation, timeout),
            Effect::Unload => {
                self.cancel_load_watchdog();
                self.surface.unload();
            }
            Effect::Inject(script) => self.surface.inject(&script),
            Effect::SetInteractive { interactive, bring_to_front } => {
                self.surface.set_interactive(interactive, bring_to_front);
            }
            Effect::SetVisible(visible) => self.surface.set_visible(visible),
            Effect::SetOpacity(opacity) => self.surface.set_opacity(opacity),
            Effect::Reposition(placement) => self.surface.reposition(placement),
            Effect::ArmTimer { interval, generation } => self.arm_timer(interval, generation),
            Effect::DisarmTimer => self.disarm_timer(),
            Effect::FetchMetadata { id, url, allow_self_signed, user_agent, want_title } => {
                self.spawn_metadata_fetch(id, url, allow_self_signed, user_agent, want_title);
            }
            Effect::ForgetFavicon(id) => {
                if let Some(dir) = &self.favicon_dir {
                    remove_cached_favicon(dir, id);
                }
            }
            Effect::Persist(snapshot) => {
                if let Err(err) = self.store.save(&snapshot) {
                    tracing::error!(error = %err, "failed to save websites");
                }
            }
            Effect::ShowError { message, modal } => {
                self.surface.show_error(message.as_deref(), modal);
            }
            Effect::StatusChanged(status) => {
                for listener in &self.status_listeners {
                    listener(&status);
                }
            }
        }
    }

    fn arm_timer(&mut self, interval: Duration, generation: u64) {
        self.disarm_timer();

        let handle = self.handle.clone();
        tracing::debug!(?interval, generation, "arming reload timer");
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if handle.send_async(AppMessage::ReloadTick { generation }).await.is_err() {
                tracing::trace!("actor stopped before reload tick");
            }
        }));
    }

    fn disarm_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn arm_load_watchdog(&mut self, generation: u64, timeout: Duration) {
        self.cancel_load_watchdog();

        let handle = self.handle.clone();
        self.load_watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let message = AppMessage::LoadFailed { generation, error: NavigationError::Timeout };
            if handle.send_async(message).await.is_err() {
                tracing::trace!("actor stopped before load timeout");
            }
        }));
    }

    fn cancel_load_watchdog(&mut self) {
        if let Some(watchdog) = self.load_watchdog.take() {
            watchdog.abort();
        }
    }

    fn spawn_preflight(
        &self,
        generation: u64,
        url: Url,
        allow_self_signed: bool,
        user_agent: Option<String>,
    ) {
        let handle = self.handle.clone();

        if !self.preflight {
            tokio::spawn(async move {
                if handle.send_async(AppMessage::PreflightPassed { generation }).await.is_err() {
                    tracing::trace!("actor stopped before preflight result");
                }
            });
            return;
        }

        tokio::spawn(async move {
            let message = match preflight(&url, allow_self_signed, user_agent.as_deref()).await {
                Ok(()) => AppMessage::PreflightPassed { generation },
                Err(error) => {
                    tracing::debug!(%url, %error, "preflight failed");
                    AppMessage::LoadFailed { generation, error }
                }
            };
            let _ = handle.send_async(message).await;
        });
    }

    fn spawn_metadata_fetch(
        &self,
        id: Uuid,
        url: Url,
        allow_self_signed: bool,
        user_agent: Option<String>,
        want_title: bool,
    ) {
        let favicon_dir = self.favicon_dir.clone().filter(|dir| cached_favicon(dir, id).is_none());
        if !want_title && favicon_dir.is_none() {
            return;
        }

        let handle = self.handle.clone();
        tokio::spawn(async move {
            let metadata = match fetch_metadata(&url, user_agent.as_deref(), allow_self_signed).await {
                Ok(metadata) => metadata,
                Err(err) => {
                    tracing::debug!(%url, error = %err, "failed to fetch website metadata");
                    return;
                }
            };

            if want_title {
                match metadata.title {
                    Some(title) => {
                        let _ = handle.send_async(AppMessage::TitleFetched { id, title }).await;
                    }
                    None => tracing::debug!(%url, "website has no title"),
                }
            }

            let (Some(dir), Some(icon)) = (favicon_dir, metadata.favicon) else {
                return;
            };
            match download_favicon(&icon, id, &dir, user_agent.as_deref(), allow_self_signed).await {
                Ok(path) => {
                    tracing::debug!(%id, path = %path.display(), "cached website icon");
                    let _ = handle.send_async(AppMessage::FaviconFetched { id }).await;
                }
                Err(err) => tracing::debug!(%icon, error = %err, "failed to fetch website icon"),
            }
        });
    }
}

impl Drop for EffectExecutor {
    fn drop(&mut self) {
        self.disarm_timer();
        self.cancel_load_watchdog();
    }
}
