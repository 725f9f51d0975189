//! [`RenderSurface`] backed by the wallpaper webview window.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tauri::webview::{PageLoadEvent, PageLoadPayload};
use tauri::{AppHandle, WebviewWindow};

use super::window::{self, WindowLayer};
use crate::app::ControllerHandle;
use crate::renderer::{LoadRequest, NavigationError, Placement, RenderSurface};
use crate::system::display::target_display;

/// Page-load bookkeeping shared with the `on_page_load` hook.
///
/// Generation 0 means no website is loading or loaded.
#[derive(Default)]
pub struct PageTracker {
    generation: AtomicU64,
    script: Mutex<Option<String>>,
    /// Last script injected after the load, re-run after the load script.
    injected: Mutex<Option<String>>,
}

impl PageTracker {
    #[must_use]
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    fn begin(&self, generation: u64, script: String) {
        *self.script.lock() = Some(script);
        self.injected.lock().take();
        self.generation.store(generation, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.generation.store(0, Ordering::SeqCst);
        self.script.lock().take();
        self.injected.lock().take();
    }

    fn remember_injected(&self, script: &str) { *self.injected.lock() = Some(script.to_string()); }

    /// Page-load hook. On `Finished`, runs the customization script and
    /// reports the load to the actor.
    pub fn on_page_load(&self, webview: &WebviewWindow, payload: &PageLoadPayload<'_>, handle: &ControllerHandle) {
        if !matches!(payload.event(), PageLoadEvent::Finished) {
            return;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        if generation == 0 {
            return;
        }

        // The script is evaluated on every finished navigation, including
        // links followed in browsing mode.
        let scripts = [self.script.lock().clone(), self.injected.lock().clone()];
        for script in scripts.iter().flatten().filter(|script| !script.is_empty()) {
            if let Err(err) = webview.eval(script) {
                tracing::warn!(error = %err, url = %payload.url(), "failed to run website script");
            }
        }

        tracing::debug!(generation, url = %payload.url(), "page finished loading");
        handle.load_finished(generation);
    }
}

/// The wallpaper window as a render surface.
pub struct TauriSurface {
    app: AppHandle,
    window: WebviewWindow,
    tracker: Arc<PageTracker>,
    handle: ControllerHandle,
}

impl TauriSurface {
    #[must_use]
    pub const fn new(
        app: AppHandle,
        window: WebviewWindow,
        tracker: Arc<PageTracker>,
        handle: ControllerHandle,
    ) -> Self {
        Self { app, window, tracker, handle }
    }

    fn eval(&self, script: &str) {
        if let Err(err) = self.window.eval(script) {
            tracing::warn!(error = %err, "failed to evaluate script");
        }
    }
}

impl RenderSurface for TauriSurface {
    fn load(&self, request: &LoadRequest) {
        if request.user_agent.is_some() {
            tracing::debug!("user agent changes apply when the window is created");
        }

        self.tracker.begin(request.generation, request.script.clone());
        if let Err(err) = self.window.navigate(request.url.clone()) {
            self.handle.load_failed(request.generation, NavigationError::from_message(&err.to_string()));
        }
    }

    fn unload(&self) {
        self.tracker.clear();
        self.eval(&format!("window.location.replace({:?})", window::IDLE_PAGE));
    }

    fn inject(&self, script: &str) {
        self.tracker.remember_injected(script);
        self.eval(script);
    }

    fn set_interactive(&self, interactive: bool, bring_to_front: bool) {
        if let Err(err) = self.window.set_ignore_cursor_events(!interactive) {
            tracing::warn!(error = %err, "failed to change cursor handling");
        }

        let layer = if interactive && bring_to_front {
            WindowLayer::Front
        } else {
            WindowLayer::Desktop
        };
        window::set_layer(&self.window, layer);

        if interactive {
            let _ = self.window.set_focus();
        }
    }

    fn set_visible(&self, visible: bool) {
        let result = if visible { self.window.show() } else { self.window.hide() };
        if let Err(err) = result {
            tracing::warn!(error = %err, visible, "failed to change window visibility");
        }
    }

    fn set_opacity(&self, opacity: f64) { window::set_alpha(&self.window, opacity); }

    fn reposition(&self, placement: Placement) {
        let displays = super::probe::displays(&self.app);
        match target_display(&displays, placement.display) {
            Some(display) => window::cover(&self.window, display),
            None => tracing::warn!("no display to place the wallpaper on"),
        }

        if let Err(err) = self.window.set_visible_on_all_workspaces(placement.show_on_all_spaces) {
            tracing::warn!(error = %err, "failed to change Space visibility");
        }
    }

    fn show_error(&self, message: Option<&str>, modal: bool) {
        // The tray shows the error line from the status listener.
        let Some(message) = message.filter(|_| modal) else {
            return;
        };

        let literal = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
        let _ = self.window.set_focus();
        self.eval(&format!("window.alert({literal})"));
    }
}
