//! The web rendering surface boundary.
//!
//! The desktop shell implements [`RenderSurface`] on top of a webview
//! window. Load outcomes flow back through the controller handle tagged with
//! the generation from the [`LoadRequest`].

use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;
use uuid::Uuid;

/// Everything the surface needs to navigate to a website.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Load generation; outcomes for older generations are discarded.
    pub generation: u64,
    pub website_id: Uuid,
    /// URL with placeholders substituted and local directories resolved.
    pub url: Url,
    pub allow_self_signed: bool,
    pub mute_audio: bool,
    pub user_agent: Option<String>,
    /// Customization script to evaluate once the page has loaded.
    pub script: String,
}

/// Where and how the surface window is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// 1-based display index, `None` for the main display.
    pub display: Option<u32>,
    pub show_on_all_spaces: bool,
}

/// A web view used as wallpaper.
///
/// Calls come from the actor task and must not block.
pub trait RenderSurface: Send + Sync {
    /// Navigates to a website.
    fn load(&self, request: &LoadRequest);

    /// Blanks the surface.
    fn unload(&self);

    /// Evaluates a script in the current page.
    fn inject(&self, script: &str);

    /// Lets the window receive mouse and keyboard input (browsing mode).
    fn set_interactive(&self, interactive: bool, bring_to_front: bool);

    fn set_visible(&self, visible: bool);

    fn set_opacity(&self, opacity: f64);

    /// Moves the window to cover the configured display.
    fn reposition(&self, placement: Placement);

    /// Shows or clears the error line in the menu. `modal` asks for a
    /// dialog because the user is looking at the page.
    fn show_error(&self, message: Option<&str>, modal: bool);
}

/// A call received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Load(LoadRequest),
    Unload,
    Inject(String),
    SetInteractive { interactive: bool, bring_to_front: bool },
    SetVisible(bool),
    SetOpacity(f64),
    Reposition(Placement),
    ShowError { message: Option<String>, modal: bool },
}

/// Surface that records every call. Used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns and clears the recorded calls.
    #[must_use]
    pub fn take(&self) -> Vec<SurfaceCall> { std::mem::take(&mut *self.calls.lock()) }

    #[must_use]
    pub fn calls(&self) -> Vec<SurfaceCall> { self.calls.lock().clone() }

    /// The most recent load request, if any.
    #[must_use]
    pub fn last_load(&self) -> Option<LoadRequest> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SurfaceCall::Load(request) => Some(request.clone()),
            _ => None,
        })
    }

    fn record(&self, call: SurfaceCall) {
        tracing::trace!(?call, "surface call");
        self.calls.lock().push(call);
    }
}

impl RenderSurface for RecordingSurface {
    fn load(&self, request: &LoadRequest) { self.record(SurfaceCall::Load(request.clone())); }

    fn unload(&self) { self.record(SurfaceCall::Unload); }

    fn inject(&self, script: &str) { self.record(SurfaceCall::Inject(script.to_string())); }

    fn set_interactive(&self, interactive: bool, bring_to_front: bool) {
        self.record(SurfaceCall::SetInteractive { interactive, bring_to_front });
    }

    fn set_visible(&self, visible: bool) { self.record(SurfaceCall::SetVisible(visible)); }

    fn set_opacity(&self, opacity: f64) { self.record(SurfaceCall::SetOpacity(opacity)); }

    fn reposition(&self, placement: Placement) { self.record(SurfaceCall::Reposition(placement)); }

    fn show_error(&self, message: Option<&str>, modal: bool) {
        self.record(SurfaceCall::ShowError {
            message: message.map(str::to_string),
            modal,
        });
    }
}
