//! Display and appearance readings from Tauri.

use tauri::{AppHandle, Manager, Theme};

use super::window::display_info;
use crate::constants::DESKTOP_WINDOW_LABEL;
use crate::system::display::{DisplayInfo, DisplayProbe};

/// Connected displays in logical points.
pub fn displays(app: &AppHandle) -> Vec<DisplayInfo> {
    let monitors = match app.available_monitors() {
        Ok(monitors) => monitors,
        Err(err) => {
            tracing::warn!(error = %err, "failed to list displays");
            return Vec::new();
        }
    };
    let primary = app.primary_monitor().ok().flatten();

    monitors.iter().map(|monitor| display_info(monitor, primary.as_ref())).collect()
}

/// [`DisplayProbe`] for the display monitor thread.
pub struct TauriDisplayProbe {
    app: AppHandle,
}

impl TauriDisplayProbe {
    #[must_use]
    pub const fn new(app: AppHandle) -> Self { Self { app } }
}

impl DisplayProbe for TauriDisplayProbe {
    fn displays(&self) -> Vec<DisplayInfo> { displays(&self.app) }

    fn dark_appearance(&self) -> Option<bool> {
        let window = self.app.get_webview_window(DESKTOP_WINDOW_LABEL)?;
        window.theme().ok().map(|theme| theme == Theme::Dark)
    }
}
