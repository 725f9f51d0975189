//! Wallpaper window creation and native window tweaks.

use tauri::{
    AppHandle, LogicalPosition, LogicalSize, Monitor, Position, Size, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder,
};

use crate::constants::{APP_NAME, DESKTOP_WINDOW_LABEL};
use crate::system::display::DisplayInfo;

/// Page shown while nothing is loaded.
pub const IDLE_PAGE: &str = "index.html";

/// Where the window sits relative to other windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLayer {
    /// Behind desktop icons.
    Desktop,
    /// Above normal windows, for browsing mode.
    Front,
}

/// Builds the hidden wallpaper window.
///
/// # Errors
///
/// Returns an error if the webview cannot be created.
pub fn create_window<F>(
    app: &AppHandle,
    user_agent: Option<&str>,
    on_page_load: F,
) -> tauri::Result<WebviewWindow>
where
    F: Fn(WebviewWindow, tauri::webview::PageLoadPayload<'_>) + Send + Sync + 'static,
{
    let mut builder =
        WebviewWindowBuilder::new(app, DESKTOP_WINDOW_LABEL, WebviewUrl::App(IDLE_PAGE.into()))
            .title(APP_NAME)
            .decorations(false)
            .resizable(false)
            .skip_taskbar(true)
            .focused(false)
            .shadow(false)
            .visible(false)
            .on_page_load(on_page_load);

    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }

    let window = builder.build()?;
    set_layer(&window, WindowLayer::Desktop);
    Ok(window)
}

/// Converts a Tauri monitor to logical coordinates.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn display_info(monitor: &Monitor, primary: Option<&Monitor>) -> DisplayInfo {
    let scale = monitor.scale_factor().max(1.0);
    let position = monitor.position();
    let size = monitor.size();

    DisplayInfo {
        name: monitor.name().cloned(),
        x: (f64::from(position.x) / scale).round() as i32,
        y: (f64::from(position.y) / scale).round() as i32,
        width: (f64::from(size.width) / scale).round() as u32,
        height: (f64::from(size.height) / scale).round() as u32,
        is_primary: primary.is_some_and(|p| p.position() == position && p.name() == monitor.name()),
    }
}

/// Covers `display` with the window.
pub fn cover(window: &WebviewWindow, display: &DisplayInfo) {
    let _ = window.set_size(Size::Logical(LogicalSize {
        width: f64::from(display.width),
        height: f64::from(display.height),
    }));
    let _ = window.set_position(Position::Logical(LogicalPosition {
        x: f64::from(display.x),
        y: f64::from(display.y),
    }));
}

#[cfg(target_os = "macos")]
mod native {
    use objc::runtime::Object;
    use objc::{msg_send, sel, sel_impl};
    use tauri::WebviewWindow;

    use super::WindowLayer;

    const DESKTOP_WINDOW_LEVEL_KEY: i32 = 2;
    const FLOATING_WINDOW_LEVEL_KEY: i32 = 5;

    #[link(name = "CoreGraphics", kind = "framework")]
    unsafe extern "C" {
        fn CGWindowLevelForKey(key: i32) -> i32;
    }

    fn with_ns_window(window: &WebviewWindow, f: impl FnOnce(*mut Object)) {
        match window.ns_window() {
            Ok(ptr) if !ptr.is_null() => f(ptr.cast::<Object>()),
            Ok(_) => tracing::warn!("wallpaper window has no native handle"),
            Err(err) => tracing::warn!(error = %err, "failed to get native window"),
        }
    }

    pub(super) fn set_layer(window: &WebviewWindow, layer: WindowLayer) {
        let key = match layer {
            WindowLayer::Desktop => DESKTOP_WINDOW_LEVEL_KEY,
            WindowLayer::Front => FLOATING_WINDOW_LEVEL_KEY,
        };
        with_ns_window(window, |ns_window| unsafe {
            let level = i64::from(CGWindowLevelForKey(key));
            let _: () = msg_send![ns_window, setLevel: level];
        });
    }

    pub(super) fn set_alpha(window: &WebviewWindow, alpha: f64) {
        with_ns_window(window, |ns_window| unsafe {
            let _: () = msg_send![ns_window, setAlphaValue: alpha];
        });
    }
}

#[cfg(not(target_os = "macos"))]
mod native {
    use tauri::WebviewWindow;

    use super::WindowLayer;

    pub(super) fn set_layer(window: &WebviewWindow, layer: WindowLayer) {
        let _ = window.set_always_on_bottom(layer == WindowLayer::Desktop);
        let _ = window.set_always_on_top(layer == WindowLayer::Front);
    }

    pub(super) fn set_alpha(_window: &WebviewWindow, alpha: f64) {
        tracing::debug!(alpha, "window opacity is only supported on macOS");
    }
}

/// Moves the window to `layer`.
pub fn set_layer(window: &WebviewWindow, layer: WindowLayer) { native::set_layer(window, layer); }

/// Sets the window's opacity, `0.0..=1.0`.
pub fn set_alpha(window: &WebviewWindow, alpha: f64) { native::set_alpha(window, alpha.clamp(0.0, 1.0)); }
