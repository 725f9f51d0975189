//! Display and appearance monitor.
//!
//! Display enumeration depends on the windowing toolkit, so it is
//! abstracted behind [`DisplayProbe`]. The monitor polls the probe and
//! reports screen-configuration and light/dark changes.

use std::ops::ControlFlow;
use std::time::Duration;

use super::{ChangeDetector, SystemEvent};
use crate::app::ControllerHandle;
use crate::config::get_config;
use crate::platform::thread::spawn_poller;
use crate::websites::ScreenSize;

const DISPLAY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A connected display, in logical points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub name: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

impl DisplayInfo {
    #[must_use]
    pub const fn size(&self) -> ScreenSize { ScreenSize::new(self.width, self.height) }
}

/// Source of display and appearance information.
pub trait DisplayProbe: Send + 'static {
    /// Connected displays in system order.
    fn displays(&self) -> Vec<DisplayInfo>;

    /// Whether the system uses the dark appearance. `None` if unknown.
    fn dark_appearance(&self) -> Option<bool>;
}

/// Picks the display the wallpaper goes on: the 1-based `display` index if
/// it exists, otherwise the primary display, otherwise the first one.
#[must_use]
pub fn target_display(displays: &[DisplayInfo], display: Option<u32>) -> Option<&DisplayInfo> {
    display
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| displays.get(index))
        .or_else(|| displays.iter().find(|d| d.is_primary))
        .or_else(|| displays.first())
}

/// Diffs successive probe readings.
pub struct DisplayMonitor<P> {
    probe: P,
    layout: ChangeDetector<(Vec<DisplayInfo>, Option<u32>)>,
    appearance: ChangeDetector<bool>,
}

impl<P: DisplayProbe> DisplayMonitor<P> {
    #[must_use]
    pub const fn new(probe: P) -> Self {
        Self {
            probe,
            layout: ChangeDetector::new(),
            appearance: ChangeDetector::new(),
        }
    }

    /// Reads the probe and returns the events for whatever changed.
    pub fn poll(&mut self, display: Option<u32>) -> Vec<SystemEvent> {
        let mut events = Vec::new();

        let displays = self.probe.displays();
        if let Some((displays, display)) = self.layout.observe((displays, display)) {
            let screen = target_display(&displays, display).map(DisplayInfo::size);
            events.push(SystemEvent::ScreensChanged { screen });
        }

        if let Some(dark) = self.probe.dark_appearance().and_then(|d| self.appearance.observe(d)) {
            events.push(SystemEvent::AppearanceChanged { dark });
        }

        events
    }
}

/// Starts the display monitor thread.
pub fn start_monitor<P: DisplayProbe>(handle: ControllerHandle, probe: P) {
    let mut monitor = DisplayMonitor::new(probe);

    spawn_poller("display", DISPLAY_POLL_INTERVAL, move || {
        if handle.is_closed() {
            return ControlFlow::Break(());
        }

        for event in monitor.poll(get_config().display) {
            tracing::debug!(?event, "display change");
            handle.system_event(event);
        }
        ControlFlow::Continue(())
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeProbe {
        displays: Arc<Mutex<Vec<DisplayInfo>>>,
        dark: Arc<Mutex<Option<bool>>>,
    }

    impl DisplayProbe for FakeProbe {
        fn displays(&self) -> Vec<DisplayInfo> { self.displays.lock().clone() }

        fn dark_appearance(&self) -> Option<bool> { *self.dark.lock() }
    }

    fn display(width: u32, height: u32, is_primary: bool) -> DisplayInfo {
        DisplayInfo {
            name: None,
            x: 0,
            y: 0,
            width,
            height,
            is_primary,
        }
    }

    #[test]
    fn test_target_display_prefers_configured_index() {
        let displays = vec![display(1440, 900, true), display(2560, 1440, false)];
        assert_eq!(target_display(&displays, Some(2)).unwrap().width, 2560);
        assert_eq!(target_display(&displays, None).unwrap().width, 1440);
    }

    #[test]
    fn test_target_display_falls_back_for_missing_index() {
        let displays = vec![display(2560, 1440, false), display(1440, 900, true)];
        assert_eq!(target_display(&displays, Some(5)).unwrap().width, 1440);
        assert_eq!(target_display(&displays, Some(0)).unwrap().width, 1440);
        assert!(target_display(&[], None).is_none());
    }

    #[test]
    fn test_poll_reports_initial_state_then_changes_only() {
        let probe = FakeProbe::default();
        *probe.displays.lock() = vec![display(1440, 900, true)];
        *probe.dark.lock() = Some(false);
        let mut monitor = DisplayMonitor::new(probe.clone());

        assert_eq!(monitor.poll(None), vec![
            SystemEvent::ScreensChanged { screen: Some(ScreenSize::new(1440, 900)) },
            SystemEvent::AppearanceChanged { dark: false },
        ]);
        assert!(monitor.poll(None).is_empty());

        *probe.dark.lock() = Some(true);
        assert_eq!(monitor.poll(None), vec![SystemEvent::AppearanceChanged { dark: true }]);

        probe.displays.lock().push(display(2560, 1440, false));
        assert_eq!(monitor.poll(None), vec![SystemEvent::ScreensChanged {
            screen: Some(ScreenSize::new(1440, 900)),
        }]);
    }

    #[test]
    fn test_poll_reports_configured_display_change() {
        let probe = FakeProbe::default();
        *probe.displays.lock() = vec![display(1440, 900, true), display(2560, 1440, false)];
        let mut monitor = DisplayMonitor::new(probe);

        monitor.poll(None);
        assert_eq!(monitor.poll(Some(2)), vec![SystemEvent::ScreensChanged {
            screen: Some(ScreenSize::new(2560, 1440)),
        }]);
    }

    #[test]
    fn test_unknown_appearance_is_not_reported() {
        let mut monitor = DisplayMonitor::new(FakeProbe::default());
        assert_eq!(monitor.poll(None), vec![SystemEvent::ScreensChanged { screen: None }]);
    }
}
