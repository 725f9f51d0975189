//! System monitors: power source, screen lock, sleep/wake and displays.
//!
//! Each monitor polls on its own named thread and reports changes as
//! [`SystemEvent`]s through the controller handle.

pub mod display;
pub mod lock;
pub mod power;
pub mod wake;

use crate::app::ControllerHandle;
use crate::websites::ScreenSize;

/// A change in the environment the wallpaper runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    /// Switched between battery and external power.
    PowerSourceChanged { on_battery: bool },
    ScreenLocked,
    ScreenUnlocked,
    /// The machine woke from sleep.
    DidWake,
    /// Displays were added, removed or resized. Carries the size of the
    /// display the wallpaper is on.
    ScreensChanged { screen: Option<ScreenSize> },
    /// The system switched between light and dark appearance.
    AppearanceChanged { dark: bool },
}

/// Starts the power, lock and wake monitors.
///
/// The display monitor needs a [`display::DisplayProbe`] and is started by
/// the desktop shell.
pub fn start_monitors(handle: &ControllerHandle) {
    power::start_monitor(handle.clone());
    lock::start_monitor(handle.clone());
    wake::start_monitor(handle.clone());
}

/// Remembers the last polled value and reports when it changes.
///
/// The first observation is always reported.
#[derive(Debug, Default)]
pub(crate) struct ChangeDetector<T> {
    last: Option<T>,
}

impl<T: PartialEq + Clone> ChangeDetector<T> {
    pub(crate) const fn new() -> Self { Self { last: None } }

    /// Returns the value if it differs from the previous observation.
    pub(crate) fn observe(&mut self, value: T) -> Option<T> {
        if self.last.as_ref() == Some(&value) {
            return None;
        }
        self.last = Some(value.clone());
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_detector_reports_first_and_changes_only() {
        let mut detector = ChangeDetector::new();
        assert_eq!(detector.observe(false), Some(false));
        assert_eq!(detector.observe(false), None);
        assert_eq!(detector.observe(true), Some(true));
        assert_eq!(detector.observe(true), None);
        assert_eq!(detector.observe(false), Some(false));
    }
}
