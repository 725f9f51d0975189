//! Screen lock monitor.
//!
//! On macOS the session dictionary is polled for `CGSSessionScreenIsLocked`.
//! Other platforms never report a lock.

use std::ops::ControlFlow;
use std::time::Duration;

use super::{ChangeDetector, SystemEvent};
use crate::app::ControllerHandle;
use crate::platform::thread::spawn_poller;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Starts the lock monitor thread.
pub fn start_monitor(handle: ControllerHandle) {
    let mut detector = ChangeDetector::new();

    spawn_poller("lock", LOCK_POLL_INTERVAL, move || {
        if handle.is_closed() {
            return ControlFlow::Break(());
        }

        if let Some(event) = lock_transition(&mut detector, platform::is_session_locked()) {
            handle.system_event(event);
        }
        ControlFlow::Continue(())
    });
}

/// Turns one lock reading into an event. Failed readings keep the last
/// known state.
fn lock_transition(
    detector: &mut ChangeDetector<bool>,
    reading: Result<bool, String>,
) -> Option<SystemEvent> {
    match reading {
        Ok(locked) => detector.observe(locked).map(|locked| {
            tracing::debug!(locked, "screen lock changed");
            lock_event(locked)
        }),
        Err(err) => {
            tracing::trace!(error = %err, "failed to read session lock state");
            None
        }
    }
}

const fn lock_event(locked: bool) -> SystemEvent {
    if locked { SystemEvent::ScreenLocked } else { SystemEvent::ScreenUnlocked }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::ffi::c_void;

    use core_foundation::base::TCFType;
    use core_foundation::string::CFString;
    use core_foundation_sys::base::{CFRelease, CFTypeRef};
    use core_foundation_sys::dictionary::{CFDictionaryGetValue, CFDictionaryRef};
    use core_foundation_sys::number::{CFBooleanGetValue, CFBooleanRef};

    const SCREEN_LOCKED_KEY: &str = "CGSSessionScreenIsLocked";

    pub(super) fn is_session_locked() -> Result<bool, String> {
        unsafe {
            let dict_ref = CGSessionCopyCurrentDictionary();
            if dict_ref.is_null() {
                return Err("CGSessionCopyCurrentDictionary returned null".to_string());
            }

            let key = CFString::new(SCREEN_LOCKED_KEY);
            let value = CFDictionaryGetValue(dict_ref, key.as_concrete_TypeRef().cast::<c_void>());
            let locked = !value.is_null() && CFBooleanGetValue(value as CFBooleanRef);

            CFRelease(dict_ref as CFTypeRef);
            Ok(locked)
        }
    }

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        fn CGSessionCopyCurrentDictionary() -> CFDictionaryRef;
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    #[allow(clippy::unnecessary_wraps)]
    pub(super) const fn is_session_locked() -> Result<bool, String> { Ok(false) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_event_mapping() {
        assert_eq!(lock_event(true), SystemEvent::ScreenLocked);
        assert_eq!(lock_event(false), SystemEvent::ScreenUnlocked);
    }

    #[test]
    fn test_lock_transitions_report_changes_only() {
        let mut detector = ChangeDetector::new();
        assert_eq!(lock_transition(&mut detector, Ok(false)), Some(SystemEvent::ScreenUnlocked));
        assert_eq!(lock_transition(&mut detector, Ok(false)), None);
        assert_eq!(lock_transition(&mut detector, Ok(true)), Some(SystemEvent::ScreenLocked));
        assert_eq!(lock_transition(&mut detector, Ok(true)), None);
    }

    #[test]
    fn test_failed_reading_keeps_last_state() {
        let mut detector = ChangeDetector::new();
        assert_eq!(lock_transition(&mut detector, Ok(true)), Some(SystemEvent::ScreenLocked));
        assert_eq!(lock_transition(&mut detector, Err("no session".to_string())), None);
        assert_eq!(lock_transition(&mut detector, Ok(true)), None);
        assert_eq!(lock_transition(&mut detector, Ok(false)), Some(SystemEvent::ScreenUnlocked));
    }
}
