//! Sleep/wake detection.
//!
//! The monotonic clock stops while the machine sleeps and the wall clock
//! does not. A poll whose wall-clock gap is much larger than its monotonic
//! gap means the machine slept in between.

use std::ops::ControlFlow;
use std::time::{Duration, Instant, SystemTime};

use super::SystemEvent;
use crate::app::ControllerHandle;
use crate::platform::thread::spawn_poller;

const WAKE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Minimum unexplained wall-clock gap treated as a sleep.
const SLEEP_THRESHOLD: Duration = Duration::from_secs(15);

/// Starts the wake monitor thread.
pub fn start_monitor(handle: ControllerHandle) {
    let mut wall = SystemTime::now();
    let mut mono = Instant::now();

    spawn_poller("wake", WAKE_POLL_INTERVAL, move || {
        if handle.is_closed() {
            return ControlFlow::Break(());
        }

        let now_wall = SystemTime::now();
        let now_mono = Instant::now();
        let wall_elapsed = now_wall.duration_since(wall).unwrap_or_default();
        let mono_elapsed = now_mono.duration_since(mono);

        if slept(wall_elapsed, mono_elapsed) {
            tracing::info!(?wall_elapsed, ?mono_elapsed, "system woke from sleep");
            handle.system_event(SystemEvent::DidWake);
        }

        wall = now_wall;
        mono = now_mono;
        ControlFlow::Continue(())
    });
}

fn slept(wall_elapsed: Duration, mono_elapsed: Duration) -> bool {
    wall_elapsed.saturating_sub(mono_elapsed) >= SLEEP_THRESHOLD
}
