//! Power source monitor.
//!
//! Polls the batteries and reports [`SystemEvent::PowerSourceChanged`] when
//! the machine switches between battery and external power.

use std::fmt::Display;
use std::ops::ControlFlow;
use std::time::Duration;

use starship_battery::{Manager, State};

use super::{ChangeDetector, SystemEvent};
use crate::app::ControllerHandle;
use crate::platform::thread::spawn_poller;

const POWER_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Starts the power monitor thread.
pub fn start_monitor(handle: ControllerHandle) {
    let mut detector = ChangeDetector::new();

    spawn_poller("power", POWER_POLL_INTERVAL, move || {
        if handle.is_closed() {
            return ControlFlow::Break(());
        }

        if let Some(event) = power_transition(&mut detector, read_on_battery()) {
            handle.system_event(event);
        }
        ControlFlow::Continue(())
    });
}

/// Turns one battery reading into an event. Failed readings keep the last
/// known power source.
fn power_transition<E: Display>(
    detector: &mut ChangeDetector<bool>,
    reading: Result<bool, E>,
) -> Option<SystemEvent> {
    match reading {
        Ok(on_battery) => detector.observe(on_battery).map(|on_battery| {
            tracing::debug!(on_battery, "power source changed");
            SystemEvent::PowerSourceChanged { on_battery }
        }),
        Err(err) => {
            tracing::trace!(error = %err, "failed to read battery state");
            None
        }
    }
}

fn read_on_battery() -> Result<bool, starship_battery::Error> {
    let manager = Manager::new()?;
    let mut states = Vec::new();
    for battery in manager.batteries()? {
        states.push(battery?.state());
    }
    Ok(is_on_battery(states))
}

/// Whether any battery is discharging. Machines without a battery are
/// always on external power.
fn is_on_battery<I>(states: I) -> bool
where I: IntoIterator<Item = State> {
    states.into_iter().any(|state| matches!(state, State::Discharging | State::Empty))
}
