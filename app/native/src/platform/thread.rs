//! Background threads for the system monitors and the IPC server.

use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

/// Spawns a detached thread named `plash-{name}`.
///
/// Spawn failures are logged rather than propagated; every caller treats its
/// background thread as best-effort.
pub fn spawn_named_thread<F>(name: &str, task: F)
where F: FnOnce() + Send + 'static {
    let thread_name = format!("plash-{name}");

    if let Err(err) = thread::Builder::new().name(thread_name.clone()).spawn(task) {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    }
}

/// Runs `poll` every `interval` on a named thread until it returns
/// [`ControlFlow::Break`].
pub fn spawn_poller<F>(name: &str, interval: Duration, mut poll: F)
where F: FnMut() -> ControlFlow<()> + Send + 'static {
    let name = name.to_string();
    spawn_named_thread(&name.clone(), move || {
        while poll().is_continue() {
            thread::sleep(interval);
        }
        tracing::debug!(poller = %name, "poller stopped");
    });
}
