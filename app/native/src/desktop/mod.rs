//! Desktop shell.
//!
//! Hosts the wallpaper webview and the menu bar icon, and wires the app
//! actor to the system monitors, the IPC socket, the config watcher and
//! `plash://` URLs.

mod probe;
mod surface;
mod tray;
mod window;

use std::sync::Arc;

use tauri::{App, AppHandle, Manager, RunEvent};

use crate::app::{AppActor, Controller, ControllerHandle, EffectExecutor};
use crate::config;
use crate::constants::URL_SCHEME;
use crate::error::PlashError;
use crate::ipc::{self, IpcServer};
use crate::system::{self, display};
use crate::url_scheme::parse_command_url;
use crate::websites::{StoreSnapshot, WebsiteStore};

/// Runs the desktop application until the user quits.
///
/// # Errors
///
/// Returns an error if Tauri fails to start.
pub fn run() -> Result<(), PlashError> {
    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, args, _cwd| {
            tracing::debug!(?args, "second instance launched");
            handle_urls(app, args.iter().map(String::as_str));
        }))
        .setup(setup)
        .build(tauri::generate_context!())
        .map_err(|err| PlashError::CommandError(format!("Failed to start Plash: {err}")))?;

    app.run(|app, event| match event {
        #[cfg(target_os = "macos")]
        RunEvent::Opened { urls } => {
            handle_urls(app, urls.iter().map(tauri::Url::as_str));
        }
        RunEvent::Exit => {
            if let Some(handle) = app.try_state::<ControllerHandle>() {
                handle.shutdown();
            }
            if let Some(server) = app.try_state::<IpcServer>() {
                server.stop();
            }
        }
        _ => {}
    });

    Ok(())
}

fn setup(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(target_os = "macos")]
    app.set_activation_policy(tauri::ActivationPolicy::Accessory);

    let app_handle = app.handle().clone();
    let config = config::init();

    let store = WebsiteStore::default_location();
    let snapshot = store.load().unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to read website store, starting empty");
        StoreSnapshot::default()
    });

    let (handle, receiver) = ControllerHandle::channel();
    app.manage(handle.clone());

    let tracker = surface::PageTracker::new();
    let window = {
        let tracker = Arc::clone(&tracker);
        let handle = handle.clone();
        window::create_window(&app_handle, config.user_agent.as_deref(), move |webview, payload| {
            tracker.on_page_load(&webview, &payload, &handle);
        })?
    };

    let tray = tray::create(&app_handle, handle.clone(), !config.hide_menu_bar_icon)?;
    let surface = surface::TauriSurface::new(app_handle.clone(), window, tracker, handle.clone());

    let executor = EffectExecutor::new(Arc::new(surface), store, handle.clone())
        .with_status_listener(tray::status_listener(app_handle.clone(), tray.clone()));
    let controller = Controller::new(snapshot, config);
    tauri::async_runtime::spawn(AppActor::new(controller, executor, receiver).run());

    system::start_monitors(&handle);
    display::start_monitor(handle.clone(), probe::TauriDisplayProbe::new(app_handle.clone()));

    {
        let handle = handle.clone();
        config::watch_config_file(move |config| {
            if let Err(err) = tray.set_visible(!config.hide_menu_bar_icon) {
                tracing::warn!(error = %err, "failed to update menu bar icon visibility");
            }
            handle.config_reloaded(config);
        });
    }

    match ipc::start_server(handle) {
        Ok(server) => {
            tracing::info!(path = %server.path().display(), "IPC server listening");
            app.manage(server);
        }
        Err(err) => tracing::error!(error = %err, "failed to start IPC server"),
    }

    let launch_args: Vec<String> = std::env::args().skip(1).collect();
    handle_urls(&app_handle, launch_args.iter().map(String::as_str));

    tracing::info!("Plash started");
    Ok(())
}

/// Dispatches every `plash://` URL among `args`.
fn handle_urls<'a>(app: &AppHandle, args: impl Iterator<Item = &'a str>) {
    let Some(handle) = app.try_state::<ControllerHandle>() else {
        return;
    };

    let prefix = format!("{URL_SCHEME}:");
    for arg in args.filter(|arg| arg.to_lowercase().starts_with(&prefix)) {
        match parse_command_url(arg) {
            Ok(command) => {
                tracing::info!(url = arg, command = command.name(), "handling URL");
                handle.dispatch(command);
            }
            Err(err) => tracing::warn!(url = arg, error = %err, "ignoring invalid URL"),
        }
    }
}
