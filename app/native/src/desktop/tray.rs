//! Menu bar icon and menu.
//!
//! The menu is rebuilt from each [`AppStatus`] the actor publishes. Website
//! items carry their cached icon; the current website shows a checkmark
//! instead.

use std::sync::Arc;

use tauri::image::Image;
use tauri::menu::{CheckMenuItem, IconMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu};
use tauri::tray::{TrayIcon, TrayIconBuilder};
use tauri::{AppHandle, Wry};
use uuid::Uuid;

use crate::app::{AppCommand, AppStatus, ControllerHandle, StatusListener};
use crate::cache::get_favicon_dir;
use crate::cli::output::truncate;
use crate::constants::APP_NAME;
use crate::websites::Website;
use crate::websites::metadata::cached_favicon;

const TRAY_ID: &str = "plash";
const RELOAD_ID: &str = "reload";
const NEXT_ID: &str = "next";
const PREVIOUS_ID: &str = "previous";
const RANDOM_ID: &str = "random";
const BROWSING_ID: &str = "browsing";
const ENABLED_ID: &str = "enabled";
const QUIT_ID: &str = "quit";
const WEBSITE_PREFIX: &str = "website:";

const MAX_TITLE_CHARS: usize = 40;

/// Maps a menu item ID to the command it triggers.
fn command_for(id: &str) -> Option<AppCommand> {
    match id {
        RELOAD_ID => Some(AppCommand::Reload),
        NEXT_ID => Some(AppCommand::Next),
        PREVIOUS_ID => Some(AppCommand::Previous),
        RANDOM_ID => Some(AppCommand::Random),
        BROWSING_ID => Some(AppCommand::ToggleBrowsingMode),
        ENABLED_ID => Some(AppCommand::ToggleEnabled),
        _ => id
            .strip_prefix(WEBSITE_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(|id| AppCommand::SetCurrent { id }),
    }
}

/// Creates the tray icon with a placeholder menu.
///
/// # Errors
///
/// Returns an error if the menu or the icon cannot be created.
pub fn create(app: &AppHandle, handle: ControllerHandle, visible: bool) -> tauri::Result<TrayIcon> {
    let menu = build_menu(app, &AppStatus::default())?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip(APP_NAME)
        .menu(&menu)
        .show_menu_on_left_click(true)
        .on_menu_event(move |app, event| {
            let id = event.id.as_ref();
            if id == QUIT_ID {
                tracing::info!("quit requested via menu bar");
                handle.shutdown();
                app.exit(0);
            } else if let Some(command) = command_for(id) {
                tracing::debug!(command = command.name(), "menu command");
                handle.dispatch(command);
            }
        });

    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone()).icon_as_template(true);
    }

    let tray = builder.build(app)?;
    tray.set_visible(visible)?;
    Ok(tray)
}

/// Status listener that rebuilds the tray menu.
pub fn status_listener(app: AppHandle, tray: TrayIcon) -> StatusListener {
    Arc::new(move |status: &AppStatus| {
        match build_menu(&app, status) {
            Ok(menu) => {
                if let Err(err) = tray.set_menu(Some(menu)) {
                    tracing::warn!(error = %err, "failed to update menu bar menu");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to build menu bar menu"),
        }

        let tooltip = status.current.as_ref().map_or_else(
            || APP_NAME.to_string(),
            |website| format!("{APP_NAME}: {}", website.display_title()),
        );
        let _ = tray.set_tooltip(Some(tooltip));
    })
}

fn build_menu(app: &AppHandle, status: &AppStatus) -> tauri::Result<Menu<Wry>> {
    let current_title = status
        .current
        .as_ref()
        .map_or_else(|| "No website".to_string(), |w| truncate(&w.display_title(), MAX_TITLE_CHARS));
    let current = MenuItem::new(app, current_title, false, None::<&str>)?;

    let error = status
        .error
        .as_deref()
        .map(|message| MenuItem::new(app, truncate(message, MAX_TITLE_CHARS * 2), false, None::<&str>))
        .transpose()?;

    let has_websites = !status.websites.is_empty();
    let can_switch = status.active && status.websites.len() > 1;

    let reload = MenuItem::with_id(app, RELOAD_ID, "Reload", status.active && status.current.is_some(), Some("CmdOrCtrl+R"))?;
    let next = MenuItem::with_id(app, NEXT_ID, "Next", can_switch, None::<&str>)?;
    let previous = MenuItem::with_id(app, PREVIOUS_ID, "Previous", can_switch, None::<&str>)?;
    let random = MenuItem::with_id(app, RANDOM_ID, "Random", status.websites.len() > 2 && status.active, None::<&str>)?;

    let website_items = status
        .websites
        .iter()
        .map(|website| website_item(app, website, status.active))
        .collect::<tauri::Result<Vec<_>>>()?;
    let website_refs: Vec<&dyn IsMenuItem<Wry>> = website_items.iter().map(|item| &**item).collect();
    let websites = Submenu::with_items(app, "Websites", has_websites, &website_refs)?;

    let browsing = CheckMenuItem::with_id(app, BROWSING_ID, "Browsing Mode", status.active, status.browsing, None::<&str>)?;
    let enabled = CheckMenuItem::with_id(app, ENABLED_ID, "Enabled", true, status.enabled, None::<&str>)?;
    let quit = MenuItem::with_id(app, QUIT_ID, format!("Quit {APP_NAME}"), true, Some("CmdOrCtrl+Q"))?;

    let separator = || PredefinedMenuItem::separator(app);
    let (sep1, sep2, sep3) = (separator()?, separator()?, separator()?);

    let mut items: Vec<&dyn IsMenuItem<Wry>> = vec![&current];
    if let Some(error) = &error {
        items.push(error);
    }
    items.extend([
        &sep1 as &dyn IsMenuItem<Wry>,
        &reload,
        &next,
        &previous,
        &random,
        &websites,
        &sep2,
        &browsing,
        &enabled,
        &sep3,
        &quit,
    ]);

    Menu::with_items(app, &items)
}

fn website_item(
    app: &AppHandle,
    website: &Website,
    enabled: bool,
) -> tauri::Result<Box<dyn IsMenuItem<Wry>>> {
    let id = format!("{WEBSITE_PREFIX}{}", website.id);
    let title = truncate(&website.display_title(), MAX_TITLE_CHARS);

    if website.is_current {
        return Ok(Box::new(CheckMenuItem::with_id(app, id, title, enabled, true, None::<&str>)?));
    }

    let icon = cached_favicon(&get_favicon_dir(), website.id).and_then(|path| {
        Image::from_path(&path)
            .inspect_err(|err| tracing::debug!(path = %path.display(), error = %err, "unreadable website icon"))
            .ok()
    });
    Ok(Box::new(IconMenuItem::with_id(app, id, title, enabled, icon, None::<&str>)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_for_fixed_items() {
        assert_eq!(command_for(RELOAD_ID), Some(AppCommand::Reload));
        assert_eq!(command_for(BROWSING_ID), Some(AppCommand::ToggleBrowsingMode));
        assert_eq!(command_for(ENABLED_ID), Some(AppCommand::ToggleEnabled));
        assert_eq!(command_for(QUIT_ID), None);
    }

    #[test]
    fn test_command_for_website_items() {
        let id = Uuid::now_v7();
        assert_eq!(command_for(&format!("{WEBSITE_PREFIX}{id}")), Some(AppCommand::SetCurrent { id }));
        assert_eq!(command_for("website:not-a-uuid"), None);
    }
}
