//! The render coordinator.
//!
//! `Controller` owns the website collection and the render state. Every
//! handler mutates state and returns the effects needed to bring the outside
//! world in line. It performs no I/O, so every transition can be tested
//! directly.

use url::Url;
use uuid::Uuid;

use super::effects::Effect;
use super::messages::{AppCommand, AppQuery, AppStatus, CommandResult, QueryResult, WebsitePatch};
use crate::config::PlashConfig;
use crate::error::PlashError;
use crate::renderer::customization::{InjectionContext, build_injection, invert_script};
use crate::renderer::{
    Interaction, LOAD_TIMEOUT, LoadPhase, LoadRequest, NavigationError, Placement, RenderState,
};
use crate::system::SystemEvent;
use crate::websites::url::{apply_placeholders, resolve_local_file};
use crate::websites::{
    InvertColors, StoreSnapshot, Website, WebsiteCollection, parse_website_url,
};

/// Pure state machine behind the app actor.
pub struct Controller {
    websites: WebsiteCollection,
    render: RenderState,
    config: PlashConfig,
}

impl Controller {
    /// Creates a controller from persisted state and settings.
    #[must_use]
    pub fn new(snapshot: StoreSnapshot, config: PlashConfig) -> Self {
        let render = RenderState {
            enabled: snapshot.is_enabled,
            reload_interval: config.reload_interval(),
            deactivate_on_battery: config.deactivate_on_battery,
            ..RenderState::default()
        };

        Self {
            websites: WebsiteCollection::new(snapshot.websites),
            render,
            config,
        }
    }

    #[must_use]
    pub const fn websites(&self) -> &WebsiteCollection { &self.websites }

    #[must_use]
    pub const fn render(&self) -> &RenderState { &self.render }

    #[must_use]
    pub const fn config(&self) -> &PlashConfig { &self.config }

    /// Effects that bring a fresh surface into its initial state.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = vec![
            Effect::SetOpacity(self.config.opacity()),
            Effect::Reposition(self.placement()),
            Effect::SetVisible(self.render.is_active()),
        ];
        for website in self.websites.all().iter() {
            effects.push(self.fetch_metadata(website));
        }
        self.load_current(&mut effects);
        self.notify(&mut effects);
        effects
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Runs a user command.
    pub fn handle_command(&mut self, command: AppCommand) -> (CommandResult, Vec<Effect>) {
        let mut effects = Vec::new();

        let result = match command {
            AppCommand::Add { url, title } => self.add(&url, title, &mut effects),
            AppCommand::Remove { id } => self.remove(id, &mut effects),
            AppCommand::SetCurrent { id } => self.set_current(id, &mut effects),
            AppCommand::Next => Ok(self.navigate(WebsiteCollection::next, &mut effects)),
            AppCommand::Previous => Ok(self.navigate(WebsiteCollection::previous, &mut effects)),
            AppCommand::Random => Ok(self.navigate(WebsiteCollection::random, &mut effects)),
            AppCommand::Reload => {
                self.load_current(&mut effects);
                Ok(self.websites.current())
            }
            AppCommand::ToggleBrowsingMode => {
                let browsing = !self.render.is_browsing();
                self.set_browsing(browsing, &mut effects)
            }
            AppCommand::SetBrowsingMode(browsing) => self.set_browsing(browsing, &mut effects),
            AppCommand::SetEnabled(enabled) => {
                self.set_enabled(enabled, &mut effects);
                Ok(self.websites.current())
            }
            AppCommand::ToggleEnabled => {
                self.set_enabled(!self.render.enabled, &mut effects);
                Ok(self.websites.current())
            }
            AppCommand::Update { id, patch } => self.update(id, patch, &mut effects),
            AppCommand::Move { id, index } => {
                if self.websites.move_to(id, index) {
                    self.persist(&mut effects);
                    Ok(self.websites.get(id))
                } else {
                    Err(not_found(id))
                }
            }
        };

        self.notify(&mut effects);
        (result, effects)
    }

    fn add(&mut self, input: &str, title: Option<String>, effects: &mut Vec<Effect>) -> CommandResult {
        let url = parse_website_url(input)?;
        let website = Website::new(url, title.unwrap_or_default());
        let id = self.websites.add(website.clone());

        tracing::info!(%id, url = %website.url, "added website");

        effects.push(self.fetch_metadata(&website));
        self.persist(effects);
        self.load_current(effects);
        Ok(self.websites.get(id))
    }

    fn remove(&mut self, id: Uuid, effects: &mut Vec<Effect>) -> CommandResult {
        let was_current = self.websites.current_id() == Some(id);
        let removed = self.websites.remove(id).ok_or_else(|| not_found(id))?;

        tracing::info!(%id, "removed website");
        effects.push(Effect::ForgetFavicon(id));
        self.persist(effects);
        if was_current {
            self.load_current(effects);
        }
        Ok(Some(removed))
    }

    fn set_current(&mut self, id: Uuid, effects: &mut Vec<Effect>) -> CommandResult {
        let changed = self.websites.current_id() != Some(id);
        if !self.websites.set_current(id) {
            return Err(not_found(id));
        }
        if changed {
            self.persist(effects);
            self.load_current(effects);
        }
        Ok(self.websites.current())
    }

    fn navigate<F>(&mut self, step: F, effects: &mut Vec<Effect>) -> Option<Website>
    where F: FnOnce(&mut WebsiteCollection) -> Option<Uuid> {
        let before = self.websites.current_id();
        let after = step(&mut self.websites);
        if after.is_some() && after != before {
            self.persist(effects);
            self.load_current(effects);
        }
        self.websites.current()
    }

    fn update(&mut self, id: Uuid, patch: WebsitePatch, effects: &mut Vec<Effect>) -> CommandResult {
        if self.websites.get(id).is_none() {
            return Err(not_found(id));
        }

        let url = patch.url.as_deref().map(parse_website_url).transpose()?;
        let reload = patch.affects_rendering() && self.websites.current_id() == Some(id);
        let moved = url.as_ref().is_some_and(|url| self.websites.get(id).is_some_and(|w| &w.url != url));

        self.websites.update(id, |website| apply_patch(website, patch, url));
        if moved && let Some(website) = self.websites.get(id) {
            effects.push(Effect::ForgetFavicon(id));
            effects.push(self.fetch_metadata(&website));
        }
        self.persist(effects);
        if reload {
            self.load_current(effects);
        }
        Ok(self.websites.get(id))
    }

    fn set_browsing(&mut self, browsing: bool, effects: &mut Vec<Effect>) -> CommandResult {
        if browsing == self.render.is_browsing() {
            return Ok(self.websites.current());
        }

        if browsing {
            if !self.render.is_active() {
                return Err(PlashError::CommandError(
                    "Browsing mode is unavailable while Plash is deactivated".to_string(),
                ));
            }
            self.render.interaction = Interaction::Browsing;
            self.stop_timer(effects);
            effects.push(Effect::SetInteractive {
                interactive: true,
                bring_to_front: self.config.bring_browsing_mode_to_front,
            });
        } else {
            self.render.interaction = Interaction::Passive;
            effects.push(Effect::SetInteractive { interactive: false, bring_to_front: false });
            self.maybe_arm_timer(effects);
        }

        tracing::debug!(browsing, "browsing mode changed");
        Ok(self.websites.current())
    }

    fn set_enabled(&mut self, enabled: bool, effects: &mut Vec<Effect>) {
        if self.render.enabled == enabled {
            return;
        }
        let was_active = self.render.is_active();
        self.render.enabled = enabled;
        tracing::info!(enabled, "toggled wallpaper");
        self.persist(effects);
        self.apply_activation(was_active, effects);
    }

    // ========================================================================
    // System events
    // ========================================================================

    /// Reacts to a change in the environment.
    pub fn handle_system(&mut self, event: SystemEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            SystemEvent::PowerSourceChanged { on_battery } => {
                if self.render.on_battery != on_battery {
                    let was_active = self.render.is_active();
                    self.render.on_battery = on_battery;
                    self.apply_activation(was_active, &mut effects);
                }
            }
            SystemEvent::ScreenLocked => {
                self.render.locked = true;
                self.stop_timer(&mut effects);
            }
            SystemEvent::ScreenUnlocked => {
                self.render.locked = false;
                self.maybe_arm_timer(&mut effects);
            }
            SystemEvent::DidWake => self.load_current(&mut effects),
            SystemEvent::ScreensChanged { screen } => {
                self.render.screen = screen;
                effects.push(Effect::Reposition(self.placement()));
                self.load_current(&mut effects);
            }
            SystemEvent::AppearanceChanged { dark } => {
                if self.render.dark_appearance != dark {
                    self.render.dark_appearance = dark;
                    self.reapply_inversion(&mut effects);
                }
            }
        }

        self.notify(&mut effects);
        effects
    }

    // ========================================================================
    // Load lifecycle
    // ========================================================================

    /// The preflight check for `generation` passed; navigate the surface.
    pub fn on_preflight_passed(&mut self, generation: u64) -> Vec<Effect> {
        if !self.render.is_current_load(generation) {
            tracing::trace!(generation, "ignoring stale preflight");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let Some(website) = self.websites.current() {
            let url = apply_placeholders(&website.url, self.render.screen);
            self.push_load(generation, &website, url, &mut effects);
        }
        effects
    }

    /// The surface finished loading.
    pub fn on_load_finished(&mut self, generation: u64) -> Vec<Effect> {
        let had_error = self.render.last_error.is_some();
        if !self.render.finish_load(generation) {
            tracing::trace!(generation, "ignoring stale load outcome");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if had_error {
            effects.push(Effect::ShowError { message: None, modal: false });
        }
        self.reapply_inversion(&mut effects);
        self.maybe_arm_timer(&mut effects);
        self.notify(&mut effects);
        effects
    }

    /// The surface or the preflight check failed.
    pub fn on_load_failed(&mut self, generation: u64, error: NavigationError) -> Vec<Effect> {
        if error.is_ignorable() {
            tracing::debug!(generation, %error, "ignoring navigation error");
            return self.on_load_finished(generation);
        }

        let mut effects = Vec::new();
        if self.fail(generation, error, &mut effects) {
            self.notify(&mut effects);
        }
        effects
    }

    /// The reload timer fired.
    pub fn on_reload_tick(&mut self, generation: u64) -> Vec<Effect> {
        if !self.render.is_current_timer(generation) {
            tracing::trace!(generation, "ignoring stale reload tick");
            return Vec::new();
        }

        self.render.timer_armed = false;
        tracing::debug!("reloading on timer");

        let mut effects = Vec::new();
        self.load_current(&mut effects);
        effects
    }

    /// A title fetch completed.
    pub fn on_title_fetched(&mut self, id: Uuid, title: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.websites.set_title_if_empty(id, title) {
            tracing::debug!(%id, title, "applied fetched title");
            self.persist(&mut effects);
            self.notify(&mut effects);
        }
        effects
    }

    /// A website's icon is now cached; the menu needs redrawing.
    pub fn on_favicon_fetched(&self, id: Uuid) -> Vec<Effect> {
        if self.websites.get(id).is_none() {
            return Vec::new();
        }
        vec![Effect::StatusChanged(Box::new(self.status()))]
    }

    /// Applies a new configuration.
    pub fn on_config_reloaded(&mut self, config: PlashConfig) -> Vec<Effect> {
        let mut effects = Vec::new();
        let old = std::mem::replace(&mut self.config, config);

        if (old.opacity() - self.config.opacity()).abs() > f64::EPSILON {
            effects.push(Effect::SetOpacity(self.config.opacity()));
        }

        if old.display != self.config.display || old.show_on_all_spaces != self.config.show_on_all_spaces {
            effects.push(Effect::Reposition(self.placement()));
        }

        let was_active = self.render.is_active();
        self.render.deactivate_on_battery = self.config.deactivate_on_battery;
        let activation_changed = was_active != self.render.is_active();

        let interval = self.config.reload_interval();
        if interval != self.render.reload_interval {
            self.render.reload_interval = interval;
            self.stop_timer(&mut effects);
            self.maybe_arm_timer(&mut effects);
        }

        if activation_changed {
            self.apply_activation(was_active, &mut effects);
        } else if old.mute_audio != self.config.mute_audio || old.user_agent() != self.config.user_agent() {
            self.load_current(&mut effects);
        }

        self.notify(&mut effects);
        effects
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Answers a read-only query.
    #[must_use]
    pub fn query(&self, query: &AppQuery) -> QueryResult {
        match query {
            AppQuery::Websites { filter } => QueryResult::Websites(
                filter.as_deref().map_or_else(|| self.websites.all(), |f| self.websites.filter(f)),
            ),
            AppQuery::Current => QueryResult::Current(self.websites.current()),
            AppQuery::Status => QueryResult::Status(Box::new(self.status())),
        }
    }

    #[must_use]
    pub fn status(&self) -> AppStatus {
        AppStatus {
            enabled: self.render.enabled,
            active: self.render.is_active(),
            browsing: self.render.is_browsing(),
            phase: self.render.phase,
            error: self.render.last_error.as_ref().map(ToString::to_string),
            current: self.websites.current(),
            websites: self.websites.all(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            websites: self.websites.all(),
            is_enabled: self.render.enabled,
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Starts loading the current website, or blanks the surface if there is
    /// none.
    fn load_current(&mut self, effects: &mut Vec<Effect>) {
        if !self.render.is_active() {
            return;
        }

        self.stop_timer(effects);

        let Some(website) = self.websites.current() else {
            self.render.reset_load();
            effects.push(Effect::Unload);
            return;
        };

        let generation = self.render.begin_load();

        if website.is_local() {
            match resolve_local_file(&website.url) {
                Ok(path) => match Url::from_file_path(&path) {
                    Ok(url) => self.push_load(generation, &website, url, effects),
                    Err(()) => {
                        let error = NavigationError::LocalFile(path.display().to_string());
                        self.fail(generation, error, effects);
                    }
                },
                Err(err) => {
                    self.fail(generation, err.into(), effects);
                }
            }
            return;
        }

        effects.push(Effect::Preflight {
            generation,
            url: apply_placeholders(&website.url, self.render.screen),
            allow_self_signed: website.allow_self_signed_certificate,
            user_agent: self.config.user_agent().map(str::to_string),
        });
    }

    /// Records a real navigation error. Returns `false` for stale
    /// generations.
    fn fail(&mut self, generation: u64, error: NavigationError, effects: &mut Vec<Effect>) -> bool {
        let message = error.to_string();
        if !self.render.fail_load(generation, error) {
            tracing::trace!(generation, "ignoring stale load failure");
            return false;
        }

        tracing::warn!(generation, error = %message, "failed to load website");
        effects.push(Effect::ShowError {
            message: Some(message),
            modal: self.render.is_browsing(),
        });
        self.maybe_arm_timer(effects);
        true
    }

    fn fetch_metadata(&self, website: &Website) -> Effect {
        Effect::FetchMetadata {
            id: website.id,
            url: website.url.clone(),
            allow_self_signed: website.allow_self_signed_certificate,
            user_agent: self.config.user_agent().map(str::to_string),
            want_title: website.needs_title(),
        }
    }

    /// Navigates the surface and arms the watchdog for `generation`.
    fn push_load(&mut self, generation: u64, website: &Website, url: Url, effects: &mut Vec<Effect>) {
        self.render.page_dark_appearance = self.render.dark_appearance;
        effects.push(Effect::Load(self.load_request(generation, website, url)));
        effects.push(Effect::ArmLoadTimeout { generation, timeout: LOAD_TIMEOUT });
    }

    fn load_request(&self, generation: u64, website: &Website, url: Url) -> LoadRequest {
        let ctx = InjectionContext {
            dark_appearance: self.render.dark_appearance,
            mute_audio: self.config.mute_audio,
        };

        LoadRequest {
            generation,
            website_id: website.id,
            url,
            allow_self_signed: website.allow_self_signed_certificate,
            mute_audio: self.config.mute_audio,
            user_agent: self.config.user_agent().map(str::to_string),
            script: build_injection(website, ctx),
        }
    }

    /// Shows or hides the surface after the active state may have changed.
    fn apply_activation(&mut self, was_active: bool, effects: &mut Vec<Effect>) {
        let active = self.render.is_active();
        if active == was_active {
            return;
        }

        if active {
            effects.push(Effect::SetVisible(true));
            self.load_current(effects);
        } else {
            self.stop_timer(effects);
            if self.render.is_browsing() {
                self.render.interaction = Interaction::Passive;
                effects.push(Effect::SetInteractive { interactive: false, bring_to_front: false });
            }
            self.render.reset_load();
            effects.push(Effect::Unload);
            effects.push(Effect::SetVisible(false));
        }
    }

    /// Brings a loaded page's inversion in line with the system appearance.
    /// A change that arrives mid-load is applied once the load finishes.
    fn reapply_inversion(&mut self, effects: &mut Vec<Effect>) {
        let dark = self.render.dark_appearance;
        if self.render.phase != LoadPhase::Loaded || self.render.page_dark_appearance == dark {
            return;
        }

        if let Some(website) = self.websites.current()
            && website.invert_colors == InvertColors::DarkMode
        {
            effects.push(Effect::Inject(invert_script(dark)));
        }
        self.render.page_dark_appearance = dark;
    }

    fn maybe_arm_timer(&mut self, effects: &mut Vec<Effect>) {
        if self.render.wants_timer() {
            let generation = self.render.arm_timer();
            effects.push(Effect::ArmTimer {
                interval: self.render.reload_interval,
                generation,
            });
        }
    }

    fn stop_timer(&mut self, effects: &mut Vec<Effect>) {
        if self.render.timer_armed {
            self.render.disarm_timer();
            effects.push(Effect::DisarmTimer);
        }
    }

    fn persist(&self, effects: &mut Vec<Effect>) { effects.push(Effect::Persist(self.snapshot())); }

    fn notify(&self, effects: &mut Vec<Effect>) {
        if !effects.is_empty() {
            effects.push(Effect::StatusChanged(Box::new(self.status())));
        }
    }

    const fn placement(&self) -> Placement {
        Placement {
            display: self.config.display,
            show_on_all_spaces: self.config.show_on_all_spaces,
        }
    }
}

fn apply_patch(website: &mut Website, patch: WebsitePatch, url: Option<Url>) {
    if let Some(title) = patch.title {
        website.title = title.trim().to_string();
    }
    if let Some(url) = url {
        website.url = url;
    }
    if let Some(invert_colors) = patch.invert_colors {
        website.invert_colors = invert_colors;
    }
    if let Some(use_print_styles) = patch.use_print_styles {
        website.use_print_styles = use_print_styles;
    }
    if let Some(css) = patch.css {
        website.css = css;
    }
    if let Some(javascript) = patch.javascript {
        website.javascript = javascript;
    }
    if let Some(allow) = patch.allow_self_signed_certificate {
        website.allow_self_signed_certificate = allow;
    }
}

fn not_found(id: Uuid) -> PlashError { PlashError::WebsiteNotFound(id.to_string()) }

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::websites::ScreenSize;

    fn site(name: &str) -> Website {
        Website::new(Url::parse(&format!("https://{name}.example.com")).unwrap(), name)
    }

    fn config(interval: u64) -> PlashConfig {
        PlashConfig { reload_interval: interval, ..PlashConfig::default() }
    }

    fn controller_with(sites: Vec<Website>, interval: u64) -> Controller {
        Controller::new(StoreSnapshot { websites: sites, is_enabled: true }, config(interval))
    }

    fn preflight_generation(effects: &[Effect]) -> Option<u64> {
        effects.iter().find_map(|e| match e {
            Effect::Preflight { generation, .. } => Some(*generation),
            _ => None,
        })
    }

    fn armed(effects: &[Effect]) -> Option<(Duration, u64)> {
        effects.iter().find_map(|e| match e {
            Effect::ArmTimer { interval, generation } => Some((*interval, *generation)),
            _ => None,
        })
    }

    fn has(effects: &[Effect], predicate: impl Fn(&Effect) -> bool) -> bool {
        effects.iter().any(predicate)
    }

    /// Starts the controller and completes the first load.
    fn started(sites: Vec<Website>, interval: u64) -> (Controller, Vec<Effect>) {
        let mut controller = controller_with(sites, interval);
        let effects = controller.start();
        let Some(generation) = preflight_generation(&effects) else {
            return (controller, effects);
        };
        controller.on_preflight_passed(generation);
        let finished = controller.on_load_finished(generation);
        (controller, finished)
    }

    #[test]
    fn test_start_positions_and_loads() {
        let mut controller = controller_with(vec![site("a")], 0);
        let effects = controller.start();

        assert!(has(&effects, |e| matches!(e, Effect::SetOpacity(_))));
        assert!(has(&effects, |e| matches!(e, Effect::Reposition(_))));
        assert!(has(&effects, |e| matches!(e, Effect::SetVisible(true))));
        assert!(preflight_generation(&effects).is_some());
        assert_eq!(controller.render().phase, LoadPhase::Loading);
    }

    #[test]
    fn test_start_fetches_metadata_titles_only_when_missing() {
        let mut untitled = site("a");
        untitled.title.clear();
        let mut controller = controller_with(vec![untitled, site("b")], 0);
        let effects = controller.start();

        let wanted: Vec<bool> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::FetchMetadata { want_title, .. } => Some(*want_title),
                _ => None,
            })
            .collect();
        assert_eq!(wanted, vec![true, false]);
    }

    #[test]
    fn test_start_with_empty_collection_unloads() {
        let mut controller = controller_with(Vec::new(), 0);
        let effects = controller.start();
        assert!(has(&effects, |e| matches!(e, Effect::Unload)));
        assert!(preflight_generation(&effects).is_none());
    }

    #[test]
    fn test_preflight_then_load_includes_customization() {
        let mut website = site("a");
        website.css = "body { background: red; }".to_string();
        let mut controller = controller_with(vec![website], 0);

        let generation = preflight_generation(&controller.start()).unwrap();
        let effects = controller.on_preflight_passed(generation);

        let Some(Effect::Load(request)) = effects.first() else {
            panic!("expected a load, got {effects:?}");
        };
        assert_eq!(request.generation, generation);
        assert!(request.script.contains("background: red"));
        assert!(request.mute_audio);
    }

    #[test]
    fn test_load_success_arms_timer_when_passive() {
        let (controller, effects) = started(vec![site("a")], 60);
        assert_eq!(controller.render().phase, LoadPhase::Loaded);
        let (interval, _) = armed(&effects).unwrap();
        assert_eq!(interval, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_interval_never_arms_timer() {
        let (_, effects) = started(vec![site("a")], 0);
        assert!(armed(&effects).is_none());
    }

    #[test]
    fn test_stale_outcomes_are_ignored() {
        let mut controller = controller_with(vec![site("a"), site("b")], 60);
        let first = preflight_generation(&controller.start()).unwrap();
        let (_, effects) = controller.handle_command(AppCommand::Next);
        let second = preflight_generation(&effects).unwrap();

        assert!(controller.on_preflight_passed(first).is_empty());
        assert!(controller.on_load_finished(first).is_empty());
        assert!(controller.on_load_failed(first, NavigationError::Timeout).is_empty());
        assert_eq!(controller.render().phase, LoadPhase::Loading);

        assert!(!controller.on_load_finished(second).is_empty());
        assert_eq!(controller.render().phase, LoadPhase::Loaded);
    }

    #[test]
    fn test_real_failure_surfaces_error_and_arms_timer() {
        let mut controller = controller_with(vec![site("a")], 60);
        let generation = preflight_generation(&controller.start()).unwrap();

        let effects = controller.on_load_failed(generation, NavigationError::Timeout);
        assert!(has(&effects, |e| matches!(
            e,
            Effect::ShowError { message: Some(_), modal: false }
        )));
        assert!(armed(&effects).is_some());
        assert_eq!(controller.render().phase, LoadPhase::Errored);
        assert!(controller.status().error.is_some());
    }

    #[test]
    fn test_ignorable_failure_never_surfaces() {
        let mut controller = controller_with(vec![site("a")], 60);
        let generation = preflight_generation(&controller.start()).unwrap();

        let effects = controller.on_load_failed(generation, NavigationError::Cancelled);
        assert!(!has(&effects, |e| matches!(e, Effect::ShowError { message: Some(_), .. })));
        assert!(controller.status().error.is_none());
    }

    #[test]
    fn test_error_is_modal_in_browsing_mode() {
        let (mut controller, _) = started(vec![site("a")], 60);
        controller.handle_command(AppCommand::ToggleBrowsingMode);

        let (_, effects) = controller.handle_command(AppCommand::Reload);
        let generation = preflight_generation(&effects).unwrap();
        let effects = controller.on_load_failed(generation, NavigationError::Network("offline".into()));

        assert!(has(&effects, |e| matches!(e, Effect::ShowError { modal: true, .. })));
        assert!(armed(&effects).is_none());
    }

    #[test]
    fn test_success_after_error_clears_it() {
        let mut controller = controller_with(vec![site("a")], 0);
        let generation = preflight_generation(&controller.start()).unwrap();
        controller.on_load_failed(generation, NavigationError::Timeout);

        let (_, effects) = controller.handle_command(AppCommand::Reload);
        let generation = preflight_generation(&effects).unwrap();
        let effects = controller.on_load_finished(generation);
        assert!(has(&effects, |e| matches!(e, Effect::ShowError { message: None, .. })));
    }

    #[test]
    fn test_browsing_mode_suspends_and_rearms_timer() {
        let (mut controller, _) = started(vec![site("a")], 60);
        assert!(controller.render().timer_armed);

        let (_, effects) = controller.handle_command(AppCommand::ToggleBrowsingMode);
        assert!(has(&effects, |e| matches!(e, Effect::DisarmTimer)));
        assert!(has(&effects, |e| matches!(e, Effect::SetInteractive { interactive: true, .. })));
        assert!(!controller.render().timer_armed);
        assert!(controller.status().browsing);

        let (_, effects) = controller.handle_command(AppCommand::ToggleBrowsingMode);
        assert!(has(&effects, |e| matches!(e, Effect::SetInteractive { interactive: false, .. })));
        let (interval, _) = armed(&effects).unwrap();
        assert_eq!(interval, Duration::from_secs(60));
    }

    #[test]
    fn test_reload_tick_generations() {
        let (mut controller, effects) = started(vec![site("a")], 60);
        let (_, generation) = armed(&effects).unwrap();

        assert!(controller.on_reload_tick(generation + 1).is_empty());

        let effects = controller.on_reload_tick(generation);
        assert!(preflight_generation(&effects).is_some());
        assert!(controller.on_reload_tick(generation).is_empty());
    }

    #[test]
    fn test_tick_after_browsing_toggle_is_stale() {
        let (mut controller, effects) = started(vec![site("a")], 60);
        let (_, generation) = armed(&effects).unwrap();
        controller.handle_command(AppCommand::ToggleBrowsingMode);
        assert!(controller.on_reload_tick(generation).is_empty());
    }

    #[test]
    fn test_add_validates_and_makes_current() {
        let (mut controller, _) = started(vec![site("a")], 0);

        let (result, _) = controller.handle_command(AppCommand::Add {
            url: "ftp://nope".into(),
            title: None,
        });
        assert!(matches!(result, Err(PlashError::InvalidUrl(_))));

        let (result, effects) = controller.handle_command(AppCommand::Add {
            url: "time.is".into(),
            title: None,
        });
        let added = result.unwrap().unwrap();
        assert!(added.is_current);
        assert_eq!(added.url.as_str(), "https://time.is/");
        assert!(has(&effects, |e| matches!(e, Effect::FetchMetadata { want_title: true, .. })));
        assert!(has(&effects, |e| matches!(e, Effect::Persist(_))));
        assert!(preflight_generation(&effects).is_some());
    }

    #[test]
    fn test_add_with_title_fetches_icon_only() {
        let (mut controller, _) = started(Vec::new(), 0);
        let (_, effects) = controller.handle_command(AppCommand::Add {
            url: "https://time.is".into(),
            title: Some("Clock".into()),
        });
        assert!(has(&effects, |e| matches!(e, Effect::FetchMetadata { want_title: false, .. })));
        assert!(!has(&effects, |e| matches!(e, Effect::FetchMetadata { want_title: true, .. })));
    }

    #[test]
    fn test_remove_forgets_icon() {
        let a = site("a");
        let id = a.id;
        let (mut controller, _) = started(vec![a, site("b")], 0);
        let (_, effects) = controller.handle_command(AppCommand::Remove { id });
        assert!(has(&effects, |e| *e == Effect::ForgetFavicon(id)));
    }

    #[test]
    fn test_url_change_refetches_icon() {
        let a = site("a");
        let id = a.id;
        let (mut controller, _) = started(vec![a], 0);

        let (_, effects) = controller.handle_command(AppCommand::Update {
            id,
            patch: WebsitePatch { title: Some("Renamed".into()), ..WebsitePatch::default() },
        });
        assert!(!has(&effects, |e| matches!(e, Effect::ForgetFavicon(_))));

        let (_, effects) = controller.handle_command(AppCommand::Update {
            id,
            patch: WebsitePatch { url: Some("https://time.is".into()), ..WebsitePatch::default() },
        });
        let forget = effects.iter().position(|e| *e == Effect::ForgetFavicon(id)).unwrap();
        let fetch = effects
            .iter()
            .position(|e| matches!(e, Effect::FetchMetadata { url, .. } if url.as_str() == "https://time.is/"))
            .unwrap();
        assert!(forget < fetch);
    }

    #[test]
    fn test_favicon_fetched_redraws_menu() {
        let a = site("a");
        let id = a.id;
        let (controller, _) = started(vec![a], 0);

        let effects = controller.on_favicon_fetched(id);
        assert!(matches!(effects.as_slice(), [Effect::StatusChanged(_)]));
        assert!(controller.on_favicon_fetched(Uuid::now_v7()).is_empty());
    }

    #[test]
    fn test_remove_current_loads_next_current() {
        let a = site("a");
        let b = site("b");
        let c = site("c");
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        let (mut controller, _) = started(vec![a, b, c], 0);

        let (result, effects) = controller.handle_command(AppCommand::Remove { id: a_id });
        assert_eq!(result.unwrap().unwrap().id, a_id);
        assert_eq!(controller.websites().current_id(), Some(b_id));
        assert!(preflight_generation(&effects).is_some());

        let (result, _) = controller.handle_command(AppCommand::Next);
        assert_eq!(result.unwrap().unwrap().id, c_id);
        let (result, _) = controller.handle_command(AppCommand::Next);
        assert_eq!(result.unwrap().unwrap().id, b_id);
    }

    #[test]
    fn test_remove_last_unloads() {
        let a = site("a");
        let id = a.id;
        let (mut controller, _) = started(vec![a], 60);
        let (_, effects) = controller.handle_command(AppCommand::Remove { id });
        assert!(has(&effects, |e| matches!(e, Effect::Unload)));
        assert!(has(&effects, |e| matches!(e, Effect::DisarmTimer)));
    }

    #[test]
    fn test_unknown_website_is_not_found() {
        let (mut controller, _) = started(vec![site("a")], 0);
        let (result, effects) = controller.handle_command(AppCommand::SetCurrent { id: Uuid::now_v7() });
        assert!(matches!(result, Err(PlashError::WebsiteNotFound(_))));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_single_website_random_does_not_reload() {
        let (mut controller, _) = started(vec![site("a")], 0);
        let (_, effects) = controller.handle_command(AppCommand::Random);
        assert!(preflight_generation(&effects).is_none());
    }

    #[test]
    fn test_disable_and_enable() {
        let (mut controller, _) = started(vec![site("a")], 60);

        let (_, effects) = controller.handle_command(AppCommand::SetEnabled(false));
        assert!(has(&effects, |e| matches!(e, Effect::SetVisible(false))));
        assert!(has(&effects, |e| matches!(e, Effect::Unload)));
        assert!(has(&effects, |e| matches!(e, Effect::DisarmTimer)));
        assert!(has(&effects, |e| matches!(e, Effect::Persist(s) if !s.is_enabled)));

        let (_, effects) = controller.handle_command(AppCommand::Reload);
        assert!(preflight_generation(&effects).is_none());

        let (_, effects) = controller.handle_command(AppCommand::ToggleEnabled);
        assert!(has(&effects, |e| matches!(e, Effect::SetVisible(true))));
        assert!(preflight_generation(&effects).is_some());
    }

    #[test]
    fn test_browsing_unavailable_when_disabled() {
        let (mut controller, _) = started(vec![site("a")], 0);
        controller.handle_command(AppCommand::SetEnabled(false));
        let (result, _) = controller.handle_command(AppCommand::ToggleBrowsingMode);
        assert!(result.is_err());
    }

    #[test]
    fn test_battery_deactivation() {
        let mut cfg = config(60);
        cfg.deactivate_on_battery = true;
        let mut controller = Controller::new(
            StoreSnapshot { websites: vec![site("a")], is_enabled: true },
            cfg,
        );
        controller.start();

        let effects = controller.handle_system(SystemEvent::PowerSourceChanged { on_battery: true });
        assert!(has(&effects, |e| matches!(e, Effect::SetVisible(false))));
        assert!(!controller.status().active);

        let effects = controller.handle_system(SystemEvent::PowerSourceChanged { on_battery: false });
        assert!(has(&effects, |e| matches!(e, Effect::SetVisible(true))));
        assert!(preflight_generation(&effects).is_some());
    }

    #[test]
    fn test_battery_ignored_without_setting() {
        let (mut controller, _) = started(vec![site("a")], 60);
        let effects = controller.handle_system(SystemEvent::PowerSourceChanged { on_battery: true });
        assert!(effects.is_empty());
        assert!(controller.status().active);
    }

    #[test]
    fn test_lock_pauses_timer() {
        let (mut controller, _) = started(vec![site("a")], 60);

        let effects = controller.handle_system(SystemEvent::ScreenLocked);
        assert!(has(&effects, |e| matches!(e, Effect::DisarmTimer)));

        let effects = controller.handle_system(SystemEvent::ScreenUnlocked);
        assert!(armed(&effects).is_some());
    }

    #[test]
    fn test_wake_reloads() {
        let (mut controller, _) = started(vec![site("a")], 0);
        let effects = controller.handle_system(SystemEvent::DidWake);
        assert!(preflight_generation(&effects).is_some());
    }

    #[test]
    fn test_screen_change_repositions_and_substitutes_placeholders() {
        let website = Website::new(
            Url::parse("https://picsum.photos/[[screenWidth]]/[[screenHeight]]").unwrap(),
            "Photo",
        );
        let (mut controller, _) = started(vec![website], 0);

        let effects = controller.handle_system(SystemEvent::ScreensChanged {
            screen: Some(ScreenSize::new(1440, 900)),
        });
        assert!(has(&effects, |e| matches!(e, Effect::Reposition(_))));
        let url = effects.iter().find_map(|e| match e {
            Effect::Preflight { url, .. } => Some(url.clone()),
            _ => None,
        });
        assert_eq!(url.unwrap().as_str(), "https://picsum.photos/1440/900");
    }

    #[test]
    fn test_appearance_change_reinjects_inversion_only() {
        let mut website = site("a");
        website.invert_colors = InvertColors::DarkMode;
        let (mut controller, _) = started(vec![website], 0);

        let effects = controller.handle_system(SystemEvent::AppearanceChanged { dark: true });
        assert!(has(&effects, |e| matches!(e, Effect::Inject(s) if s.contains("invert(1)"))));
        assert!(preflight_generation(&effects).is_none());

        let effects = controller.handle_system(SystemEvent::AppearanceChanged { dark: true });
        assert!(effects.is_empty());
    }

    #[test]
    fn test_appearance_change_ignored_for_other_modes() {
        let (mut controller, _) = started(vec![site("a")], 0);
        let effects = controller.handle_system(SystemEvent::AppearanceChanged { dark: true });
        assert!(!has(&effects, |e| matches!(e, Effect::Inject(_))));
    }

    #[test]
    fn test_appearance_change_during_load_applies_on_finish() {
        let mut website = site("a");
        website.invert_colors = InvertColors::DarkMode;
        let mut controller = controller_with(vec![website], 0);

        let generation = preflight_generation(&controller.start()).unwrap();
        let effects = controller.on_preflight_passed(generation);
        let Some(Effect::Load(request)) = effects.first() else {
            panic!("expected a load, got {effects:?}");
        };
        assert!(!request.script.contains("invert(1)"));

        let effects = controller.handle_system(SystemEvent::AppearanceChanged { dark: true });
        assert!(!has(&effects, |e| matches!(e, Effect::Inject(_))));

        let effects = controller.on_load_finished(generation);
        assert!(has(&effects, |e| matches!(e, Effect::Inject(s) if s.contains("invert(1)"))));

        // Already applied to the page.
        let effects = controller.handle_system(SystemEvent::AppearanceChanged { dark: true });
        assert!(effects.is_empty());
    }

    #[test]
    fn test_finish_without_appearance_change_does_not_inject() {
        let mut website = site("a");
        website.invert_colors = InvertColors::DarkMode;
        let (_, effects) = started(vec![website], 0);
        assert!(!has(&effects, |e| matches!(e, Effect::Inject(_))));
    }

    #[test]
    fn test_load_arms_watchdog_for_its_generation() {
        let mut controller = controller_with(vec![site("a")], 0);
        let generation = preflight_generation(&controller.start()).unwrap();
        let effects = controller.on_preflight_passed(generation);

        assert!(matches!(effects.as_slice(), [
            Effect::Load(_),
            Effect::ArmLoadTimeout { generation: g, timeout },
        ] if *g == generation && *timeout == LOAD_TIMEOUT));
    }

    #[test]
    fn test_load_timeout_surfaces_error_and_rearms_timer() {
        let mut controller = controller_with(vec![site("a")], 60);
        let generation = preflight_generation(&controller.start()).unwrap();
        controller.on_preflight_passed(generation);

        let effects = controller.on_load_failed(generation, NavigationError::Timeout);
        assert_eq!(controller.render().phase, LoadPhase::Errored);
        assert!(has(&effects, |e| matches!(e, Effect::ShowError { message: Some(_), .. })));
        assert!(armed(&effects).is_some());

        let reload = controller.on_reload_tick(armed(&effects).unwrap().1);
        assert!(preflight_generation(&reload).is_some());
    }

    #[test]
    fn test_timeout_after_finish_is_ignored() {
        let (mut controller, _) = started(vec![site("a")], 60);
        let generation = controller.render().load_generation;

        assert!(controller.on_load_failed(generation, NavigationError::Timeout).is_empty());
        assert_eq!(controller.render().phase, LoadPhase::Loaded);
        assert!(controller.render().last_error.is_none());
    }

    #[test]
    fn test_title_fetched_applies_once() {
        let mut untitled = site("a");
        untitled.title.clear();
        let id = untitled.id;
        let (mut controller, _) = started(vec![untitled], 0);

        let effects = controller.on_title_fetched(id, "Fetched");
        assert!(has(&effects, |e| matches!(e, Effect::Persist(_))));
        assert!(controller.on_title_fetched(id, "Other").is_empty());
        assert_eq!(controller.websites().get(id).unwrap().title, "Fetched");
    }

    #[test]
    fn test_config_reload_applies_settings() {
        let (mut controller, _) = started(vec![site("a")], 60);

        let new_config = PlashConfig {
            reload_interval: 120,
            opacity: 0.5,
            display: Some(2),
            ..PlashConfig::default()
        };
        let effects = controller.on_config_reloaded(new_config);

        assert!(has(&effects, |e| matches!(e, Effect::SetOpacity(o) if (*o - 0.5).abs() < f64::EPSILON)));
        assert!(has(&effects, |e| matches!(e, Effect::Reposition(p) if p.display == Some(2))));
        let (interval, _) = armed(&effects).unwrap();
        assert_eq!(interval, Duration::from_secs(120));
    }

    #[test]
    fn test_config_reload_to_zero_interval_disarms() {
        let (mut controller, _) = started(vec![site("a")], 60);
        let effects = controller.on_config_reloaded(config(0));
        assert!(has(&effects, |e| matches!(e, Effect::DisarmTimer)));
        assert!(armed(&effects).is_none());
    }

    #[test]
    fn test_update_current_reloads() {
        let a = site("a");
        let id = a.id;
        let (mut controller, _) = started(vec![a], 0);

        let (result, effects) = controller.handle_command(AppCommand::Update {
            id,
            patch: WebsitePatch {
                css: Some("body{}".into()),
                ..WebsitePatch::default()
            },
        });
        assert_eq!(result.unwrap().unwrap().css, "body{}");
        assert!(preflight_generation(&effects).is_some());

        let (result, effects) = controller.handle_command(AppCommand::Update {
            id,
            patch: WebsitePatch {
                title: Some("Renamed".into()),
                ..WebsitePatch::default()
            },
        });
        assert_eq!(result.unwrap().unwrap().title, "Renamed");
        assert!(preflight_generation(&effects).is_none());
    }

    #[test]
    fn test_update_rejects_invalid_url() {
        let a = site("a");
        let id = a.id;
        let (mut controller, _) = started(vec![a], 0);
        let (result, _) = controller.handle_command(AppCommand::Update {
            id,
            patch: WebsitePatch {
                url: Some("mailto:someone".into()),
                ..WebsitePatch::default()
            },
        });
        assert!(matches!(result, Err(PlashError::InvalidUrl(_))));
    }

    #[test]
    fn test_local_website_loads_index_without_preflight() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<title>Local</title>").unwrap();
        let website = Website::new(Url::from_directory_path(dir.path()).unwrap(), "Local");

        let mut controller = controller_with(vec![website], 0);
        let effects = controller.start();
        assert!(preflight_generation(&effects).is_none());

        let load = effects.iter().find_map(|e| match e {
            Effect::Load(request) => Some(request.clone()),
            _ => None,
        });
        assert!(load.unwrap().url.path().ends_with("index.html"));
    }

    #[test]
    fn test_missing_local_website_is_local_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let website = Website::new(Url::from_directory_path(dir.path()).unwrap(), "Empty");
        let mut controller = controller_with(vec![website], 0);

        let effects = controller.start();
        assert!(has(&effects, |e| matches!(e, Effect::ShowError { message: Some(_), .. })));
        assert_eq!(controller.render().phase, LoadPhase::Errored);
    }

    #[test]
    fn test_queries() {
        let (controller, _) = started(vec![site("alpha"), site("beta")], 0);

        let QueryResult::Websites(all) = controller.query(&AppQuery::Websites { filter: None }) else {
            panic!("expected websites");
        };
        assert_eq!(all.len(), 2);

        let QueryResult::Websites(filtered) =
            controller.query(&AppQuery::Websites { filter: Some("BETA".into()) })
        else {
            panic!("expected websites");
        };
        assert_eq!(filtered.len(), 1);

        let QueryResult::Current(current) = controller.query(&AppQuery::Current) else {
            panic!("expected current");
        };
        assert_eq!(current.unwrap().title, "alpha");
    }
}
