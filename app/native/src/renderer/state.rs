//! Render coordinator state: load phase, interaction mode and the inputs
//! that decide whether the wallpaper is active.

use std::time::Duration;

use serde::Serialize;

use super::errors::NavigationError;
use crate::websites::ScreenSize;

/// How long a navigation may stay in [`LoadPhase::Loading`] before it is
/// reported as [`NavigationError::Timeout`].
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Progress of the current page load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Whether the user is interacting with the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Interaction {
    /// Behind the desktop icons, reloading on a timer.
    #[default]
    Passive,
    /// In front and interactive, timer suspended.
    Browsing,
}

/// Mutable state owned by the controller.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub phase: LoadPhase,
    pub interaction: Interaction,
    /// Incremented for every load; outcomes carry the generation they
    /// belong to.
    pub load_generation: u64,
    /// Incremented for every timer arming; ticks carry their generation.
    pub timer_generation: u64,
    pub timer_armed: bool,
    pub reload_interval: Duration,
    pub enabled: bool,
    pub on_battery: bool,
    pub deactivate_on_battery: bool,
    pub locked: bool,
    pub dark_appearance: bool,
    /// Appearance the page's color inversion was last built for.
    pub page_dark_appearance: bool,
    pub screen: Option<ScreenSize>,
    pub last_error: Option<NavigationError>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            phase: LoadPhase::Idle,
            interaction: Interaction::Passive,
            load_generation: 0,
            timer_generation: 0,
            timer_armed: false,
            reload_interval: Duration::ZERO,
            enabled: true,
            on_battery: false,
            deactivate_on_battery: false,
            locked: false,
            dark_appearance: false,
            page_dark_appearance: false,
            screen: None,
            last_error: None,
        }
    }
}

impl RenderState {
    /// Whether a website should be shown at all.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled && !(self.on_battery && self.deactivate_on_battery)
    }

    #[must_use]
    pub fn is_browsing(&self) -> bool { self.interaction == Interaction::Browsing }

    /// Whether the reload timer should be running right now.
    #[must_use]
    pub fn wants_timer(&self) -> bool {
        self.is_active()
            && !self.is_browsing()
            && !self.locked
            && !self.reload_interval.is_zero()
            && matches!(self.phase, LoadPhase::Loaded | LoadPhase::Errored)
    }

    /// Starts a new load and returns its generation.
    pub const fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.phase = LoadPhase::Loading;
        self.load_generation
    }

    /// Marks the load as finished. Returns `false` for stale generations.
    pub fn finish_load(&mut self, generation: u64) -> bool {
        if !self.is_current_load(generation) {
            return false;
        }
        self.phase = LoadPhase::Loaded;
        self.last_error = None;
        true
    }

    /// Marks the load as failed. Returns `false` for stale generations.
    pub fn fail_load(&mut self, generation: u64, error: NavigationError) -> bool {
        if !self.is_current_load(generation) {
            return false;
        }
        self.phase = LoadPhase::Errored;
        self.last_error = Some(error);
        true
    }

    /// Clears the page and invalidates in-flight loads.
    pub fn reset_load(&mut self) {
        self.load_generation += 1;
        self.phase = LoadPhase::Idle;
        self.last_error = None;
    }

    #[must_use]
    pub const fn is_current_load(&self, generation: u64) -> bool {
        generation == self.load_generation && matches!(self.phase, LoadPhase::Loading)
    }

    /// Starts a new timer generation.
    pub const fn arm_timer(&mut self) -> u64 {
        self.timer_generation += 1;
        self.timer_armed = true;
        self.timer_generation
    }

    pub const fn disarm_timer(&mut self) {
        self.timer_generation += 1;
        self.timer_armed = false;
    }

    #[must_use]
    pub const fn is_current_timer(&self, generation: u64) -> bool {
        self.timer_armed && generation == self.timer_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_generations_discard_stale_outcomes() {
        let mut state = RenderState::default();
        let first = state.begin_load();
        let second = state.begin_load();

        assert!(!state.finish_load(first));
        assert_eq!(state.phase, LoadPhase::Loading);
        assert!(state.finish_load(second));
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert!(!state.finish_load(second));
    }

    #[test]
    fn test_fail_load_records_error() {
        let mut state = RenderState::default();
        let generation = state.begin_load();
        assert!(state.fail_load(generation, NavigationError::Timeout));
        assert_eq!(state.phase, LoadPhase::Errored);
        assert_eq!(state.last_error, Some(NavigationError::Timeout));

        let generation = state.begin_load();
        state.finish_load(generation);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_timer_generations() {
        let mut state = RenderState::default();
        let first = state.arm_timer();
        let second = state.arm_timer();
        assert!(!state.is_current_timer(first));
        assert!(state.is_current_timer(second));

        state.disarm_timer();
        assert!(!state.is_current_timer(second));
    }

    #[test]
    fn test_battery_deactivation_requires_setting() {
        let mut state = RenderState { on_battery: true, ..RenderState::default() };
        assert!(state.is_active());
        state.deactivate_on_battery = true;
        assert!(!state.is_active());
        state.on_battery = false;
        assert!(state.is_active());
    }

    #[test]
    fn test_wants_timer() {
        let mut state = RenderState {
            reload_interval: Duration::from_secs(60),
            phase: LoadPhase::Loaded,
            ..RenderState::default()
        };
        assert!(state.wants_timer());

        state.interaction = Interaction::Browsing;
        assert!(!state.wants_timer());
        state.interaction = Interaction::Passive;

        state.locked = true;
        assert!(!state.wants_timer());
        state.locked = false;

        state.reload_interval = Duration::ZERO;
        assert!(!state.wants_timer());
    }
}
