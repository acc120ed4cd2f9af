use party_rules::PhaseTimings;
use std::env;

/// Upper bound on the driver tick; the shortest timed phase is a 4 s announce.
pub const MAX_DRIVER_TICK_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct GameConfig {
    // spawn a driver task for every room
    pub auto_advance_phases: bool,
    pub driver_tick_ms: u64,
    pub verbose_logging: bool,
    pub timings: PhaseTimings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            auto_advance_phases: true,
            driver_tick_ms: MAX_DRIVER_TICK_MS,
            verbose_logging: cfg!(debug_assertions),
            timings: PhaseTimings::default(),
        }
    }
}

fn seconds_from_env(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|v| v.parse::<i64>().ok()).map(|s| s * 1_000)
}

impl GameConfig {
    /// Phases only move when the host asks for it.
    pub fn manual() -> Self {
        Self {
            auto_advance_phases: false,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let auto_advance_phases = env::var("AUTO_ADVANCE_PHASES")
            .map(|v| v == "true")
            .unwrap_or(defaults.auto_advance_phases);
        let driver_tick_ms = env::var("DRIVER_TICK_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.driver_tick_ms)
            .clamp(1, MAX_DRIVER_TICK_MS);
        let verbose_logging = env::var("VERBOSE_LOGGING")
            .map(|v| v == "true")
            .unwrap_or(defaults.verbose_logging);

        let mut timings = defaults.timings;
        if let Some(ms) = seconds_from_env("PHASE_NIGHT_SECONDS") {
            timings.night_ms = ms;
        }
        if let Some(ms) = seconds_from_env("PHASE_VOTING_SECONDS") {
            timings.voting_ms = ms;
        }
        if let Some(ms) = seconds_from_env("PHASE_ANNOUNCE_SECONDS") {
            timings.announce_ms = ms;
        }

        Self {
            auto_advance_phases,
            driver_tick_ms,
            verbose_logging,
            timings,
        }
    }
}
