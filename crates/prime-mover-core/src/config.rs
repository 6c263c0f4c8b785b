//! Controller configuration (SPEC_FULL.md §3.1).
//!
//! `spec.md` leaves several tunables implementation-defined. This module
//! collects them into a single builder-style struct, the way
//! `durable_runtime::Config` is constructed via `derive_setters` rather
//! than a dozen individual setter methods scattered across the runtime.

use std::time::Duration as WallDuration;

use crate::time::{Duration, Time};

/// Tunables for a single controller run.
///
/// Defaults match spec.md where it specifies a default, and are chosen
/// conservatively (tracking off, spectrum on) elsewhere.
#[derive(Clone, Debug)]
pub struct Config {
    pub start_time: Time,
    pub end_time: Time,

    /// spec.md §4.5: "Disabled by default: chains retain events after
    /// dispatch and increase memory."
    pub track_event_sources: bool,

    /// spec.md §4.5: "Significantly expensive."
    pub debug_events: bool,

    /// Not named as optional in spec.md, but §8 property 6/7 only holds
    /// "when spectrum tracking is enabled" — on by default so a fresh
    /// controller is testable out of the box.
    pub track_spectrum: bool,

    /// Bounds the "shallow stack" spec.md §3 says a debug trace captures.
    pub max_debug_trace_depth: usize,

    /// How far behind wall-clock time the [`crate::controller::RealTimeController`]
    /// worker tolerates before logging a lag warning.
    pub wall_clock_catch_up_slack: WallDuration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_time: Time::ZERO,
            end_time: Time::NEVER,
            track_event_sources: false,
            debug_events: false,
            track_spectrum: true,
            max_debug_trace_depth: 32,
            wall_clock_catch_up_slack: WallDuration::ZERO,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_time(mut self, time: Time) -> Self {
        self.start_time = time;
        self
    }

    pub fn end_time(mut self, time: Time) -> Self {
        self.end_time = time;
        self
    }

    /// Convenience over `end_time` taking a duration from `start_time`.
    pub fn run_for(mut self, duration: Duration) -> Self {
        self.end_time = self.start_time + duration;
        self
    }

    pub fn track_event_sources(mut self, enabled: bool) -> Self {
        self.track_event_sources = enabled;
        self
    }

    pub fn debug_events(mut self, enabled: bool) -> Self {
        self.debug_events = enabled;
        self
    }

    pub fn track_spectrum(mut self, enabled: bool) -> Self {
        self.track_spectrum = enabled;
        self
    }

    pub fn max_debug_trace_depth(mut self, depth: usize) -> Self {
        self.max_debug_trace_depth = depth;
        self
    }
}
