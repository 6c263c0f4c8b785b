//! `SimulationController`: the virtual-time driver (spec.md §4.3).
//!
//! Single-threaded, synchronous: the loop thread owns the queue and
//! dispatches events back-to-back with no relation to wall-clock time.
//! Termination per spec.md §5: queue empty, `current_time >= end_time`, or
//! an injected terminal marker.

use crate::config::Config;
use crate::controller::Controller;
use crate::devi::Devi;
use crate::entity::{Arguments, EntityHandle};
use crate::error::{SimulationError, StepOutcome};
use crate::report::ControllerReport;
use crate::stats::Spectrum;
use crate::time::{Sequence, Time};

pub struct SimulationController {
    name: String,
    devi: Devi,
}

impl SimulationController {
    pub fn new(name: impl Into<String>, config: Config) -> Self {
        Self { name: name.into(), devi: Devi::new(config) }
    }

    pub fn devi(&mut self) -> &mut Devi {
        &mut self.devi
    }

    pub fn set_start_time(&mut self, time: Time) {
        // Only meaningful before the first dispatch; applied directly to
        // the scheduler core's notion of "now".
        self.devi = Devi::new({
            let mut config = self.devi.config().clone();
            config.start_time = time;
            config
        });
    }

    pub fn set_end_time(&mut self, time: Time) {
        self.devi.set_end_time(time);
    }

    pub fn set_track_event_sources(&mut self, enabled: bool) {
        self.devi.set_track_event_sources(enabled);
    }

    pub fn set_debug_events(&mut self, enabled: bool) {
        self.devi.set_debug_events(enabled);
    }

    pub fn set_track_spectrum(&mut self, enabled: bool) {
        self.devi.set_track_spectrum(enabled);
    }

    pub fn post_event(&mut self, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Sequence {
        self.devi.post_event(target, ordinal, arguments)
    }

    pub fn spectrum(&self) -> &Spectrum {
        self.devi.spectrum()
    }

    pub fn post_event_at(&mut self, time: Time, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Result<Sequence, SimulationError> {
        self.devi.post_event_at(time, target, ordinal, arguments)
    }

    /// Drive the queue to completion.
    ///
    /// Stops without dispatching the next queued event once its time would
    /// exceed the configured end time (spec.md §8 property 8,
    /// "end-of-time termination").
    pub fn event_loop(&mut self) -> Result<ControllerReport, SimulationError> {
        let end_time = self.devi.config().end_time;
        tracing::debug!(controller = %self.name, start = ?self.devi.current_time(), ?end_time, "virtual-time event loop starting");

        loop {
            match self.devi.peek_next_time() {
                None => break,
                Some(next) if next > end_time => break,
                Some(_) => {}
            }

            match self.devi.step() {
                Ok(()) => {}
                Err(StepOutcome::End(_)) => break,
                Err(StepOutcome::Err(err)) => {
                    tracing::warn!(controller = %self.name, error = %err, "virtual-time event loop aborted");
                    return Err(err);
                }
            }
        }

        tracing::debug!(
            controller = %self.name,
            end = ?self.devi.current_time(),
            total_events = self.devi.spectrum().total(),
            "virtual-time event loop finished"
        );
        Ok(self.report())
    }
}

impl Controller for SimulationController {
    fn name(&self) -> &str {
        &self.name
    }

    fn current_time(&self) -> Time {
        self.devi.current_time()
    }

    fn simulation_start(&self) -> Time {
        self.devi.config().start_time
    }

    fn simulation_end(&self) -> Time {
        self.devi.current_time()
    }

    fn total_events(&self) -> u64 {
        self.devi.spectrum().total()
    }

    fn report(&self) -> ControllerReport {
        self.devi.report(self.name.clone())
    }
}
