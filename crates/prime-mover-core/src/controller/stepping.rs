//! `SteppingController`: the single-step driver (spec.md §4.3).
//!
//! Exposes the scheduler core's raw `step` as `step_one`, for tests and
//! interactive tools that want to dispatch exactly one event at a time and
//! inspect state in between. Unlike the virtual-time loop, an empty queue
//! here is surfaced as a real [`SimulationError::NoMoreEvents`] rather than
//! treated as a benign terminator (spec.md §7).

use crate::config::Config;
use crate::controller::Controller;
use crate::devi::Devi;
use crate::entity::{Arguments, EntityHandle};
use crate::error::{SimulationError, StepOutcome};
use crate::report::ControllerReport;
use crate::stats::Spectrum;
use crate::time::{Sequence, Time};

pub struct SteppingController {
    name: String,
    devi: Devi,
    finished: bool,
}

impl SteppingController {
    pub fn new(name: impl Into<String>, config: Config) -> Self {
        Self { name: name.into(), devi: Devi::new(config), finished: false }
    }

    pub fn devi(&mut self) -> &mut Devi {
        &mut self.devi
    }

    pub fn post_event(&mut self, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Sequence {
        self.devi.post_event(target, ordinal, arguments)
    }

    pub fn post_event_at(&mut self, time: Time, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Result<Sequence, SimulationError> {
        self.devi.post_event_at(time, target, ordinal, arguments)
    }

    /// Dispatch exactly one event.
    ///
    /// # Errors
    /// [`SimulationError::NoMoreEvents`] if the queue is empty, surfaced
    /// directly rather than treated as termination, per spec.md §7.
    pub fn step_one(&mut self) -> Result<(), SimulationError> {
        if self.finished {
            return Err(SimulationError::NoMoreEvents);
        }
        match self.devi.step() {
            Ok(()) => Ok(()),
            Err(StepOutcome::End(_)) => {
                self.finished = true;
                Ok(())
            }
            Err(StepOutcome::Err(err)) => Err(err),
        }
    }

    /// The time of the next queued event, without dispatching it.
    pub fn peek_next(&self) -> Option<Time> {
        self.devi.peek_next_time()
    }

    /// Whether `step_one` can make progress.
    pub fn has_more(&self) -> bool {
        !self.finished && !self.devi.is_idle()
    }

    /// Discard all scheduled events and rewind to the configured start
    /// time, for reusing one controller across repeated scenario runs.
    pub fn reset(&mut self) {
        self.devi = Devi::new(self.devi.config().clone());
        self.finished = false;
    }

    pub fn spectrum(&self) -> &Spectrum {
        self.devi.spectrum()
    }
}

impl Controller for SteppingController {
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
