//! Kernel error taxonomy (spec.md §7).
//!
//! Leaf variants are modeled with `thiserror` the way `durable-migrate`
//! separates its own error enum from the `anyhow::Error` that carries
//! entity-code failures, mirroring `durable_runtime::error`'s split between
//! a small set of named conditions and an opaque wrapped cause.

use crate::time::Time;

/// Errors surfaced by the scheduler core and controller loops.
///
/// `SimulationEnd` is deliberately not `pub` outside the crate: spec.md §7
/// says it must "never [be] visible to modelers" — it is raised internally
/// by a terminal marker event and caught by the virtual-time loop.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Attempted to post an event earlier than the controller's current
    /// time.
    #[error("cannot post event at time {requested} because current time is already {current}")]
    TimeViolation { current: Time, requested: Time },

    /// [`crate::queue::EventQueue::poll_min`] was called on an empty queue.
    ///
    /// Benign when raised from inside the virtual-time loop's normal
    /// termination check; surfaced as a real error from
    /// `SteppingController::step_one` per spec.md §4.3.
    #[error("no more events are scheduled")]
    NoMoreEvents,

    /// An entity's `invoke` returned an error during dispatch.
    ///
    /// Carries the signature of the event that failed and the simulated
    /// time at which it failed, in addition to the underlying cause, so
    /// that a controller report retains failure context even after the
    /// `anyhow::Error` has been logged and discarded (spec.md §7,
    /// "user-visible failure behaviour").
    #[error("event `{signature}` at time {time} raised an error: {source}")]
    SimulationException {
        signature: String,
        time: Time,
        #[source]
        source: anyhow::Error,
    },

    /// `Entity::invoke` was called with an ordinal outside the
    /// transformed dispatch table — a stale-bytecode / ordinal-table
    /// mismatch.
    #[error("entity `{entity}` has no event method with ordinal {ordinal}")]
    UnknownOrdinal { entity: &'static str, ordinal: usize },
}

/// Internal control-flow signal raised by dispatching a terminal marker
/// event.
///
/// This deliberately does not live inside [`SimulationError`] — Rust enum
/// variants can't carry a narrower visibility than their enum, and spec.md
/// §7 requires `SimulationEnd` to "never [be] visible to modelers". A
/// crate-private sibling type plus [`StepOutcome`] gets the same effect:
/// `Devi::evaluate` and the controller loops see it, nothing outside the
/// crate can construct or match on it.
#[derive(Debug)]
pub(crate) struct SimulationEnd;

/// The result of driving one scheduler step, folding the
/// crate-private [`SimulationEnd`] signal in alongside real errors so
/// internal call sites have a single `Result` type to propagate with `?`.
pub(crate) type StepResult<T> = Result<T, StepOutcome>;

#[derive(Debug)]
pub(crate) enum StepOutcome {
    End(SimulationEnd),
    Err(SimulationError),
}

impl From<SimulationError> for StepOutcome {
    fn from(err: SimulationError) -> Self {
        StepOutcome::Err(err)
    }
}

impl From<SimulationEnd> for StepOutcome {
    fn from(end: SimulationEnd) -> Self {
        StepOutcome::End(end)
    }
}
