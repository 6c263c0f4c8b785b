//! Guest-facing API for Prime Mover models.
//!
//! Re-exports the scheduler core and the transformation macros behind
//! one crate, the same split `durable` keeps between `durable-core`'s
//! runtime types and its own thin re-exporting facade: a model crate
//! depends on `prime-mover` only, never on `prime-mover-core` or
//! `prime-mover-macros` directly.

#[doc(inline)]
pub use prime_mover_core::{
    config::Config,
    continuation::{Continuation, ContinuationOutcome, Resume},
    controller::{Controller, RealTimeController, SimulationController, SteppingController},
    devi::Devi,
    dist::{DurationDistribution, Rng},
    entity::{Argument, Arguments, Entity, EntityHandle, Outcome},
    error::SimulationError,
    event::{Dispatch, EventRecord},
    queue::EventQueue,
    report::{ControllerReport, SpectrumEntry},
    signal::Signal,
    stats::{SourceArena, SourceEntry, Spectrum},
    time::{Duration, Sequence, Time},
    transform::AlreadyTransformed,
};

#[doc(inline)]
pub use prime_mover_macros::{blocking, entity, event, non_event, time};
