//! Prime Mover's scheduler core.
//!
//! This crate implements the Entity Dispatch Protocol, the Scheduler Core
//! ("Devi"), the Event Queue, continuations, signals, the controller
//! variants, and the supporting statistics/reporting/error types. It has
//! no proc-macro dependency of its own — `prime-mover-macros` generates
//! code that calls into this crate's public API, the same split
//! `durable-core` and `durable-sqlx-macros` have between runtime types
//! and the code that targets them.

pub mod config;
pub mod continuation;
pub mod controller;
pub mod devi;
pub mod dist;
pub mod entity;
pub mod error;
pub mod event;
pub mod queue;
pub mod report;
pub mod signal;
pub mod stats;
pub mod time;
pub mod transform;

pub use config::Config;
pub use continuation::{Continuation, ContinuationOutcome, Resume};
pub use controller::{Controller, RealTimeController, SimulationController, SteppingController};
pub use devi::Devi;
pub use entity::{Argument, Arguments, Entity, EntityHandle, Outcome};
pub use error::SimulationError;
pub use event::{Dispatch, EventRecord};
pub use queue::EventQueue;
pub use report::ControllerReport;
pub use signal::Signal;
pub use time::{Duration, Sequence, Time};
pub use transform::AlreadyTransformed;
