//! Entity Dispatch Protocol (spec.md §3, §4.4).
//!
//! An [`Entity`] is the runtime-facing capability set that the build-time
//! transformation guarantees for every transformed class: given an ordinal
//! and an argument vector, run the corresponding event method body and
//! report back a boxed return value or an error. The kernel never pattern
//! matches on concrete entity types — it only ever goes through this trait,
//! which is the Rust analogue of the `(data_ptr, vtable_ptr)` pair the
//! design notes (spec.md §9, "Entity polymorphism") call for in place of the
//! source's reflective `invoke` hook.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use anyhow::Error as AnyError;

use crate::devi::Devi;

/// A single argument or return value, type-erased.
///
/// The transformation contract is responsible for boxing/unboxing these
/// per the recorded signature (spec.md §4.4.3).
pub type Argument = Box<dyn Any + Send>;

/// The argument vector passed to [`Entity::invoke`].
pub type Arguments = Vec<Argument>;

/// A shared handle to a transformed entity instance.
///
/// Entities outlive the events scheduled against them (spec.md §3), so the
/// kernel holds them behind an `Arc` rather than owning them outright.
pub type EntityHandle = Arc<dyn Entity>;

/// The dispatch protocol a transformed class must implement.
///
/// `invoke` and `signature_for` together are what `#[prime_mover::entity]`
/// (see the `prime-mover-macros` crate) generates for every entity impl
/// block; application code never implements this trait by hand, the same
/// way `durable_runtime`'s WASM guests never hand-write their component
/// bindings.
/// The outcome of dispatching one event method body.
pub enum Outcome {
    /// The event body ran to completion. `None` for a `void`-returning
    /// event method, `Some(_)` boxing the declared return type otherwise.
    Done(Option<Argument>),

    /// The event body suspended at a blocking call (`postContinuingEvent`,
    /// `advance`, a signal wait, or a call into another blocking event
    /// method). The suspension bookkeeping — the continuation, or a
    /// parked [`crate::signal::Signal`] waiter — has already been
    /// recorded by whichever primitive caused the suspension; the
    /// dispatch loop has nothing further to do for this event record.
    Suspended,
}

pub trait Entity: Send + Sync {
    /// Execute event method `ordinal` with the given arguments.
    ///
    /// `devi` is the thread-bound scheduler core, threaded in explicitly
    /// per spec.md §9's "Thread-local controller binding" guidance rather
    /// than recovered from a thread-local inside the method body — the
    /// thread-local exists only as the fallback the static time API uses
    /// at the boundary where a context parameter isn't available.
    ///
    /// The scheduler wraps a propagated error as
    /// [`crate::error::SimulationError::SimulationException`]
    /// (spec.md §4.2, "Dispatch").
    fn invoke(&self, ordinal: usize, args: Arguments, devi: &mut Devi) -> Result<Outcome, AnyError>;

    /// The stable, human-readable signature of event method `ordinal`.
    ///
    /// Used for the event-spectrum statistic (spec.md §4.5) and for
    /// tracing/debug output. Returns [`crate::error::SimulationError::UnknownOrdinal`]
    /// semantics are the caller's responsibility — this method itself
    /// should only ever be called with ordinals the same entity produced
    /// via its own `invoke` table.
    fn signature_for(&self, ordinal: usize) -> &'static str;

    /// A short name for this entity's concrete type, used in trace output
    /// and panics. Defaults to `"<entity>"`; transformed entities override
    /// it with their type name.
    fn type_name(&self) -> &'static str {
        "<entity>"
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("type", &self.type_name()).finish()
    }
}
