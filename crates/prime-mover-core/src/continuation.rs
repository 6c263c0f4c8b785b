//! Continuations (spec.md §3, §4.2, §4.4.6).
//!
//! The source system captures a suspended method's locals by rewriting
//! bytecode to save them into a frame object and restoring them on resume.
//! Per the design notes (spec.md §9, "Continuation capture"), the idiomatic
//! Rust re-architecture is to make the transformation emit a state machine
//! whose variants hold exactly the locals live across a suspension point.
//!
//! A `Box<dyn FnOnce>` closure *is* such a state machine, generated by the
//! Rust compiler itself: when `#[prime_mover::blocking]` splits a method
//! body at a suspension call, everything textually after that call is
//! moved into a closure, and the compiler's own closure-capture analysis
//! computes the minimal set of locals the closure needs to borrow or move —
//! which is exactly the "minimal live set per suspension site" spec.md
//! §4.4.6 asks the transformation to compute, without requiring a
//! hand-rolled liveness pass. See `prime-mover-macros` for the half of this
//! story that lives in the proc-macro crate.
//!
//! A single blocking call can suspend more than once before its method
//! body finally returns — the remainder closure may itself call another
//! blocking primitive instead of completing. [`Continuation`] is therefore
//! not a flat pair of (signature, resume): it nests an optional `outer`
//! continuation, the one belonging to *this* event's own caller, so it
//! rides along untouched through however many further suspensions happen
//! before the chain finally bottoms out at a real return value.

use std::fmt;

use crate::entity::{Argument, Outcome};

/// The remainder of a suspended method body.
///
/// Invoked by the scheduler when the event this continuation is attached
/// to completes (or fails). Takes the produced value/error and hands back
/// whatever the *caller's* method ultimately returns, recursing into
/// further suspensions transparently if the remainder itself blocks again
/// (the closure may itself return `Outcome::Suspended`).
pub type Resume =
    Box<dyn FnOnce(&mut crate::devi::Devi, ContinuationOutcome) -> Result<Outcome, anyhow::Error> + Send>;

/// What a suspended callee produced.
pub enum ContinuationOutcome {
    /// The callee's event method returned normally, boxing its declared
    /// return type (or `None` for `void`).
    Value(Option<Argument>),
    /// The callee's event method raised an error.
    Error(anyhow::Error),
}

impl fmt::Debug for ContinuationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuationOutcome::Value(_) => f.write_str("ContinuationOutcome::Value(..)"),
            ContinuationOutcome::Error(e) => write!(f, "ContinuationOutcome::Error({e})"),
        }
    }
}

/// Captured state of a suspended blocking event.
///
/// Owned exclusively by the event it's attached to until
/// [`Continuation::into_parts`] consumes it to build the re-posted caller
/// event — spec.md §3's "ownership: exclusively owned by its event until
/// re-posted" is enforced structurally here: resolving a continuation
/// takes it by value, so there is no representable way to resolve one
/// twice.
pub struct Continuation {
    resume: Resume,
    /// Human-readable signature of the caller, kept for tracing even after
    /// `resume` has been consumed by value.
    caller_signature: &'static str,
    /// The continuation belonging to *this event's own* caller, carried
    /// forward untouched. `None` if this event's caller has nothing
    /// further waiting on it (it's a top-level post) or already collected
    /// its own completion.
    outer: Option<Box<Continuation>>,
}

impl Continuation {
    pub fn new(caller_signature: &'static str, resume: Resume, outer: Option<Continuation>) -> Self {
        Self {
            resume,
            caller_signature,
            outer: outer.map(Box::new),
        }
    }

    pub fn caller_signature(&self) -> &'static str {
        self.caller_signature
    }

    /// Consume this continuation, handing back its resume closure and
    /// whatever continuation it was itself carrying forward.
    pub fn into_parts(self) -> (Resume, Option<Continuation>) {
        (self.resume, self.outer.map(|boxed| *boxed))
    }
}
