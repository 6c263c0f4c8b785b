//! Signal/wait primitive (spec.md §4.2, "condition-variable-style waits").
//!
//! A [`Signal`] holds at most one pending value and a FIFO of parked
//! waiters. It exists so blocking code can wait for a value to become
//! available without occupying a slot in the event queue — the design
//! notes (spec.md §9) call this out explicitly as a case the
//! caller-chain/continuation machinery has to support without a
//! persisted "waiting event" object.

use std::collections::VecDeque;

use crate::continuation::{Continuation, ContinuationOutcome, Resume};
use crate::devi::Devi;
use crate::entity::{Argument, Outcome};

struct Waiter {
    resume: Resume,
    continuation: Option<Continuation>,
    caller_signature: &'static str,
}

/// A single-slot mailbox with a FIFO of parked waiters.
///
/// `signal` delivers to the longest-waiting parked caller if one exists,
/// otherwise leaves the value pending for the next `wait`. `broadcast`
/// releases every parked waiter with the same value and leaves nothing
/// pending. Neither ever touches the event queue directly — they call
/// back into [`Devi::post_resume`], the same primitive a resolved
/// `post_continuing_event` continuation uses.
#[derive(Default)]
pub struct Signal {
    pending: VecDeque<Option<Argument>>,
    waiters: VecDeque<Waiter>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend the current event until a value is available, or consume
    /// one immediately if already pending.
    ///
    /// Always returns [`Outcome::Suspended`] when it parks; when a value
    /// is already pending, invokes `resume` synchronously and returns
    /// whatever it produces, without recording any waiter at all.
    pub fn wait(&mut self, devi: &mut Devi, resume: Resume) -> Result<Outcome, anyhow::Error> {
        if let Some(value) = self.pending.pop_front() {
            return resume(devi, ContinuationOutcome::Value(value));
        }

        let caller_signature = devi.current_signature();
        let continuation = devi.take_outer_continuation();
        self.waiters.push_back(Waiter { resume, continuation, caller_signature });
        Ok(Outcome::Suspended)
    }

    /// Deliver `value` to the longest-waiting parked caller, or leave it
    /// pending if nobody is waiting.
    pub fn signal(&mut self, devi: &mut Devi, value: Option<Argument>) {
        match self.waiters.pop_front() {
            Some(waiter) => {
                devi.post_resume(waiter.resume, ContinuationOutcome::Value(value), waiter.continuation, waiter.caller_signature);
            }
            None => self.pending.push_back(value),
        }
    }

    /// Release every parked waiter with a clone-free copy of the given
    /// value factory, one call per waiter since [`Argument`] is not
    /// `Clone` (it's an opaque boxed value) — callers needing a shared
    /// payload should box something cheaply cloneable, like an `Arc`.
    pub fn broadcast(&mut self, devi: &mut Devi, mut make_value: impl FnMut() -> Option<Argument>) {
        while let Some(waiter) = self.waiters.pop_front() {
            devi.post_resume(waiter.resume, ContinuationOutcome::Value(make_value()), waiter.continuation, waiter.caller_signature);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }
}
