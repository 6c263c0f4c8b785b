//! The Event Record (spec.md §3).
//!
//! An [`EventRecord`] is immutable aside from its continuation's
//! return-value slot. It is either a fresh dispatch against an
//! [`Entity`](crate::entity::Entity) (`Dispatch::Invoke`) or the resumption
//! of a caller that suspended inside a blocking call (`Dispatch::Resume`) —
//! see [`crate::continuation`] for why resumption is modeled as re-running
//! a captured closure rather than re-entering `invoke` from the top.

use crate::continuation::{Continuation, ContinuationOutcome, Resume};
use crate::entity::{Arguments, EntityHandle};
use crate::time::{Sequence, Time};

/// What a dispatch of this event actually does.
pub enum Dispatch {
    /// Call `target.invoke(ordinal, arguments)` (or, for the null target
    /// used by static-method events, a free function registered the same
    /// way).
    Invoke {
        target: Option<EntityHandle>,
        ordinal: usize,
        arguments: Arguments,
    },

    /// Resume a caller that suspended inside [`crate::devi::Devi::post_continuing_event`]
    /// (or `advance`, which is built on it). `resume` is the captured
    /// remainder of the caller's method body; `outcome` is the value or
    /// error the signaled/completed callee produced. `signature` is the
    /// caller's own signature, carried along so the event spectrum can
    /// attribute the caller's eventual completion to the right method even
    /// though this physical `EventRecord` has no entity target of its own.
    Resume {
        resume: Resume,
        outcome: ContinuationOutcome,
        signature: &'static str,
    },
}

/// A single scheduled invocation, frozen at post time.
pub struct EventRecord {
    pub dispatch: Dispatch,
    pub time: Time,
    pub sequence: Sequence,

    /// Present iff this event is blocking: holds the caller event that
    /// must be re-posted (with a fresh sequence) once this event's body
    /// completes.
    pub continuation: Option<Continuation>,

    /// Index into the controller's source arena, present only when
    /// `track_event_sources` is enabled (spec.md §4.5).
    pub caller: Option<usize>,

    /// Shallow posting-site stack, present only when `debug_events` is
    /// enabled (spec.md §4.5).
    pub debug_trace: Option<Vec<String>>,
}

impl EventRecord {
    pub fn new(
        target: EntityHandle,
        ordinal: usize,
        arguments: Arguments,
        time: Time,
        sequence: Sequence,
    ) -> Self {
        Self {
            dispatch: Dispatch::Invoke { target: Some(target), ordinal, arguments },
            time,
            sequence,
            continuation: None,
            caller: None,
            debug_trace: None,
        }
    }

    /// An event with no entity target, used for internal markers (the
    /// sleep-completion event, the terminal marker) and for static-method
    /// events (spec.md §3: "the null target for static-method events").
    pub fn new_static(ordinal: usize, arguments: Arguments, time: Time, sequence: Sequence) -> Self {
        Self {
            dispatch: Dispatch::Invoke { target: None, ordinal, arguments },
            time,
            sequence,
            continuation: None,
            caller: None,
            debug_trace: None,
        }
    }

    pub fn new_resume(
        resume: Resume,
        outcome: ContinuationOutcome,
        signature: &'static str,
        time: Time,
        sequence: Sequence,
    ) -> Self {
        Self {
            dispatch: Dispatch::Resume { resume, outcome, signature },
            time,
            sequence,
            continuation: None,
            caller: None,
            debug_trace: None,
        }
    }

    /// The event-spectrum signature for this event: the entity method it
    /// targets, or the caller signature carried along by a resumption.
    /// `None` only for the internal untargeted markers (sleep-completion,
    /// the terminal marker), which the scheduler attributes separately.
    pub fn signature(&self) -> Option<&'static str> {
        match &self.dispatch {
            Dispatch::Invoke { target: Some(target), ordinal, .. } => Some(target.signature_for(*ordinal)),
            Dispatch::Invoke { target: None, .. } => None,
            Dispatch::Resume { signature, .. } => Some(signature),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.continuation.is_some()
    }
}
