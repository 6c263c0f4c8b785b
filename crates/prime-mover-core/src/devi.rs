//! The Scheduler Core (spec.md §4.2: "Devi").
//!
//! `Devi` owns the single sequence counter, the event queue, and the
//! bookkeeping a dispatch needs while it runs: the current simulated time,
//! the signature of whatever event method is presently executing, and
//! (when enabled) the event spectrum and source arena. Controllers
//! (`crate::controller`) own a `Devi` and drive it; `Devi` itself never
//! loops — it only ever processes exactly the one event handed to
//! [`Devi::evaluate`].
//!
//! Context is threaded explicitly: every primitive that can only be called
//! from inside a dispatch (`post_continuing_event`, `advance`, `sleep`)
//! takes `&mut self` directly rather than reaching for a thread-local,
//! per the design notes in spec.md §9 ("Thread-local controller binding").

use anyhow::Context as _;

use crate::config::Config;
use crate::continuation::{Continuation, ContinuationOutcome, Resume};
use crate::entity::{Arguments, EntityHandle, Outcome};
use crate::error::{SimulationEnd, SimulationError, StepOutcome, StepResult};
use crate::event::{Dispatch, EventRecord};
use crate::queue::EventQueue;
use crate::stats::{SourceArena, Spectrum};
use crate::time::{Duration, Sequence, Time};

const SLEEP_ORDINAL: usize = 0;
const TERMINAL_ORDINAL: usize = 1;
const SLEEP_SIGNATURE: &str = "<sleep>";

/// Bookkeeping for the event presently being dispatched.
struct CurrentEvent {
    signature: &'static str,
    arena_index: Option<usize>,
    /// The continuation this event's own caller is waiting on, if any.
    /// Taken by whichever primitive this event's body calls to suspend
    /// further; left in place (and collected by `evaluate` on return) if
    /// the body runs to completion without re-suspending.
    continuation: Option<Continuation>,
}

/// The scheduler core: sequence counter, queue, and per-dispatch state.
///
/// Exactly one `Devi` exists per simulation run. Controllers own it behind
/// whatever synchronization their variant needs (none for the single-
/// threaded virtual-time and stepping controllers, a `Mutex` for the
/// real-time controller's background worker — see `crate::controller`).
pub struct Devi {
    queue: EventQueue,
    sequence: Sequence,
    current_time: Time,
    current: Option<CurrentEvent>,
    config: Config,
    spectrum: Spectrum,
    sources: SourceArena,
}

impl Devi {
    pub fn new(config: Config) -> Self {
        let current_time = config.start_time;
        Self {
            queue: EventQueue::new(),
            sequence: 0,
            current_time,
            current: None,
            config,
            spectrum: Spectrum::default(),
            sources: SourceArena::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_track_event_sources(&mut self, enabled: bool) {
        self.config.track_event_sources = enabled;
    }

    pub fn set_debug_events(&mut self, enabled: bool) {
        self.config.debug_events = enabled;
    }

    pub fn set_track_spectrum(&mut self, enabled: bool) {
        self.config.track_spectrum = enabled;
    }

    pub fn set_end_time(&mut self, time: Time) {
        self.config.end_time = time;
    }

    /// Build a snapshot [`crate::report::ControllerReport`] of this run so
    /// far.
    pub fn report(&self, name: impl Into<String>) -> crate::report::ControllerReport {
        let mut spectrum: Vec<_> = self
            .spectrum
            .iter()
            .map(|(signature, count)| crate::report::SpectrumEntry { signature: signature.to_string(), count })
            .collect();
        spectrum.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.signature.cmp(&b.signature)));

        crate::report::ControllerReport {
            name: name.into(),
            start_time: self.config.start_time,
            end_time: self.current_time,
            duration: self.current_time.since(self.config.start_time),
            total_events: self.spectrum.total(),
            spectrum,
        }
    }

    pub fn current_time(&self) -> Time {
        self.current_time
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn sources(&self) -> &SourceArena {
        &self.sources
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn peek_next_time(&self) -> Option<Time> {
        self.queue.peek_min().map(|event| event.time)
    }

    fn next_sequence(&mut self) -> Sequence {
        // Sequence stamps are assigned at post time, including re-post
        // after suspension (SPEC_FULL.md §4.2.1, resolving spec.md's open
        // question): every call into this method, whether from a fresh
        // `post_event` or from `post_resume` re-enqueuing a caller, draws
        // from the same monotonic counter.
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    pub(crate) fn current_signature(&self) -> &'static str {
        self.current.as_ref().map(|c| c.signature).unwrap_or("<top-level>")
    }

    fn current_arena_index(&self) -> Option<usize> {
        self.current.as_ref().and_then(|c| c.arena_index)
    }

    /// Take the continuation (if any) this presently-executing event's own
    /// caller is waiting on. Called by every primitive that creates a new
    /// suspending event, so the outer continuation rides along onto the
    /// new event rather than being dropped.
    pub(crate) fn take_outer_continuation(&mut self) -> Option<Continuation> {
        self.current.as_mut().and_then(|c| c.continuation.take())
    }

    fn maybe_record_source(&mut self, signature: &'static str, time: Time, caller: Option<usize>) -> Option<usize> {
        self.config.track_event_sources.then(|| self.sources.push(signature, time, caller))
    }

    fn maybe_capture_trace(&self, arena_index: Option<usize>) -> Option<Vec<String>> {
        if !self.config.debug_events {
            return None;
        }
        let Some(index) = arena_index else { return Some(Vec::new()) };
        let chain = self.sources.chain(index);
        Some(
            chain
                .into_iter()
                .take(self.config.max_debug_trace_depth)
                .map(|entry| format!("{} @ {}", entry.signature, entry.time))
                .collect(),
        )
    }

    fn enqueue(&mut self, event: Box<EventRecord>) {
        self.queue.add(event);
    }

    /// Post a non-blocking event for immediate dispatch at the current
    /// simulated time.
    pub fn post_event(&mut self, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Sequence {
        let sequence = self.next_sequence();
        let time = self.current_time;
        let mut event = Box::new(EventRecord::new(target, ordinal, arguments, time, sequence));
        event.caller = self.current_arena_index();
        event.debug_trace = self.maybe_capture_trace(event.caller);
        self.enqueue(event);
        sequence
    }

    /// Post a non-blocking event scheduled for a future time.
    ///
    /// # Errors
    /// Returns [`SimulationError::TimeViolation`] if `time` precedes the
    /// current simulated time (spec.md §4.2, causality).
    pub fn post_event_at(
        &mut self,
        time: Time,
        target: EntityHandle,
        ordinal: usize,
        arguments: Arguments,
    ) -> Result<Sequence, SimulationError> {
        if time < self.current_time {
            return Err(SimulationError::TimeViolation { current: self.current_time, requested: time });
        }
        let sequence = self.next_sequence();
        let mut event = Box::new(EventRecord::new(target, ordinal, arguments, time, sequence));
        event.caller = self.current_arena_index();
        event.debug_trace = self.maybe_capture_trace(event.caller);
        self.enqueue(event);
        Ok(sequence)
    }

    /// Post a blocking event: `target`'s event method will run, and once
    /// it completes (possibly after further suspensions of its own),
    /// `resume` runs with the value or error it produced.
    ///
    /// Always returns [`Outcome::Suspended`] — callers (generated by
    /// `#[prime_mover::blocking]`) are expected to return this value
    /// directly rather than inspect it.
    pub fn post_continuing_event(
        &mut self,
        target: EntityHandle,
        ordinal: usize,
        arguments: Arguments,
        resume: Resume,
    ) -> Outcome {
        let caller_signature = self.current_signature();
        let outer = self.take_outer_continuation();
        let sequence = self.next_sequence();
        let time = self.current_time;

        let mut event = Box::new(EventRecord::new(target, ordinal, arguments, time, sequence));
        event.caller = self.current_arena_index();
        event.debug_trace = self.maybe_capture_trace(event.caller);
        event.continuation = Some(Continuation::new(caller_signature, resume, outer));
        self.enqueue(event);
        Outcome::Suspended
    }

    /// Suspend the current event for `duration`, resuming `resume` once it
    /// elapses. Built on the same internal "no-op event" mechanism as
    /// [`Devi::sleep`], but blocking.
    pub fn advance(&mut self, duration: Duration, resume: Resume) -> Outcome {
        let caller_signature = self.current_signature();
        let outer = self.take_outer_continuation();
        let sequence = self.next_sequence();
        let time = self.current_time + duration;

        let mut event = Box::new(EventRecord::new_static(SLEEP_ORDINAL, Arguments::new(), time, sequence));
        event.caller = self.current_arena_index();
        event.debug_trace = self.maybe_capture_trace(event.caller);
        event.continuation = Some(Continuation::new(caller_signature, resume, outer));
        self.enqueue(event);
        Outcome::Suspended
    }

    /// Post a no-op event `duration` in the future without suspending the
    /// caller — spec.md §4.2's non-blocking sibling of `advance`.
    pub fn sleep(&mut self, duration: Duration) {
        let sequence = self.next_sequence();
        let time = self.current_time + duration;
        let mut event = Box::new(EventRecord::new_static(SLEEP_ORDINAL, Arguments::new(), time, sequence));
        event.caller = self.current_arena_index();
        event.debug_trace = self.maybe_capture_trace(event.caller);
        self.enqueue(event);
    }

    /// Schedule the terminal marker that ends the run at `time`.
    ///
    /// # Errors
    /// Returns [`SimulationError::TimeViolation`] if `time` precedes the
    /// current simulated time.
    pub fn end_simulation_at(&mut self, time: Time) -> Result<(), SimulationError> {
        if time < self.current_time {
            return Err(SimulationError::TimeViolation { current: self.current_time, requested: time });
        }
        let sequence = self.next_sequence();
        self.enqueue(Box::new(EventRecord::new_static(TERMINAL_ORDINAL, Arguments::new(), time, sequence)));
        Ok(())
    }

    /// Schedule the terminal marker at the current simulated time.
    ///
    /// `end_simulation_at` with `time == current_time` can never raise
    /// [`SimulationError::TimeViolation`], so this just forwards to it.
    pub fn end_simulation(&mut self) {
        let now = self.current_time;
        self.end_simulation_at(now).expect("current time is never before itself");
    }

    /// Re-post a resumed caller at the current time with a fresh sequence,
    /// carrying forward whatever continuation it was itself waiting on.
    ///
    /// Called either from [`Devi::evaluate`] when a continuation resolves
    /// normally, or from [`crate::signal::Signal::signal`]/`broadcast` when
    /// a waiter is released.
    pub(crate) fn post_resume(&mut self, resume: Resume, outcome: ContinuationOutcome, continuation: Option<Continuation>, caller_signature: &'static str) -> Sequence {
        let sequence = self.next_sequence();
        let time = self.current_time;
        let mut event = Box::new(EventRecord::new_resume(resume, outcome, caller_signature, time, sequence));
        event.caller = self.current_arena_index();
        self.enqueue(event);
        sequence
    }

    fn invoke_internal(&mut self, ordinal: usize) -> Result<Outcome, anyhow::Error> {
        match ordinal {
            SLEEP_ORDINAL => Ok(Outcome::Done(None)),
            other => Err(anyhow::anyhow!("no internal event method with ordinal {other}")),
        }
    }

    /// Remove and dispatch the next event, advancing `current_time` to its
    /// timestamp first.
    ///
    /// Returns `Ok(SimulationEnd)` once the terminal marker is dispatched,
    /// and a real error for anything else that goes wrong — the caller
    /// (a controller loop) is responsible for treating the two
    /// differently.
    pub(crate) fn step(&mut self) -> StepResult<()> {
        let event = self.queue.poll_min().map_err(StepOutcome::from)?;
        self.evaluate(event)
    }

    fn evaluate(&mut self, mut event: Box<EventRecord>) -> StepResult<()> {
        self.current_time = event.time;

        if let Dispatch::Invoke { target: None, ordinal, .. } = &event.dispatch {
            if *ordinal == TERMINAL_ORDINAL {
                return Err(SimulationEnd.into());
            }
        }

        let signature = event.signature().unwrap_or(SLEEP_SIGNATURE);
        let continuation = event.continuation.take();
        let arena_index = self.maybe_record_source(signature, event.time, event.caller);
        self.current = Some(CurrentEvent { signature, arena_index, continuation });

        let result = match event.dispatch {
            Dispatch::Invoke { target: Some(target), ordinal, arguments } => target.invoke(ordinal, arguments, self),
            Dispatch::Invoke { target: None, ordinal, .. } => self.invoke_internal(ordinal),
            Dispatch::Resume { resume, outcome, .. } => resume(self, outcome),
        };

        let leftover_continuation = self.current.take().and_then(|c| c.continuation);

        let outcome = result.with_context(|| format!("event `{signature}` failed")).map_err(|source| {
            SimulationError::SimulationException { signature: signature.to_string(), time: self.current_time, source }
        })?;

        match outcome {
            Outcome::Done(value) => {
                if self.config.track_spectrum {
                    self.spectrum.record(signature);
                }
                if let Some(continuation) = leftover_continuation {
                    let caller_signature = continuation.caller_signature();
                    let (resume, outer) = continuation.into_parts();
                    self.post_resume(resume, ContinuationOutcome::Value(value), outer, caller_signature);
                }
            }
            Outcome::Suspended => {
                // Whichever primitive this event's body called to suspend
                // further has already taken `leftover_continuation` (it's
                // `None` at this point in the well-behaved case). If it's
                // still `Some`, the event body returned `Suspended`
                // without actually registering a new suspension — a bug
                // in hand-written (non-macro-generated) entity code. The
                // obligation is dropped rather than silently completing
                // the wrong caller.
                if leftover_continuation.is_some() {
                    tracing::warn!(signature, "event suspended without registering a continuation; caller will never resume");
                }
            }
        }

        Ok(())
    }
}
