//! `RealTimeController`: the wall-clock driver (spec.md §4.3, §5).
//!
//! Multi-threaded: producers may post from any thread, one worker thread
//! parks on a condition variable until the next event's scheduled time and
//! then dispatches it. A single `parking_lot::Mutex` guards both the
//! `Devi` (and, through it, the queue) and the `Condvar` wait, mirroring
//! the locking discipline `durable_runtime::scheduler` uses for its own
//! producer/worker split, and `stop()`'s cleanup-on-drop mirrors
//! `durable_runtime::flag::ShutdownGuard`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration as WallDuration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::Config;
use crate::controller::Controller;
use crate::devi::Devi;
use crate::entity::{Arguments, EntityHandle};
use crate::error::StepOutcome;
use crate::report::ControllerReport;
use crate::time::{Sequence, Time};

/// Poll interval for the idle wait — bounds how long `stop()` can take to
/// take effect when the queue is empty.
const IDLE_POLL: WallDuration = WallDuration::from_millis(50);

struct Shared {
    devi: Mutex<Devi>,
    wake: Condvar,
    stop: AtomicBool,
}

pub struct RealTimeController {
    name: String,
    shared: Arc<Shared>,
    tick: WallDuration,
    worker: Option<JoinHandle<()>>,
}

impl RealTimeController {
    /// `tick` is the wall-clock duration one unit of simulated time maps
    /// to — spec.md leaves the scale modeler-defined, so it's a
    /// constructor parameter rather than a `Config` field shared with the
    /// other variants.
    pub fn new(name: impl Into<String>, config: Config, tick: WallDuration) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                devi: Mutex::new(Devi::new(config)),
                wake: Condvar::new(),
                stop: AtomicBool::new(false),
            }),
            tick,
            worker: None,
        }
    }

    pub fn post_event(&self, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Sequence {
        let mut devi = self.shared.devi.lock();
        let sequence = devi.post_event(target, ordinal, arguments);
        self.shared.wake.notify_one();
        sequence
    }

    pub fn post_event_at(&self, time: Time, target: EntityHandle, ordinal: usize, arguments: Arguments) -> Result<Sequence, crate::error::SimulationError> {
        let mut devi = self.shared.devi.lock();
        let sequence = devi.post_event_at(time, target, ordinal, arguments)?;
        self.shared.wake.notify_one();
        Ok(sequence)
    }

    /// Spawn the worker dispatch thread. A no-op if already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.shared.stop.store(false, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let tick = self.tick;
        let name = self.name.clone();
        let start_time = shared.devi.lock().config().start_time;
        let epoch = Instant::now();
        self.worker = Some(
            std::thread::Builder::new()
                .name(format!("prime-mover-{name}"))
                .spawn(move || Self::run(shared, tick, name, start_time, epoch))
                .expect("failed to spawn real-time controller worker"),
        );
    }

    fn run(shared: Arc<Shared>, tick: WallDuration, name: String, start_time: Time, epoch: Instant) {
        tracing::debug!(controller = %name, "real-time worker starting");
        loop {
            let mut devi = shared.devi.lock();
            if shared.stop.load(Ordering::SeqCst) {
                break;
            }

            let Some(next) = devi.peek_next_time() else {
                shared.wake.wait_for(&mut devi, IDLE_POLL);
                continue;
            };

            // `next`'s wall-clock target is measured from the worker's own
            // `epoch`, not from `Devi::current_time()` — the simulated
            // clock only advances inside `step()` below, so computing
            // `remaining` from it would recompute the same value on every
            // idle loop iteration and never actually wait out the real
            // elapsed time.
            let target = WallDuration::from_nanos(next.since(start_time).saturating_mul(tick.as_nanos().min(u128::from(u64::MAX)) as u64));
            let elapsed = epoch.elapsed();
            let remaining = target.saturating_sub(elapsed);

            // Sleep in bounded chunks rather than the full `remaining` span
            // in one call, so a `stop()` or a newly-posted earlier event
            // is noticed promptly instead of only after the long wait
            // elapses.
            let sleep_for = remaining.min(IDLE_POLL);
            shared.wake.wait_for(&mut devi, sleep_for);
            drop(devi);

            if shared.stop.load(Ordering::SeqCst) {
                break;
            }
            if sleep_for < remaining {
                // Not due yet; loop around to recheck for a newer post.
                continue;
            }

            let mut devi = shared.devi.lock();
            if devi.peek_next_time() != Some(next) {
                continue;
            }
            match devi.step() {
                Ok(()) => {}
                Err(StepOutcome::End(_)) => break,
                Err(StepOutcome::Err(err)) => {
                    tracing::warn!(controller = %name, error = %err, "real-time worker logging and continuing");
                }
            }
        }
        tracing::debug!(controller = %name, "real-time worker stopped");
    }

    /// Signal the worker to stop and join it. Idempotent.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.wake.notify_all();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for RealTimeController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            tracing::warn!(controller = %self.name, "RealTimeController dropped without calling stop()");
            self.stop();
        }
    }
}

impl Controller for RealTimeController {
    fn name(&self) -> &str {
        &self.name
    }

    fn current_time(&self) -> Time {
        self.shared.devi.lock().current_time()
    }

    fn simulation_start(&self) -> Time {
        self.shared.devi.lock().config().start_time
    }

    fn simulation_end(&self) -> Time {
        self.shared.devi.lock().current_time()
    }

    fn total_events(&self) -> u64 {
        self.shared.devi.lock().spectrum().total()
    }

    fn report(&self) -> ControllerReport {
        self.shared.devi.lock().report(self.name.clone())
    }
}
