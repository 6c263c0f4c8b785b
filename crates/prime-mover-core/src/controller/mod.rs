//! Controller variants (spec.md §4.3).
//!
//! All three variants share the same [`Devi`](crate::devi::Devi) scheduler
//! core; they differ only in how they drive it. [`Controller`] unifies the
//! inspection surface so `prime-mover-cli` and the report generator can be
//! generic over which variant produced a run, the way `durable_runtime`
//! swaps a production `Clock`/`Scheduler` for a deterministic one behind a
//! shared trait.

mod real_time;
mod stepping;
mod virtual_time;

pub use real_time::RealTimeController;
pub use stepping::SteppingController;
pub use virtual_time::SimulationController;

use crate::report::ControllerReport;
use crate::time::Time;

/// Common inspection surface over any controller variant.
///
/// `spectrum` is deliberately not part of this trait: the single-threaded
/// variants could hand back a `&Spectrum` for free, but `RealTimeController`
/// only ever has one behind a lock guard, so every variant instead exposes
/// it pre-rendered through [`Controller::report`].
pub trait Controller {
    fn name(&self) -> &str;
    fn current_time(&self) -> Time;
    fn simulation_start(&self) -> Time;
    fn simulation_end(&self) -> Time;
    fn total_events(&self) -> u64;
    fn report(&self) -> ControllerReport;
}
