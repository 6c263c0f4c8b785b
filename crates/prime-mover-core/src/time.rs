//! Simulated time.
//!
//! [`Time`] is a signed 64-bit count of implementation-defined units.
//! Only ordering, equality, addition of a non-negative [`Duration`], and
//! the difference of two `Time`s are meaningful operations — there is no
//! wall-clock relationship implied.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point on the simulated clock.
///
/// `Time::NEVER` is the sentinel used for "no scheduled end" (mirrors
/// `Long.MAX_VALUE` in the source system).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(i64);

/// A non-negative span of simulated time.
///
/// Represented as `u64` rather than a signed, runtime-checked type so that
/// "duration is non-negative" (spec.md §4.2: `advance(duration)`,
/// `duration >= 0`) is an invariant the type system enforces instead of one
/// `Devi` has to assert at every call site.
pub type Duration = u64;

impl Time {
    /// The origin of the simulated clock.
    pub const ZERO: Time = Time(0);

    /// Sentinel meaning "never" (spec.md §3: `Long.MAX_VALUE` or
    /// equivalent).
    pub const NEVER: Time = Time(i64::MAX);

    /// Construct a `Time` from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        Time(ticks)
    }

    /// The raw tick count.
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// `true` if this time is the `NEVER` sentinel.
    pub const fn is_never(self) -> bool {
        self.0 == i64::MAX
    }

    /// Saturating addition of a duration, clamping at [`Time::NEVER`]
    /// instead of overflowing.
    pub fn saturating_add(self, duration: Duration) -> Time {
        if self.is_never() {
            return Time::NEVER;
        }

        match i64::try_from(duration) {
            Ok(d) => Time(self.0.saturating_add(d)),
            Err(_) => Time::NEVER,
        }
    }

    /// The (non-negative, by construction) span between two times.
    ///
    /// Panics if `self` is earlier than `earlier`, since a negative span is
    /// never a meaningful [`Duration`] in this model.
    pub fn since(self, earlier: Time) -> Duration {
        assert!(
            self >= earlier,
            "Time::since called with an earlier time that is actually later ({earlier:?} > {self:?})"
        );
        (self.0 - earlier.0) as u64
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, duration: Duration) -> Time {
        self.saturating_add(duration)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, earlier: Time) -> Duration {
        self.since(earlier)
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "Time(NEVER)")
        } else {
            write!(f, "Time({})", self.0)
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "never")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Monotonically increasing stamp assigned at post time, used to
/// deterministically break ties between events scheduled at the same
/// [`Time`].
///
/// Sequence stamps are assigned at *post* time, including when a caller
/// event is re-posted after a suspension — a resumed caller receives a
/// fresh sequence rather than reusing the one it suspended with. This
/// resolves the ambiguity spec.md §9 calls out explicitly.
pub type Sequence = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_ticks() {
        assert!(Time::from_ticks(5) < Time::from_ticks(10));
        assert_eq!(Time::from_ticks(5), Time::from_ticks(5));
    }

    #[test]
    fn addition_and_difference_round_trip() {
        let t = Time::from_ticks(10);
        let later = t + 5;
        assert_eq!(later, Time::from_ticks(15));
        assert_eq!(later.since(t), 5);
        assert_eq!(later - t, 5);
    }

    #[test]
    fn never_absorbs_addition() {
        assert_eq!(Time::NEVER + 100, Time::NEVER);
    }

    #[test]
    fn saturating_add_clamps_on_overflow() {
        let near_max = Time::from_ticks(i64::MAX - 1);
        assert_eq!(near_max.saturating_add(10), Time::NEVER);
    }

    #[test]
    #[should_panic(expected = "Time::since")]
    fn since_panics_on_reversed_order() {
        let _ = Time::ZERO.since(Time::from_ticks(5));
    }
}
