//! Seedable distributions (spec.md §8 S6, "deterministic replay").
//!
//! Wraps `rand`/`rand_distr` behind a thin, entity-friendly surface so a
//! modeler can draw inter-arrival times, service times, and the like from
//! a run whose seed is recorded and reproducible — the same
//! `StdRng`-from-seed pattern `durable_runtime::dst` uses to make a test
//! run replayable byte-for-byte.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution as _, Exp, Normal, Uniform};

use crate::time::Duration;

/// A seeded random source owned by the model, not the kernel.
///
/// The kernel never advances this RNG itself — advancing it is an
/// observable side effect of entity code, and spec.md's deterministic
/// replay property only holds if draws happen in the same order across
/// runs, which is the modeler's responsibility just as event posting
/// order is.
pub struct Rng(StdRng);

impl Rng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.0
    }
}

/// An inter-arrival or service-time distribution over simulated
/// [`Duration`]s.
pub enum DurationDistribution {
    Exponential(Exp<f64>),
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    Constant(Duration),
}

impl DurationDistribution {
    pub fn exponential(rate: f64) -> Self {
        Self::Exponential(Exp::new(rate).expect("exponential rate must be positive and finite"))
    }

    pub fn uniform(low: f64, high: f64) -> Self {
        Self::Uniform(Uniform::new(low, high))
    }

    pub fn normal(mean: f64, std_dev: f64) -> Self {
        Self::Normal(Normal::new(mean, std_dev).expect("normal distribution parameters must be finite"))
    }

    pub fn constant(duration: Duration) -> Self {
        Self::Constant(duration)
    }

    /// Draw the next duration, clamped to zero (a negative sample from a
    /// `Normal` is not a meaningful [`Duration`]).
    pub fn sample(&self, rng: &mut Rng) -> Duration {
        let value = match self {
            DurationDistribution::Exponential(dist) => dist.sample(rng.inner()),
            DurationDistribution::Uniform(dist) => dist.sample(rng.inner()),
            DurationDistribution::Normal(dist) => dist.sample(rng.inner()),
            DurationDistribution::Constant(duration) => return *duration,
        };
        if value.is_sign_negative() { 0 } else { value.round() as Duration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let dist = DurationDistribution::exponential(1.0 / 10.0);
        let mut a = Rng::from_seed(42);
        let mut b = Rng::from_seed(42);
        let draws_a: Vec<_> = (0..20).map(|_| dist.sample(&mut a)).collect();
        let draws_b: Vec<_> = (0..20).map(|_| dist.sample(&mut b)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn constant_distribution_is_exact() {
        let dist = DurationDistribution::constant(15);
        let mut rng = Rng::from_seed(1);
        assert_eq!(dist.sample(&mut rng), 15);
        assert_eq!(dist.sample(&mut rng), 15);
    }
}
