//! Bounded daily-steps series sampling.
//!
//! A user's series is drawn from a normal distribution truncated to the
//! non-negative reals, located at `bin * 1000` with a deliberately wide scale,
//! then rescaled so the series mean lands on the bin's target of
//! `bin * 1000 + 500`. The heavy right tail gives realistic day-to-day spread;
//! the rescale pins the level.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::warn;

use crate::activity::ActivityBin;

/// Scale of the untruncated step distribution, shared by every bin.
pub const STEP_SIGMA: f64 = 20_000.0;

/// Draws allowed before a series whose rescale divisor is zero is replaced
/// by a constant series at the target mean.
pub const MAX_RESCALE_ATTEMPTS: usize = 8;

/// Normal distribution restricted to `[lower, +inf)`, sampled by rejection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TruncatedNormal {
    pub mu: f64,
    pub sigma: f64,
    pub lower: f64,
}

impl TruncatedNormal {
    pub fn new(mu: f64, sigma: f64, lower: f64) -> Self {
        Self { mu, sigma, lower }
    }

    /// Step distribution for an activity bin.
    pub fn for_bin(bin: ActivityBin) -> Self {
        Self::new(bin.location(), STEP_SIGMA, 0.0)
    }

    /// Truncation limits in units of standard deviations from `mu`.
    pub fn standardized_bounds(&self) -> (f64, f64) {
        ((self.lower - self.mu) / self.sigma, f64::INFINITY)
    }
}

impl Distribution<f64> for TruncatedNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // Acceptance is at least 1 - Phi(-0.5) ~ 0.69 for every bin.
        loop {
            let z: f64 = StandardNormal.sample(rng);
            let x = self.mu + self.sigma * z;
            if x >= self.lower {
                return x;
            }
        }
    }
}

/// Draw `n_days` daily step counts for a user in `bin`.
///
/// The realized mean is `bin.target_mean()` up to integer truncation, which
/// costs less than one step per day.
pub fn sample_series(bin: ActivityBin, n_days: usize, rng: &mut impl Rng) -> Vec<u32> {
    sample_rescaled(&TruncatedNormal::for_bin(bin), bin.target_mean(), n_days, rng)
}

/// Draw `n_days` absolute samples from `dist` and rescale them onto `target`.
///
/// A draw whose mean is zero cannot be rescaled; it is redrawn up to
/// [`MAX_RESCALE_ATTEMPTS`] times before falling back to a constant series.
pub fn sample_rescaled<D, R>(dist: &D, target: f64, n_days: usize, rng: &mut R) -> Vec<u32>
where
    D: Distribution<f64>,
    R: Rng + ?Sized,
{
    if n_days == 0 {
        return Vec::new();
    }

    let mut raw = vec![0.0f64; n_days];
    for attempt in 1..=MAX_RESCALE_ATTEMPTS {
        for x in raw.iter_mut() {
            *x = dist.sample(rng).abs();
        }

        if let Some(series) = rescale(&raw, target) {
            return series;
        }
        warn!(attempt, target, "degenerate series, redrawing");
    }

    warn!(
        target,
        "no usable draw after {} attempts, filling series with target mean",
        MAX_RESCALE_ATTEMPTS,
    );
    vec![target as u32; n_days]
}

/// Scale `raw` so its mean equals `target`, truncating to whole steps.
/// Returns `None` when the mean is zero or not finite.
pub fn rescale(raw: &[f64], target: f64) -> Option<Vec<u32>> {
    if raw.is_empty() {
        return Some(Vec::new());
    }
    let mean = raw.iter().sum::<f64>() / raw.len() as f64;
    if !(mean > 0.0 && mean.is_finite()) {
        return None;
    }

    let divisor = mean / target;
    Some(raw.iter().map(|x| (x / divisor) as u32).collect())
}

/// Arithmetic mean of a step series; 0 for an empty series.
pub fn series_mean(series: &[u32]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().map(|&s| s as f64).sum::<f64>() / series.len() as f64
}
