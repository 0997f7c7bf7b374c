//! Per-day aggregation.
//!
//! Each day is summarized by its sufficient statistics (count, sum and sum of
//! squares of every user's steps). Mean and standard error of the mean are
//! derived from that triple, so stored summaries can be recomputed or merged
//! without touching the raw per-user data again.
//!
//! Sums are kept as exact integers. The variance numerator
//! `n * sum2 - sum1^2` is formed in integer arithmetic, so it does not suffer the
//! cancellation the same expression has in floating point.

pub mod report;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::population::{Calendar, Population, UserSeries};

/// Count, sum and sum of squares of a set of step values.
///
/// Sums serialize as JSON numbers while they fit in a `u64` and as decimal
/// strings beyond that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SufficientStats {
    pub sum0: u64,
    #[serde(with = "wide_sum")]
    pub sum1: u128,
    #[serde(with = "wide_sum")]
    pub sum2: u128,
}

mod wide_sum {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*value) {
            Ok(small) => serializer.serialize_u64(small),
            Err(_) => serializer.collect_str(value),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n as u128),
            Repr::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

impl SufficientStats {
    pub fn from_values(values: &[u32]) -> Self {
        let mut stats = Self::default();
        for &x in values {
            stats.push(x);
        }
        stats
    }

    pub fn push(&mut self, x: u32) {
        let x = x as u128;
        self.sum0 += 1;
        self.sum1 += x;
        self.sum2 += x * x;
    }

    /// Combine with another set. Associative and commutative.
    pub fn merge(&mut self, other: &SufficientStats) {
        self.sum0 += other.sum0;
        self.sum1 += other.sum1;
        self.sum2 += other.sum2;
    }

    /// Mean of the values; 0 when there are none.
    pub fn mean(&self) -> f64 {
        if self.sum0 == 0 {
            return 0.0;
        }
        self.sum1 as f64 / self.sum0 as f64
    }

    /// `n * sum2 - sum1^2`, i.e. `n` times the sum of squared deviations.
    fn scaled_m2(&self) -> f64 {
        let n = self.sum0 as u128;
        match (n.checked_mul(self.sum2), self.sum1.checked_mul(self.sum1)) {
            // Non-negative by Cauchy-Schwarz.
            (Some(a), Some(b)) => a.saturating_sub(b) as f64,
            _ => {
                let n = self.sum0 as f64;
                let s1 = self.sum1 as f64;
                (n * self.sum2 as f64 - s1 * s1).max(0.0)
            }
        }
    }

    /// Unbiased sample variance; 0 with fewer than two values.
    pub fn sample_variance(&self) -> f64 {
        if self.sum0 < 2 {
            return 0.0;
        }
        let n = self.sum0 as f64;
        self.scaled_m2() / (n * (n - 1.0))
    }

    /// Standard error of the mean; 0 with fewer than two values.
    pub fn std_error_of_mean(&self) -> f64 {
        if self.sum0 < 2 {
            return 0.0;
        }
        self.sample_variance().sqrt() / (self.sum0 as f64).sqrt()
    }
}

/// Welford accumulator for streaming mean and variance.
///
/// Floating-point counterpart of [`SufficientStats`], used for statistics over
/// values that are not whole step counts (such as per-user means).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningMoments {
    pub count: u64,
    pub mean: f64,
    /// Sum of squared differences from the mean.
    pub m2: f64,
}

impl RunningMoments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Combine two accumulators (parallel reduction).
    pub fn merge(a: &RunningMoments, b: &RunningMoments) -> RunningMoments {
        let count = a.count + b.count;
        if count == 0 {
            return RunningMoments::new();
        }
        let delta = b.mean - a.mean;
        let (na, nb, n) = (a.count as f64, b.count as f64, count as f64);
        RunningMoments {
            count,
            mean: a.mean + delta * nb / n,
            m2: a.m2 + b.m2 + delta * delta * na * nb / n,
        }
    }

    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    pub fn std_error_of_mean(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.std_dev() / (self.count as f64).sqrt()
        }
    }
}

impl FromIterator<f64> for RunningMoments {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut moments = RunningMoments::new();
        for x in iter {
            moments.push(x);
        }
        moments
    }
}

/// Summary of all users' steps on one day.
///
/// A day without values has mean 0 and standard error 0. A day with a single
/// value has standard error 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub date_ms: i64,
    pub sums: SufficientStats,
    pub mean: f64,
    pub std_error_of_mean: f64,
}

impl DayAggregate {
    /// Derive mean and standard error from stored sums.
    pub fn from_sums(date_ms: i64, sums: SufficientStats) -> Self {
        Self {
            date_ms,
            sums,
            mean: sums.mean(),
            std_error_of_mean: sums.std_error_of_mean(),
        }
    }

    pub fn from_values(date_ms: i64, values: &[u32]) -> Self {
        Self::from_sums(date_ms, SufficientStats::from_values(values))
    }

    pub fn count(&self) -> u64 {
        self.sums.sum0
    }

    /// Fold another batch of users for the same day into this aggregate.
    pub fn merge(&mut self, other: &DayAggregate) {
        self.sums.merge(&other.sums);
        self.mean = self.sums.mean();
        self.std_error_of_mean = self.sums.std_error_of_mean();
    }
}

/// Aggregate a generated population, one entry per calendar day.
pub fn aggregate_days(population: &Population) -> Vec<DayAggregate> {
    aggregate(&population.calendar, &population.series)
}

/// Aggregate `series` over `calendar` with a parallel map-reduce across users.
///
/// A series shorter than the calendar only contributes to the days it covers.
pub fn aggregate(calendar: &Calendar, series: &[UserSeries]) -> Vec<DayAggregate> {
    let n_days = calendar.len();
    let empty = || vec![SufficientStats::default(); n_days];

    let sums = series
        .par_iter()
        .fold(empty, |mut acc, user| {
            for (day, &steps) in acc.iter_mut().zip(&user.steps) {
                day.push(steps);
            }
            acc
        })
        .reduce(empty, |mut a, b| {
            for (x, y) in a.iter_mut().zip(&b) {
                x.merge(y);
            }
            a
        });

    let days: Vec<DayAggregate> = calendar
        .iter()
        .zip(sums)
        .map(|(day, s)| DayAggregate::from_sums(day.timestamp_ms, s))
        .collect();

    info!(days = days.len(), users = series.len(), "aggregated daily statistics");
    days
}
