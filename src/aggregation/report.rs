//! Text summaries of a generated population.
//!
//! `StepDistribution` bins every generated step value on a log scale, the shape
//! the dataset is usually inspected in. `PopulationSummary` compares realized
//! levels with what the activity tables predict.

use serde::{Deserialize, Serialize};

use super::{DayAggregate, RunningMoments};
use crate::activity::{ActivityBin, DistributionMode};
use crate::population::Population;
use crate::sampler::series_mean;

/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 100;

/// Log-spaced histogram of all step values in a population.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepDistribution {
    /// `n_bins + 1` ascending bin edges; bin `i` is `[edges[i], edges[i + 1])`,
    /// the last bin also includes its upper edge.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Values equal to zero, which have no place on a log axis.
    pub zeros: usize,
    pub total: usize,
    pub min: u32,
    pub max: u32,
    pub mean: f64,
    pub std_dev: f64,
}

impl StepDistribution {
    pub fn from_population(population: &Population, n_bins: usize) -> Self {
        let values = population.series.iter().flat_map(|s| s.steps.iter().copied());
        Self::from_values(values, n_bins)
    }

    pub fn from_values(values: impl Iterator<Item = u32> + Clone, n_bins: usize) -> Self {
        let n_bins = n_bins.max(1);
        let mut moments = RunningMoments::new();
        let mut min = u32::MAX;
        let mut max = 0u32;
        let mut min_positive = u32::MAX;
        for x in values.clone() {
            moments.push(x as f64);
            min = min.min(x);
            max = max.max(x);
            if x > 0 {
                min_positive = min_positive.min(x);
            }
        }

        if moments.count == 0 {
            return Self {
                edges: Vec::new(),
                counts: Vec::new(),
                zeros: 0,
                total: 0,
                min: 0,
                max: 0,
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        let mut counts = vec![0usize; n_bins];
        let mut zeros = 0;
        let edges = if min_positive == u32::MAX {
            Vec::new()
        } else {
            let lo = (min_positive as f64).ln();
            let hi = (max as f64).ln();
            let width = (hi - lo) / n_bins as f64;
            for x in values {
                if x == 0 {
                    zeros += 1;
                    continue;
                }
                let i = if width > 0.0 {
                    (((x as f64).ln() - lo) / width) as usize
                } else {
                    0
                };
                counts[i.min(n_bins - 1)] += 1;
            }
            (0..=n_bins).map(|i| (lo + width * i as f64).exp()).collect()
        };
        if edges.is_empty() {
            zeros = moments.count as usize;
            counts.clear();
        }

        Self {
            edges,
            counts,
            zeros,
            total: moments.count as usize,
            min,
            max,
            mean: moments.mean,
            std_dev: moments.std_dev(),
        }
    }

    /// Human-readable report. Only non-empty bins are listed.
    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Generated Steps Distribution ===\n\n");
        s.push_str(&format!("  Values:      {}\n", self.total));
        s.push_str(&format!("  Mean:        {:.1} steps/day\n", self.mean));
        s.push_str(&format!("  Std dev:     {:.1}\n", self.std_dev));
        s.push_str(&format!("  Range:       {} to {}\n", self.min, self.max));
        s.push_str(&format!("  Zero days:   {}\n\n", self.zeros));

        s.push_str("--- Histogram (log-spaced) ---\n");
        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let share = 100.0 * count as f64 / self.total as f64;
            s.push_str(&format!(
                "  {:>9.0} - {:<9.0} {:>10}  {:5.2}%\n",
                self.edges[i], self.edges[i + 1], count, share,
            ));
        }
        s
    }
}

/// Per-bin and population-level comparison of realized and expected levels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub mode: DistributionMode,
    pub master_seed: u64,
    pub n_users: usize,
    pub n_days: usize,
    pub users_per_bin: [usize; ActivityBin::COUNT],
    /// Mean of the per-user series means within each bin; 0 for empty bins.
    pub mean_per_bin: [f64; ActivityBin::COUNT],
    pub expected_mean: f64,
    pub realized_mean: f64,
    /// Spread of per-user mean levels across the population.
    pub user_mean_std_dev: f64,
    pub min_daily_sem: f64,
    pub max_daily_sem: f64,
}

impl PopulationSummary {
    pub fn compute(population: &Population, days: &[DayAggregate]) -> Self {
        let mut per_bin = [RunningMoments::new(); ActivityBin::COUNT];
        let mut user_means = RunningMoments::new();
        for series in &population.series {
            let mean = series_mean(&series.steps);
            per_bin[series.profile.bin.index()].push(mean);
            user_means.push(mean);
        }

        let sems = days.iter().map(|d| d.std_error_of_mean);
        let min_daily_sem = sems.clone().fold(f64::INFINITY, f64::min);
        let max_daily_sem = sems.fold(0.0, f64::max);

        Self {
            mode: population.mode,
            master_seed: population.master_seed,
            n_users: population.n_users(),
            n_days: population.n_days(),
            users_per_bin: per_bin.map(|m| m.count as usize),
            mean_per_bin: per_bin.map(|m| m.mean),
            expected_mean: population.mode.expected_mean(),
            realized_mean: population.realized_mean(),
            user_mean_std_dev: user_means.std_dev(),
            min_daily_sem: if days.is_empty() { 0.0 } else { min_daily_sem },
            max_daily_sem,
        }
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Population Summary ===\n\n");
        s.push_str(&format!("  Mode:            {}\n", self.mode));
        s.push_str(&format!("  Seed:            {}\n", self.master_seed));
        s.push_str(&format!("  Users x days:    {} x {}\n", self.n_users, self.n_days));
        s.push_str(&format!("  Expected mean:   {:.1} steps/day\n", self.expected_mean));
        s.push_str(&format!("  Realized mean:   {:.1} steps/day\n", self.realized_mean));
        s.push_str(&format!("  User level sd:   {:.1}\n", self.user_mean_std_dev));
        s.push_str(&format!(
            "  Daily SEM:       {:.2} to {:.2}\n\n",
            self.min_daily_sem, self.max_daily_sem,
        ));

        s.push_str("--- Activity Bins ---\n");
        for bin in ActivityBin::all() {
            let i = bin.index();
            let share = 100.0 * self.users_per_bin[i] as f64 / self.n_users.max(1) as f64;
            s.push_str(&format!(
                "  {:>2} (target {:>5.0}): {:>8} users {:5.1}%  mean {:.1}\n",
                bin, bin.target_mean(), self.users_per_bin[i], share, self.mean_per_bin[i],
            ));
        }
        s
    }
}
