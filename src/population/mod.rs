//! Population generation.
//!
//! Builds every user independently: identity, activity profile and step series
//! each come from the user's own seeded stream, so users can be generated on any
//! number of worker threads and the result is the same.

pub mod calendar;
pub mod identity;

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activity::{classify, ActivityBin, ActivityProfile, DistributionMode};
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::sampler::sample_series;
use crate::seeds::GenerationSeeds;
pub use calendar::{Calendar, CalendarDay, DAY_MS};
pub use identity::{UserId, UserIdentity, UserProfile};

/// One user's daily steps, in calendar order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSeries {
    pub user: UserId,
    pub profile: ActivityProfile,
    pub steps: Vec<u32>,
}

/// A complete generated dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub mode: DistributionMode,
    pub master_seed: u64,
    pub calendar: Calendar,
    pub identities: Vec<UserIdentity>,
    /// `series[i]` belongs to `identities[i]`.
    pub series: Vec<UserSeries>,
}

impl Population {
    pub fn n_users(&self) -> usize {
        self.series.len()
    }

    pub fn n_days(&self) -> usize {
        self.calendar.len()
    }

    /// The N x D step matrix, one row per user.
    pub fn step_matrix(&self) -> Vec<&[u32]> {
        self.series.iter().map(|s| s.steps.as_slice()).collect()
    }

    /// Every user's steps on one day.
    pub fn steps_on(&self, day: usize) -> impl Iterator<Item = u32> + '_ {
        self.series.iter().filter_map(move |s| s.steps.get(day).copied())
    }

    /// Number of users in each activity bin.
    pub fn bin_histogram(&self) -> [usize; ActivityBin::COUNT] {
        let mut counts = [0; ActivityBin::COUNT];
        for s in &self.series {
            counts[s.profile.bin.index()] += 1;
        }
        counts
    }

    /// Mean over all step values of the population.
    pub fn realized_mean(&self) -> f64 {
        let total: u64 = self.series.iter().flat_map(|s| &s.steps).map(|&x| x as u64).sum();
        let count = self.series.iter().map(|s| s.steps.len()).sum::<usize>();
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }
}

/// Validate `config` and generate a population with its seeds.
pub fn generate(config: &GenerationConfig) -> Result<Population> {
    config.validate()?;
    generate_with_seeds(config, &config.seeds())
}

/// Generate a population from explicit seeds.
///
/// Fails before any sampling if the configuration is invalid. Runs on a
/// dedicated pool when `config.threads` is set.
pub fn generate_with_seeds(config: &GenerationConfig, seeds: &GenerationSeeds) -> Result<Population> {
    config.validate()?;
    let calendar = Calendar::new(config.start_timestamp_ms, config.n_days)?;

    info!(
        users = config.n_users,
        days = config.n_days,
        mode = %config.distribution_mode,
        seed = seeds.master,
        "generating population"
    );
    let start = Instant::now();

    let build = || -> (Vec<UserIdentity>, Vec<UserSeries>) {
        (0..config.n_users)
            .into_par_iter()
            .map(|i| generate_user(i, config.distribution_mode, config.n_days, seeds))
            .unzip()
    };

    let (identities, series) = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(build),
        None => build(),
    };

    info!("generated {} users in {:.2?}", series.len(), start.elapsed());

    Ok(Population {
        mode: config.distribution_mode,
        master_seed: seeds.master,
        calendar,
        identities,
        series,
    })
}

/// Build one user from its own seeded streams.
pub fn generate_user(
    index: usize,
    mode: DistributionMode,
    n_days: usize,
    seeds: &GenerationSeeds,
) -> (UserIdentity, UserSeries) {
    let profile = classify(mode, &mut seeds.activity_rng(index));
    let identity = UserIdentity::generate(index, profile.sex, &mut seeds.identity_rng(index));
    let steps = sample_series(profile.bin, n_days, &mut seeds.series_rng(index));

    debug!(user = index, bin = profile.bin.get(), "sampled user");

    let series = UserSeries { user: identity.id, profile, steps };
    (identity, series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};
    use std::collections::HashSet;

    fn small_config(n_users: usize, n_days: usize) -> GenerationConfig {
        GenerationConfig {
            n_users,
            n_days,
            seed: Some(42),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_small_population_shapes() {
        let population = generate(&small_config(5, 3)).unwrap();

        assert_eq!(population.n_users(), 5);
        assert_eq!(population.n_days(), 3);
        assert_eq!(population.identities.len(), 5);

        let matrix = population.step_matrix();
        assert_eq!(matrix.len(), 5);
        assert!(matrix.iter().all(|row| row.len() == 3));

        let ts: Vec<i64> = population.calendar.timestamps().collect();
        assert_eq!(ts.len(), 3);
        for pair in ts.windows(2) {
            assert_eq!(pair[1] - pair[0], DAY_MS);
        }
    }

    #[test]
    fn test_series_belong_to_identities() {
        let population = generate(&small_config(20, 2)).unwrap();
        for (identity, series) in population.identities.iter().zip(&population.series) {
            assert_eq!(identity.id, series.user);
            assert_eq!(identity.sex, series.profile.sex);
        }
        assert_eq!(population.identities[3].profile.email, "3@gmail.com");
    }

    #[test]
    fn test_user_ids_unique() {
        let population = generate(&small_config(2_000, 1)).unwrap();
        let ids: HashSet<UserId> = population.identities.iter().map(|u| u.id).collect();
        assert_eq!(ids.len(), 2_000);
    }

    #[test]
    fn test_same_seed_same_population_any_thread_count() {
        let one = GenerationConfig { threads: Some(1), ..small_config(50, 10) };
        let four = GenerationConfig { threads: Some(4), ..small_config(50, 10) };

        assert_eq!(generate(&one).unwrap(), generate(&four).unwrap());
    }

    #[test]
    fn test_different_seed_different_population() {
        let a = generate(&small_config(10, 5)).unwrap();
        let b = generate(&GenerationConfig { seed: Some(43), ..small_config(10, 5) }).unwrap();
        assert_ne!(a.series, b.series);
    }

    #[test]
    fn test_bins_do_not_depend_on_day_count() {
        let short = generate(&small_config(30, 2)).unwrap();
        let long = generate(&small_config(30, 40)).unwrap();

        let bins = |p: &Population| p.series.iter().map(|s| s.profile.bin).collect::<Vec<_>>();
        assert_eq!(bins(&short), bins(&long));
    }

    #[test]
    fn test_invalid_config_fails_before_sampling() {
        let err = generate(&small_config(0, 3)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(ConfigError::NoUsers)));

        let err = generate(&small_config(3, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(ConfigError::NoDays)));
    }

    #[test]
    fn test_single_user_single_day() {
        let population = generate(&small_config(1, 1)).unwrap();
        assert_eq!(population.step_matrix(), vec![population.series[0].steps.as_slice()]);
        assert_eq!(population.steps_on(0).count(), 1);
        assert_eq!(population.steps_on(1).count(), 0);
    }

    #[test]
    fn test_bin_histogram_counts_every_user() {
        let population = generate(&small_config(500, 1)).unwrap();
        let histogram = population.bin_histogram();
        assert_eq!(histogram.iter().sum::<usize>(), 500);
        // Bins 3-5 dominate the pooled table.
        assert!(histogram[3] > histogram[9]);
    }

    #[test]
    fn test_gender_specific_population_records_sex() {
        let config = GenerationConfig {
            distribution_mode: DistributionMode::GenderSpecific,
            ..small_config(100, 2)
        };
        let population = generate(&config).unwrap();
        assert!(population.identities.iter().all(|u| u.sex.is_some()));
    }

    #[test]
    fn test_realized_mean_near_expected() {
        let population = generate(&small_config(2_000, 30)).unwrap();
        let expected = DistributionMode::Pooled.expected_mean();
        let realized = population.realized_mean();
        assert!((realized - expected).abs() / expected < 0.05, "realized {}, expected {}", realized, expected);
    }
}
