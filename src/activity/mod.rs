//! Activity-type classification.
//!
//! Every synthetic user belongs to one of ten activity bins, each with a
//! canonical daily-steps target. A user's bin is drawn from a fixed categorical
//! table, optionally after drawing the user's sex.

pub mod tables;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
pub use tables::{ActivityTable, FEMALE, MALE, POOLED, P_FEMALE, P_MALE};

/// One of the ten daily-steps categories (1: ~1500 steps/day .. 10: >10000 steps/day).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ActivityBin(u8);

impl ActivityBin {
    pub const COUNT: usize = 10;
    pub const MIN: ActivityBin = ActivityBin(1);
    pub const MAX: ActivityBin = ActivityBin(10);

    pub fn new(bin: u8) -> Result<Self, ConfigError> {
        if (1..=Self::COUNT as u8).contains(&bin) {
            Ok(Self(bin))
        } else {
            Err(ConfigError::BinOutOfRange(bin))
        }
    }

    /// All bins in ascending order.
    pub fn all() -> impl Iterator<Item = ActivityBin> {
        (1..=Self::COUNT as u8).map(ActivityBin)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position, for indexing per-bin arrays.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Location of the untruncated step distribution (`bin * 1000`).
    pub fn location(self) -> f64 {
        self.0 as f64 * 1000.0
    }

    /// Mean steps/day a series of this bin is rescaled to (`bin * 1000 + 500`).
    pub fn target_mean(self) -> f64 {
        self.location() + 500.0
    }
}

impl TryFrom<u8> for ActivityBin {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActivityBin> for u8 {
    fn from(bin: ActivityBin) -> u8 {
        bin.0
    }
}

impl fmt::Display for ActivityBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Bernoulli draw over the surveyed male/female split.
    pub fn draw(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(P_MALE) {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn table(self) -> &'static ActivityTable {
        match self {
            Sex::Male => &MALE,
            Sex::Female => &FEMALE,
        }
    }
}

/// Which table(s) activity bins are drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// Whole-population table, no sex drawn.
    #[default]
    Pooled,
    /// Male table for every user.
    Male,
    /// Female table for every user.
    Female,
    /// Draw each user's sex first, then use that sex's table.
    GenderSpecific,
}

impl DistributionMode {
    pub fn all() -> &'static [DistributionMode] {
        &[
            DistributionMode::Pooled,
            DistributionMode::Male,
            DistributionMode::Female,
            DistributionMode::GenderSpecific,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            DistributionMode::Pooled => "pooled",
            DistributionMode::Male => "male",
            DistributionMode::Female => "female",
            DistributionMode::GenderSpecific => "gender_specific",
        }
    }

    /// Mean steps/day expected for a population generated in this mode.
    pub fn expected_mean(self) -> f64 {
        match self {
            DistributionMode::Pooled => POOLED.expected_mean(),
            DistributionMode::Male => MALE.expected_mean(),
            DistributionMode::Female => FEMALE.expected_mean(),
            DistributionMode::GenderSpecific => {
                P_MALE * MALE.expected_mean() + P_FEMALE * FEMALE.expected_mean()
            }
        }
    }
}

impl FromStr for DistributionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pooled" => Ok(DistributionMode::Pooled),
            "male" => Ok(DistributionMode::Male),
            "female" => Ok(DistributionMode::Female),
            "gender_specific" | "gender" => Ok(DistributionMode::GenderSpecific),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome of classifying one user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityProfile {
    /// Drawn only in gender-specific mode.
    pub sex: Option<Sex>,
    pub bin: ActivityBin,
}

/// Draw an activity profile for one user.
pub fn classify(mode: DistributionMode, rng: &mut impl Rng) -> ActivityProfile {
    match mode {
        DistributionMode::Pooled => ActivityProfile { sex: None, bin: POOLED.sample(rng) },
        DistributionMode::Male => ActivityProfile { sex: None, bin: MALE.sample(rng) },
        DistributionMode::Female => ActivityProfile { sex: None, bin: FEMALE.sample(rng) },
        DistributionMode::GenderSpecific => {
            let sex = Sex::draw(rng);
            ActivityProfile { sex: Some(sex), bin: sex.table().sample(rng) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_bin_bounds() {
        assert!(ActivityBin::new(0).is_err());
        assert!(ActivityBin::new(11).is_err());
        assert_eq!(ActivityBin::new(1).unwrap(), ActivityBin::MIN);
        assert_eq!(ActivityBin::new(10).unwrap(), ActivityBin::MAX);
        assert_eq!(ActivityBin::all().count(), ActivityBin::COUNT);
    }

    #[test]
    fn test_target_means() {
        assert_eq!(ActivityBin::MIN.target_mean(), 1500.0);
        assert_eq!(ActivityBin::MAX.target_mean(), 10500.0);
        assert_eq!(ActivityBin::new(4).unwrap().location(), 4000.0);
    }

    #[test]
    fn test_mode_parsing() {
        for mode in DistributionMode::all() {
            assert_eq!(mode.label().parse::<DistributionMode>().unwrap(), *mode);
        }
        assert_eq!("Gender-Specific".parse::<DistributionMode>().unwrap(), DistributionMode::GenderSpecific);
        assert_eq!(
            "walking".parse::<DistributionMode>(),
            Err(ConfigError::UnknownMode("walking".to_string())),
        );
    }

    #[test]
    fn test_classify_reproducible() {
        let draw = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..50)
                .map(|_| classify(DistributionMode::GenderSpecific, &mut rng))
                .collect::<Vec<_>>()
        };

        assert_eq!(draw(3), draw(3));
    }

    #[test]
    fn test_sex_only_drawn_in_gender_specific_mode() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            assert!(classify(DistributionMode::Pooled, &mut rng).sex.is_none());
            assert!(classify(DistributionMode::Male, &mut rng).sex.is_none());
            assert!(classify(DistributionMode::GenderSpecific, &mut rng).sex.is_some());
        }
    }

    fn assert_frequencies(bins: &[ActivityBin], table: &ActivityTable) {
        let mut counts = [0usize; ActivityBin::COUNT];
        for bin in bins {
            counts[bin.index()] += 1;
        }
        for bin in ActivityBin::all() {
            let freq = counts[bin.index()] as f64 / bins.len() as f64;
            let expected = table.probability(bin);
            assert!(
                (freq - expected).abs() < 0.005,
                "{} bin {}: {} vs {}",
                table.name,
                bin,
                freq,
                expected,
            );
        }
    }

    #[test]
    fn test_single_sex_modes_use_their_table() {
        let draws = 200_000;
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        let male: Vec<_> = (0..draws)
            .map(|_| classify(DistributionMode::Male, &mut rng).bin)
            .collect();
        assert_frequencies(&male, &MALE);

        let female: Vec<_> = (0..draws)
            .map(|_| classify(DistributionMode::Female, &mut rng).bin)
            .collect();
        assert_frequencies(&female, &FEMALE);
    }

    #[test]
    fn test_gender_specific_draws_from_drawn_sex_table() {
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let mut male = Vec::new();
        let mut female = Vec::new();
        for _ in 0..400_000 {
            let profile = classify(DistributionMode::GenderSpecific, &mut rng);
            match profile.sex {
                Some(Sex::Male) => male.push(profile.bin),
                Some(Sex::Female) => female.push(profile.bin),
                None => panic!("gender-specific profile without a sex"),
            }
        }

        assert_frequencies(&male, &MALE);
        assert_frequencies(&female, &FEMALE);
        assert_eq!(Sex::Male.table().name, MALE.name);
        assert_eq!(Sex::Female.table().name, FEMALE.name);
    }

    #[test]
    fn test_gender_split_matches_survey() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let draws = 100_000;
        let males = (0..draws)
            .filter(|_| Sex::draw(&mut rng) == Sex::Male)
            .count();

        let share = males as f64 / draws as f64;
        assert!((share - P_MALE).abs() < 0.01, "male share {}", share);
    }

    #[test]
    fn test_bin_serializes_as_number() {
        let json = serde_json::to_string(&ActivityBin::new(7).unwrap()).unwrap();
        assert_eq!(json, "7");
        assert!(serde_json::from_str::<ActivityBin>("12").is_err());
    }
}
