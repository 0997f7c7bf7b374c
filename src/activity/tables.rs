//! Activity bin probability tables.
//!
//! Share of the surveyed population in each daily-steps bin, overall and split by
//! sex. Bin `b` covers (b * 1000, (b + 1) * 1000] steps per day.
//! Source: activity inequality study, obesity_by_steps_gender_20170508.csv.

use rand::Rng;

use super::ActivityBin;

/// Probability that a gender-conditioned user is male (158985 / 297268).
pub const P_MALE: f64 = 0.534820431;

/// Probability that a gender-conditioned user is female (138283 / 297268).
pub const P_FEMALE: f64 = 0.465179569;

/// Tolerance used when validating that a table sums to one.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// A categorical distribution over the ten activity bins.
#[derive(Debug, PartialEq)]
pub struct ActivityTable {
    pub name: &'static str,
    /// `probabilities[i]` is the probability of bin `i + 1`.
    pub probabilities: [f64; ActivityBin::COUNT],
}

pub static POOLED: ActivityTable = ActivityTable {
    name: "pooled",
    probabilities: [
        0.071702975, 0.131948276, 0.169207584, 0.172958408, 0.148552821,
        0.115283179, 0.082077452, 0.054402088, 0.033390745, 0.020476472,
    ],
};

pub static MALE: ActivityTable = ActivityTable {
    name: "male",
    probabilities: [
        0.042626663, 0.093549706, 0.145636381, 0.173374847, 0.164801711,
        0.135553669, 0.101978174, 0.070144982, 0.044771519, 0.027562349,
    ],
};

pub static FEMALE: ActivityTable = ActivityTable {
    name: "female",
    probabilities: [
        0.105132229, 0.176095399, 0.196307572, 0.172479625, 0.129871351,
        0.091978045, 0.059197443, 0.036302365, 0.020306184, 0.012329787,
    ],
};

impl ActivityTable {
    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Whether the probabilities sum to one within [`SUM_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= SUM_TOLERANCE
    }

    pub fn probability(&self, bin: ActivityBin) -> f64 {
        self.probabilities[bin.index()]
    }

    /// Mean steps/day of a population drawn from this table.
    pub fn expected_mean(&self) -> f64 {
        ActivityBin::all()
            .map(|bin| self.probability(bin) * bin.target_mean())
            .sum()
    }

    /// Draw one bin.
    pub fn sample(&self, rng: &mut impl Rng) -> ActivityBin {
        let mut roll: f64 = rng.gen_range(0.0..self.total());
        for bin in ActivityBin::all() {
            roll -= self.probability(bin);
            if roll < 0.0 {
                return bin;
            }
        }
        // Rounding can leave a sliver of mass past the last bin.
        ActivityBin::MAX
    }
}
