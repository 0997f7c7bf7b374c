//! Configuration for a generation run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity::DistributionMode;
use crate::error::ConfigError;
use crate::population::calendar::DAY_MS;
use crate::seeds::GenerationSeeds;

/// 2016-12-12T00:00:00Z, the default first generated day.
pub const DEFAULT_START_MS: i64 = 1_481_500_800_000;

/// Parameters for population generation and storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of synthetic users.
    pub n_users: usize,

    /// Number of consecutive days of steps per user.
    pub n_days: usize,

    /// Timestamp (ms since the Unix epoch, UTC) of the first day.
    pub start_timestamp_ms: i64,

    /// Table(s) activity bins are drawn from.
    pub distribution_mode: DistributionMode,

    /// Master seed. A random seed is picked when absent.
    pub seed: Option<u64>,

    /// Worker threads for generation. Uses the global rayon pool when absent.
    pub threads: Option<usize>,

    /// Step documents per bulk insert.
    pub batch_size: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            n_users: 10_000,
            n_days: 365,
            start_timestamp_ms: DEFAULT_START_MS,
            distribution_mode: DistributionMode::Pooled,
            seed: None,
            threads: None,
            batch_size: 50_000,
        }
    }
}

impl GenerationConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// `distribution_mode` accepts the same spellings as the command line, and
    /// an unrecognized name is reported as [`ConfigError::UnknownMode`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let unreadable = |reason: String| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason,
        };
        let contents = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let mut value: Value = serde_json::from_str(&contents).map_err(|e| unreadable(e.to_string()))?;
        if let Some(slot) = value.get_mut("distribution_mode") {
            if let Some(name) = slot.as_str() {
                let mode: DistributionMode = name.parse()?;
                *slot = Value::String(mode.label().to_string());
            }
        }
        let config: Self = serde_json::from_value(value).map_err(|e| unreadable(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter before any sampling starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_users == 0 {
            return Err(ConfigError::NoUsers);
        }
        if self.n_days == 0 {
            return Err(ConfigError::NoDays);
        }
        if self.threads == Some(0) {
            return Err(ConfigError::NoThreads);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::EmptyBatch);
        }

        let span = (self.n_days as i64 - 1).checked_mul(DAY_MS);
        if span.and_then(|s| self.start_timestamp_ms.checked_add(s)).is_none() {
            return Err(ConfigError::CalendarOverflow {
                start_ms: self.start_timestamp_ms,
                n_days: self.n_days,
            });
        }
        Ok(())
    }

    /// Seeds for this run, drawing a fresh master seed if none is configured.
    pub fn seeds(&self) -> GenerationSeeds {
        match self.seed {
            Some(seed) => GenerationSeeds::from_master(seed),
            None => GenerationSeeds::default(),
        }
    }

    /// Total number of step values the run produces.
    pub fn total_steps(&self) -> usize {
        self.n_users.saturating_mul(self.n_days)
    }
}
