//! Error types shared across the crate.

use thiserror::Error;

use crate::persistence::StoreError;

/// Top-level error for a generation run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Rejected generation parameters. Raised before any sampling begins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("n_users must be positive")]
    NoUsers,

    #[error("n_days must be positive")]
    NoDays,

    #[error("unknown distribution mode '{0}' (expected pooled, male, female or gender_specific)")]
    UnknownMode(String),

    #[error("activity bin {0} is outside 1..=10")]
    BinOutOfRange(u8),

    #[error("thread count must be positive")]
    NoThreads,

    #[error("batch size must be positive")]
    EmptyBatch,

    #[error("calendar of {n_days} days from {start_ms} overflows the timestamp range")]
    CalendarOverflow { start_ms: i64, n_days: usize },

    #[error("could not read config file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
