//! Synthetic daily step-count generation library
//!
//! Generates a population of users with realistic daily step series and
//! summarizes every day with mean and standard error of the mean.

pub mod activity;
pub mod aggregation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod persistence;
pub mod population;
pub mod sampler;
pub mod seeds;

pub use config::GenerationConfig;
pub use dataset::Dataset;
pub use error::{ConfigError, Error, Result};
