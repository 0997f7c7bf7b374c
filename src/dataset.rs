//! The complete output of a run: population plus its daily aggregates.

use crate::aggregation::{aggregate_days, DayAggregate};
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::persistence::{store_population, DocumentStore, StoreReport};
use crate::population::{generate, Population, UserIdentity};

#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub population: Population,
    pub days: Vec<DayAggregate>,
}

impl Dataset {
    /// Generate a population and aggregate it in memory.
    pub fn generate(config: &GenerationConfig) -> Result<Self> {
        let population = generate(config)?;
        let days = aggregate_days(&population);
        Ok(Self { population, days })
    }

    pub fn identities(&self) -> &[UserIdentity] {
        &self.population.identities
    }

    pub fn step_matrix(&self) -> Vec<&[u32]> {
        self.population.step_matrix()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.population.calendar.timestamps().collect()
    }

    /// Write everything to `store`, replacing what it held.
    pub fn store(&self, store: &mut dyn DocumentStore, batch_size: usize) -> Result<StoreReport> {
        Ok(store_population(store, &self.population, &self.days, batch_size)?)
    }
}
