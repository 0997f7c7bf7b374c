//! Persistence of generated data.
//!
//! The storage backend sits behind [`DocumentStore`], which needs only three
//! capabilities: clear a collection, index one field, and bulk-insert
//! documents. Statistics are computed in memory before anything is written,
//! so nothing is ever read back from the store.

pub mod documents;
pub mod jsonl;
pub mod memory;

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::aggregation::DayAggregate;
use crate::population::Population;
pub use documents::{DayDocument, StepDocument, UserDocument, DAYS, STEPS, STEPS_DATE_FIELD, USERS};
pub use jsonl::JsonLinesStore;
pub use memory::MemoryStore;

/// Errors raised by a store. The caller decides whether to retry.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),
}

/// A document database the generator can write to.
pub trait DocumentStore {
    /// Remove every document from `collection`. Clearing an empty or missing
    /// collection succeeds.
    fn reset(&mut self, collection: &str) -> Result<(), StoreError>;

    /// Index `collection` on a single numeric field.
    fn create_index(&mut self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Insert `docs`. An error means the batch should be treated as not stored.
    fn insert_many(&mut self, collection: &str, docs: &[Value]) -> Result<(), StoreError>;
}

/// Documents written by [`store_population`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub users: usize,
    pub steps: usize,
    pub days: usize,
    pub step_batches: usize,
}

fn to_values<T: Serialize>(docs: impl IntoIterator<Item = T>) -> Result<Vec<Value>, StoreError> {
    docs.into_iter()
        .map(|d| serde_json::to_value(d).map_err(StoreError::from))
        .collect()
}

/// Replace the store's contents with `population` and its daily `aggregates`.
///
/// Step documents are built and inserted `batch_size` at a time, so the full
/// set is never held in memory at once.
pub fn store_population(
    store: &mut dyn DocumentStore,
    population: &Population,
    aggregates: &[DayAggregate],
    batch_size: usize,
) -> Result<StoreReport, StoreError> {
    let batch_size = batch_size.max(1);
    let mut report = StoreReport::default();

    info!("setting up collections");
    for collection in [USERS, STEPS, DAYS] {
        store.reset(collection)?;
    }
    store.create_index(STEPS, STEPS_DATE_FIELD)?;

    let start = Instant::now();
    let users = to_values(population.identities.iter().map(UserDocument::from))?;
    store.insert_many(USERS, &users)?;
    report.users = users.len();
    info!("inserted {} users in {:.2?}", report.users, start.elapsed());

    let start = Instant::now();
    let days = population.calendar.days();
    let mut batch: Vec<Value> = Vec::with_capacity(batch_size.min(population.n_users() * days.len()));
    for series in &population.series {
        for doc in StepDocument::for_series(series, days) {
            batch.push(serde_json::to_value(doc)?);
            if batch.len() == batch_size {
                store.insert_many(STEPS, &batch)?;
                report.steps += batch.len();
                report.step_batches += 1;
                batch.clear();
            }
        }
    }
    if !batch.is_empty() {
        store.insert_many(STEPS, &batch)?;
        report.steps += batch.len();
        report.step_batches += 1;
    }
    info!(
        "inserted {} step documents in {} batches in {:.2?}",
        report.steps, report.step_batches, start.elapsed(),
    );

    let start = Instant::now();
    let day_docs = to_values(aggregates.iter().map(DayDocument::from))?;
    store.insert_many(DAYS, &day_docs)?;
    report.days = day_docs.len();
    info!("inserted {} day summaries in {:.2?}", report.days, start.elapsed());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate_days;
    use crate::config::GenerationConfig;
    use crate::population::generate;

    fn population() -> Population {
        generate(&GenerationConfig {
            n_users: 7,
            n_days: 4,
            seed: Some(3),
            ..GenerationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_store_population_writes_every_collection() {
        let population = population();
        let days = aggregate_days(&population);
        let mut store = MemoryStore::new();

        let report = store_population(&mut store, &population, &days, 5).unwrap();

        assert_eq!(report, StoreReport { users: 7, steps: 28, days: 4, step_batches: 6 });
        assert_eq!(store.collection(USERS).len(), 7);
        assert_eq!(store.collection(STEPS).len(), 28);
        assert_eq!(store.collection(DAYS).len(), 4);
        assert_eq!(store.indexes(STEPS), &[STEPS_DATE_FIELD.to_string()]);
    }

    #[test]
    fn test_stored_days_match_steps() {
        let population = population();
        let days = aggregate_days(&population);
        let mut store = MemoryStore::new();
        store_population(&mut store, &population, &days, 100).unwrap();

        for day in store.collection(DAYS) {
            let doc: DayDocument = serde_json::from_value(day.clone()).unwrap();
            let steps: Vec<u32> = store
                .find_eq(STEPS, STEPS_DATE_FIELD, &Value::from(doc.date_ms))
                .map(|d| d["steps"].as_u64().unwrap() as u32)
                .collect();

            assert_eq!(steps.len(), 7);
            assert_eq!(DayAggregate::from(&doc), DayAggregate::from_values(doc.date_ms, &steps));
        }
    }

    #[test]
    fn test_store_population_replaces_previous_run() {
        let population = population();
        let days = aggregate_days(&population);
        let mut store = MemoryStore::new();

        store_population(&mut store, &population, &days, 10).unwrap();
        store_population(&mut store, &population, &days, 10).unwrap();

        assert_eq!(store.collection(USERS).len(), 7);
        assert_eq!(store.collection(STEPS).len(), 28);
        assert_eq!(store.indexes(STEPS).len(), 1);
    }

    #[test]
    fn test_user_documents_carry_ids() {
        let population = population();
        let mut store = MemoryStore::new();
        store_population(&mut store, &population, &[], 10).unwrap();

        let first = &store.collection(USERS)[0];
        assert_eq!(first["_id"], Value::from(population.identities[0].id.to_string()));
        assert_eq!(first["email"], Value::from("0@gmail.com"));
        assert_eq!(store.collection(DAYS).len(), 0);
    }
}
