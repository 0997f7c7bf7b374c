//! In-memory document store.

use std::collections::HashMap;

use serde_json::Value;

use super::{DocumentStore, StoreError};

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Value>>,
    indexes: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents of `collection` in insertion order; empty if it does not exist.
    pub fn collection(&self, collection: &str) -> &[Value] {
        self.collections.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indexed fields of `collection`.
    pub fn indexes(&self, collection: &str) -> &[String] {
        self.indexes.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents of `collection` whose `field` equals `value`.
    pub fn find_eq<'a>(
        &'a self,
        collection: &str,
        field: &'a str,
        value: &'a Value,
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.collection(collection)
            .iter()
            .filter(move |doc| doc.get(field) == Some(value))
    }
}

impl DocumentStore for MemoryStore {
    fn reset(&mut self, collection: &str) -> Result<(), StoreError> {
        self.collections.entry(collection.to_string()).or_default().clear();
        Ok(())
    }

    fn create_index(&mut self, collection: &str, field: &str) -> Result<(), StoreError> {
        let fields = self.indexes.entry(collection.to_string()).or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
        Ok(())
    }

    fn insert_many(&mut self, collection: &str, docs: &[Value]) -> Result<(), StoreError> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(docs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_reset_and_find() {
        let mut store = MemoryStore::new();
        store.insert_many("steps", &[json!({ "d": 1 }), json!({ "d": 2 }), json!({ "d": 1 })]).unwrap();

        assert_eq!(store.collection("steps").len(), 3);
        assert_eq!(store.find_eq("steps", "d", &json!(1)).count(), 2);
        assert!(store.collection("missing").is_empty());

        store.reset("steps").unwrap();
        store.reset("steps").unwrap();
        assert!(store.collection("steps").is_empty());
    }

    #[test]
    fn test_index_is_idempotent() {
        let mut store = MemoryStore::new();
        store.create_index("steps", "startDateInUTC").unwrap();
        store.create_index("steps", "startDateInUTC").unwrap();
        assert_eq!(store.indexes("steps").len(), 1);
    }
}
