//! Directory-backed store: one JSON-lines file per collection.
//!
//! `<dir>/<collection>.jsonl` holds one document per line. Index definitions
//! are recorded in `<dir>/indexes.json` for whatever loads the files later.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{DocumentStore, StoreError};

const INDEX_FILE: &str = "indexes.json";

pub struct JsonLinesStore {
    dir: PathBuf,
}

impl JsonLinesStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `collection`.
    pub fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(self.dir.join(format!("{}.jsonl", collection)))
    }

    /// Read every document of `collection` back. Missing collections are empty.
    pub fn read_collection(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(collection)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        fs::read_to_string(path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }

    /// Indexed fields per collection.
    pub fn read_indexes(&self) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        let path = self.dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

impl DocumentStore for JsonLinesStore {
    fn reset(&mut self, collection: &str) -> Result<(), StoreError> {
        File::create(self.collection_path(collection)?)?;
        Ok(())
    }

    fn create_index(&mut self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.collection_path(collection)?;
        let mut indexes = self.read_indexes()?;
        let fields = indexes.entry(collection.to_string()).or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
        fs::write(self.dir.join(INDEX_FILE), serde_json::to_string_pretty(&indexes)?)?;
        Ok(())
    }

    fn insert_many(&mut self, collection: &str, docs: &[Value]) -> Result<(), StoreError> {
        // Serialize first so a bad document leaves the file untouched.
        let mut buf = Vec::new();
        for doc in docs {
            serde_json::to_writer(&mut buf, doc)?;
            buf.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.collection_path(collection)?)?;
        let len = file.metadata()?.len();
        write_or_rollback(&mut file, &buf, |f| f.set_len(len))
    }
}

/// Write all of `buf`, undoing a partial write with `rollback` on failure.
fn write_or_rollback<W: Write>(
    out: &mut W,
    buf: &[u8],
    rollback: impl FnOnce(&mut W) -> io::Result<()>,
) -> Result<(), StoreError> {
    if let Err(e) = out.write_all(buf).and_then(|()| out.flush()) {
        rollback(out)?;
        return Err(e.into());
    }
    Ok(())
}
