use std::sync::Mutex;

use crate::adapter::AdapterError;
use crate::record::{primary_key, Record};

/// Handle a persistence adapter receives from the host store: identity, the
/// primary-key field name, and a snapshot of the current records. Indexing,
/// querying, and versioning stay on the host side.
pub trait Store: Send + Sync {
    /// Identifier used as the file-name prefix for this store's records.
    fn id(&self) -> &str;

    /// Name of the field holding each record's primary key.
    fn key_field(&self) -> &str;

    /// Export all current records as an ordered sequence.
    fn export(&self) -> Result<Vec<Record>, AdapterError>;
}

/// In-memory store that stands in for a full host store in tests and the
/// CLI. Records keep insertion order; `insert` replaces the record whose
/// primary key matches.
pub struct InMemoryStore {
    id: String,
    key_field: String,
    records: Mutex<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new(id: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key_field: key_field.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Insert a record, replacing any existing record with the same
    /// primary-key value. Fails if the record has no usable key.
    pub fn insert(&self, record: Record) -> Result<(), AdapterError> {
        let key = primary_key(&record, &self.key_field)?;
        let mut records = self.records.lock().map_err(|err| AdapterError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;

        let existing = records
            .iter_mut()
            .find(|r| primary_key(r, &self.key_field).is_ok_and(|k| k == key));
        match existing {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
        Ok(())
    }
}

impl Store for InMemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn key_field(&self) -> &str {
        &self.key_field
    }

    fn export(&self) -> Result<Vec<Record>, AdapterError> {
        let records = self.records.lock().map_err(|err| AdapterError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(records.clone())
    }
}
