use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{primary_key, Record};
use crate::store::Store;

/// Errors produced by persistence adapters. Every failure aborts the whole
/// requested operation; there is no local recovery or partial-success
/// reporting anywhere in the contract.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No file (or entry) exists for the requested record.
    #[error("record not found: {path}")]
    NotFound { path: String },
    /// The base directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Underlying read, write, delete, or listing failure.
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Malformed JSON, either a record document or an encryption envelope.
    #[error("malformed record file {path}: {reason}")]
    Parse { path: String, reason: String },
    /// The cipher rejected the file contents (wrong key or tampered data).
    #[error("decryption failed for {path}")]
    Decrypt { path: String },
    /// Configured cipher key material is unusable.
    #[error("invalid cipher key: {reason}")]
    InvalidCipherKey { reason: String },
    /// A record has no usable value under the store's key field.
    #[error("record has no usable value for key field {field:?}")]
    MissingKey { field: String },
    /// `set` with an explicit key was invoked without a record payload.
    #[error("set with an explicit key requires a record payload")]
    MissingPayload,
    /// Store-side failure (export or in-memory state).
    #[error("storage failure: {reason}")]
    Storage { reason: String },
    /// Operation name outside `get`/`set`/`remove`.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Operation kinds a store may request from its persistence adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    Remove,
}

impl FromStr for Operation {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Operation::Get),
            "set" => Ok(Operation::Set),
            "remove" => Ok(Operation::Remove),
            other => Err(AdapterError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Successful result of an adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOutcome {
    /// Single record, from `get` with a key.
    Record(Record),
    /// All of a store's records, from whole-store `get`. Ordering follows
    /// the backing listing and is not guaranteed.
    Records(Vec<Record>),
    /// Success marker for `set` and `remove`.
    Done,
}

/// Contract between a record store and a persistence backend. A present
/// `key` scopes the call to one record; an absent `key` covers the whole
/// store. `data` carries the record for a keyed `set` and is ignored
/// otherwise (whole-store `set` pulls from `store.export()`).
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn call(
        &self,
        store: &dyn Store,
        op: Operation,
        key: Option<&str>,
        data: Option<Record>,
    ) -> Result<AdapterOutcome, AdapterError>;
}

/// Adapter double that keeps record files in a map instead of a
/// filesystem, for host-store tests and smoke runs. Entries are keyed by
/// the same `<store id>_<key>.json` names a file-backed adapter would use.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    entries: Mutex<HashMap<String, Record>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_name(store_id: &str, key: &str) -> String {
        format!("{store_id}_{key}.json")
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    async fn call(
        &self,
        store: &dyn Store,
        op: Operation,
        key: Option<&str>,
        data: Option<Record>,
    ) -> Result<AdapterOutcome, AdapterError> {
        let mut entries = self.entries.lock().map_err(|err| AdapterError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        let prefix = format!("{}_", store.id());

        match (op, key) {
            (Operation::Get, Some(k)) => {
                let name = Self::entry_name(store.id(), k);
                let record = entries
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| AdapterError::NotFound { path: name })?;
                Ok(AdapterOutcome::Record(record))
            }
            (Operation::Get, None) => {
                let records = entries
                    .iter()
                    .filter(|(name, _)| name.starts_with(&prefix))
                    .map(|(_, record)| record.clone())
                    .collect();
                Ok(AdapterOutcome::Records(records))
            }
            (Operation::Set, Some(k)) => {
                let record = data.ok_or(AdapterError::MissingPayload)?;
                entries.insert(Self::entry_name(store.id(), k), record);
                Ok(AdapterOutcome::Done)
            }
            (Operation::Set, None) => {
                for record in store.export()? {
                    let k = primary_key(&record, store.key_field())?;
                    entries.insert(Self::entry_name(store.id(), &k), record);
                }
                Ok(AdapterOutcome::Done)
            }
            (Operation::Remove, Some(k)) => {
                let name = Self::entry_name(store.id(), k);
                if entries.remove(&name).is_none() {
                    return Err(AdapterError::NotFound { path: name });
                }
                Ok(AdapterOutcome::Done)
            }
            (Operation::Remove, None) => {
                entries.retain(|name, _| !name.starts_with(&prefix));
                Ok(AdapterOutcome::Done)
            }
        }
    }
}
