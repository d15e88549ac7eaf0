use std::env;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use satchel_core::adapter::{AdapterError, AdapterOutcome, Operation, PersistenceAdapter};
use satchel_core::record::Record;
use satchel_core::store::Store;
use tracing::instrument;

use crate::codec::{CipherKey, Codec};
use crate::files;
use crate::paths;

/// Configuration for the filesystem adapter.
#[derive(Debug, Clone, Default)]
pub struct FsConfig {
    /// Directory holding the record files; the system temp directory
    /// when unset.
    pub directory: Option<PathBuf>,
    /// Base64 256-bit key enabling encryption at rest; unset or empty
    /// means plaintext files.
    pub cipher_key: Option<String>,
}

/// Filesystem-backed persistence: each record lives in its own
/// `<store id>_<key>.json` file under the configured directory.
#[derive(Debug)]
pub struct FsAdapter {
    directory: PathBuf,
    codec: Codec,
}

impl FsAdapter {
    /// Build an adapter from configuration. Fails only when the
    /// configured cipher key is unusable.
    pub fn new(config: FsConfig) -> Result<Self, AdapterError> {
        let directory = config.directory.unwrap_or_else(env::temp_dir);
        let key = match config.cipher_key.as_deref() {
            None | Some("") => None,
            Some(encoded) => Some(CipherKey::from_base64(encoded)?),
        };

        Ok(Self {
            directory,
            codec: Codec::new(key),
        })
    }

    /// Directory the adapter reads and writes, resolved from config.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, store_id: &str, key: &str) -> PathBuf {
        self.directory.join(paths::record_file_name(store_id, key))
    }
}

#[async_trait]
impl PersistenceAdapter for FsAdapter {
    #[instrument(skip_all, fields(store = store.id(), op = %op, key))]
    async fn call(
        &self,
        store: &dyn Store,
        op: Operation,
        key: Option<&str>,
        data: Option<Record>,
    ) -> Result<AdapterOutcome, AdapterError> {
        files::ensure_dir(&self.directory).await?;

        match (op, key) {
            (Operation::Get, Some(key)) => {
                let path = self.record_path(store.id(), key);
                let record = files::read_one(&path, &self.codec).await?;
                Ok(AdapterOutcome::Record(record))
            }
            (Operation::Get, None) => {
                let records = files::read_all(&self.directory, store.id(), &self.codec).await?;
                Ok(AdapterOutcome::Records(records))
            }
            (Operation::Set, Some(key)) => {
                let record = data.ok_or(AdapterError::MissingPayload)?;
                let path = self.record_path(store.id(), key);
                files::write_one(&path, &self.codec, &record).await?;
                Ok(AdapterOutcome::Done)
            }
            (Operation::Set, None) => {
                let records = store.export()?;
                files::write_all(
                    &self.directory,
                    store.id(),
                    store.key_field(),
                    &self.codec,
                    &records,
                )
                .await?;
                Ok(AdapterOutcome::Done)
            }
            (Operation::Remove, Some(key)) => {
                files::delete_one(&self.record_path(store.id(), key)).await?;
                Ok(AdapterOutcome::Done)
            }
            (Operation::Remove, None) => {
                files::delete_all(&self.directory, store.id()).await?;
                Ok(AdapterOutcome::Done)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use satchel_core::store::InMemoryStore;
    use serde_json::json;

    use super::*;

    fn record(guid: &str, yay: bool) -> Record {
        match json!({"guid": guid, "yay": yay}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new("abc", "guid");
        store.insert(record("abc", true)).expect("insert");
        store.insert(record("def", false)).expect("insert");
        store
    }

    fn plain_adapter(dir: &Path) -> FsAdapter {
        FsAdapter::new(FsConfig {
            directory: Some(dir.to_path_buf()),
            cipher_key: None,
        })
        .expect("adapter")
    }

    fn keyed_adapter(dir: &Path, key: &str) -> FsAdapter {
        FsAdapter::new(FsConfig {
            directory: Some(dir.to_path_buf()),
            cipher_key: Some(key.to_string()),
        })
        .expect("adapter")
    }

    fn records_of(outcome: AdapterOutcome) -> Vec<Record> {
        match outcome {
            AdapterOutcome::Records(mut records) => {
                records.sort_by_key(|r| r["guid"].as_str().map(String::from));
                records
            }
            other => panic!("expected records, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persists_and_restores_a_whole_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = plain_adapter(dir.path());
        let store = seeded_store();

        adapter
            .call(&store, Operation::Set, None, None)
            .await
            .expect("set");
        assert!(dir.path().join("abc_abc.json").is_file());
        assert!(dir.path().join("abc_def.json").is_file());

        let outcome = adapter
            .call(&store, Operation::Get, None, None)
            .await
            .expect("get");
        assert_eq!(
            records_of(outcome),
            vec![record("abc", true), record("def", false)]
        );

        adapter
            .call(&store, Operation::Remove, Some("abc"), None)
            .await
            .expect("remove");
        let outcome = adapter
            .call(&store, Operation::Get, None, None)
            .await
            .expect("get");
        assert_eq!(records_of(outcome), vec![record("def", false)]);
    }

    #[tokio::test]
    async fn keyed_set_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = plain_adapter(dir.path());
        let store = InMemoryStore::new("abc", "guid");

        adapter
            .call(&store, Operation::Set, Some("abc"), Some(record("abc", true)))
            .await
            .expect("set");
        let outcome = adapter
            .call(&store, Operation::Get, Some("abc"), None)
            .await
            .expect("get");
        assert_eq!(outcome, AdapterOutcome::Record(record("abc", true)));
    }

    #[tokio::test]
    async fn keyed_set_requires_a_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = plain_adapter(dir.path());
        let store = InMemoryStore::new("abc", "guid");

        let err = adapter
            .call(&store, Operation::Set, Some("abc"), None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, AdapterError::MissingPayload));
    }

    #[tokio::test]
    async fn missing_records_surface_as_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = plain_adapter(dir.path());
        let store = InMemoryStore::new("abc", "guid");

        let err = adapter
            .call(&store, Operation::Get, Some("ghost"), None)
            .await
            .expect_err("get");
        assert!(matches!(err, AdapterError::NotFound { .. }));

        let err = adapter
            .call(&store, Operation::Remove, Some("ghost"), None)
            .await
            .expect_err("remove");
        assert!(matches!(err, AdapterError::NotFound { .. }));
    }

    #[tokio::test]
    async fn creates_the_directory_on_first_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("store").join("data");
        let adapter = plain_adapter(&nested);
        let store = InMemoryStore::new("abc", "guid");

        let outcome = adapter
            .call(&store, Operation::Get, None, None)
            .await
            .expect("get");
        assert_eq!(outcome, AdapterOutcome::Records(Vec::new()));
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn encrypts_files_at_rest_when_key_configured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key = CipherKey::generate().to_base64();
        let adapter = keyed_adapter(dir.path(), &key);
        let store = seeded_store();

        adapter
            .call(&store, Operation::Set, None, None)
            .await
            .expect("set");

        let raw = std::fs::read_to_string(dir.path().join("abc_abc.json")).expect("read raw");
        let envelope: serde_json::Value = serde_json::from_str(&raw).expect("envelope json");
        assert!(envelope.get("nonce").is_some(), "expected sealed envelope");
        assert!(envelope.get("guid").is_none(), "plaintext must not be stored");

        let outcome = adapter
            .call(&store, Operation::Get, None, None)
            .await
            .expect("get");
        assert_eq!(
            records_of(outcome),
            vec![record("abc", true), record("def", false)]
        );

        let other = keyed_adapter(dir.path(), &CipherKey::generate().to_base64());
        let err = other
            .call(&store, Operation::Get, Some("abc"), None)
            .await
            .expect_err("wrong key");
        assert!(matches!(err, AdapterError::Decrypt { .. }));
    }

    #[tokio::test]
    async fn empty_cipher_key_means_plaintext() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = keyed_adapter(dir.path(), "");
        let store = InMemoryStore::new("abc", "guid");

        adapter
            .call(&store, Operation::Set, Some("abc"), Some(record("abc", true)))
            .await
            .expect("set");

        let bytes = std::fs::read(dir.path().join("abc_abc.json")).expect("read");
        let raw: Record = serde_json::from_slice(&bytes).expect("plain json");
        assert_eq!(raw, record("abc", true));
    }

    #[tokio::test]
    async fn reads_files_written_by_other_tools() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("abc_abc.json"),
            serde_json::to_vec(&record("abc", true)).expect("json"),
        )
        .expect("seed");

        let adapter = plain_adapter(dir.path());
        let store = InMemoryStore::new("abc", "guid");
        let outcome = adapter
            .call(&store, Operation::Get, None, None)
            .await
            .expect("get");
        assert_eq!(records_of(outcome), vec![record("abc", true)]);
    }

    #[test]
    fn default_directory_is_the_system_temp_dir() {
        let adapter = FsAdapter::new(FsConfig::default()).expect("adapter");
        assert_eq!(adapter.directory(), env::temp_dir());
    }

    #[test]
    fn rejects_malformed_cipher_key() {
        let err = FsAdapter::new(FsConfig {
            directory: None,
            cipher_key: Some("abcd".to_string()),
        })
        .expect_err("bad key");
        assert!(matches!(err, AdapterError::InvalidCipherKey { .. }));
    }
}
