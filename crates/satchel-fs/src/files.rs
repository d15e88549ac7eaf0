//! Asynchronous file plumbing behind the adapter: directory creation,
//! store-file listing, and single-file and whole-store read/write/delete.
//! Whole-store calls fan out one future per file and join them, so any
//! single failure fails the call as a whole.

use std::io::ErrorKind;
use std::path::Path;

use futures::future::try_join_all;
use satchel_core::adapter::AdapterError;
use satchel_core::record::{primary_key, Record};
use tokio::fs;

use crate::codec::Codec;
use crate::paths;

pub(crate) async fn ensure_dir(dir: &Path) -> Result<(), AdapterError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AdapterError::CreateDir {
            path: label(dir),
            source: e,
        })
}

/// Names of `store_id`'s record files inside `dir`, in directory order.
pub(crate) async fn list_matching(dir: &Path, store_id: &str) -> Result<Vec<String>, AdapterError> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| io_err(dir, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_err(dir, e))? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if paths::is_store_file(name, store_id) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub(crate) async fn read_one(path: &Path, codec: &Codec) -> Result<Record, AdapterError> {
    let bytes = fs::read(path).await.map_err(|e| missing_err(path, e))?;
    codec.decode(&bytes, path)
}

pub(crate) async fn read_all(
    dir: &Path,
    store_id: &str,
    codec: &Codec,
) -> Result<Vec<Record>, AdapterError> {
    let names = list_matching(dir, store_id).await?;
    let reads = names.iter().map(|name| {
        let path = dir.join(name);
        async move { read_one(&path, codec).await }
    });
    try_join_all(reads).await
}

pub(crate) async fn write_one(
    path: &Path,
    codec: &Codec,
    record: &Record,
) -> Result<(), AdapterError> {
    let bytes = codec.encode(record)?;
    fs::write(path, bytes).await.map_err(|e| io_err(path, e))
}

/// Write every record to its own file, derived from each record's key.
pub(crate) async fn write_all(
    dir: &Path,
    store_id: &str,
    key_field: &str,
    codec: &Codec,
    records: &[Record],
) -> Result<(), AdapterError> {
    let writes = records.iter().map(|record| async move {
        let key = primary_key(record, key_field)?;
        let path = dir.join(paths::record_file_name(store_id, &key));
        write_one(&path, codec, record).await
    });
    try_join_all(writes).await.map(|_| ())
}

pub(crate) async fn delete_one(path: &Path) -> Result<(), AdapterError> {
    fs::remove_file(path)
        .await
        .map_err(|e| missing_err(path, e))
}

pub(crate) async fn delete_all(dir: &Path, store_id: &str) -> Result<(), AdapterError> {
    let names = list_matching(dir, store_id).await?;
    let deletes = names.iter().map(|name| {
        let path = dir.join(name);
        async move { delete_one(&path).await }
    });
    try_join_all(deletes).await.map(|_| ())
}

fn label(path: &Path) -> String {
    path.display().to_string()
}

fn io_err(path: &Path, source: std::io::Error) -> AdapterError {
    AdapterError::Io {
        path: label(path),
        source,
    }
}

/// Missing files surface as `NotFound`; everything else stays an I/O error.
fn missing_err(path: &Path, source: std::io::Error) -> AdapterError {
    if source.kind() == ErrorKind::NotFound {
        AdapterError::NotFound { path: label(path) }
    } else {
        io_err(path, source)
    }
}
