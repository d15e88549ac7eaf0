//! File-name composition and matching for record files.

/// On-disk file name for a record: `<store id>_<key>.json`.
pub fn record_file_name(store_id: &str, key: &str) -> String {
    format!("{store_id}_{key}.json")
}

/// Whether `name` belongs to `store_id`. The underscore check keeps a
/// store id that prefixes another (`abc` vs `abcd`) from capturing the
/// sibling's files; the extension check skips unrelated files sharing
/// the directory.
pub fn is_store_file(name: &str, store_id: &str) -> bool {
    match name.strip_prefix(store_id) {
        Some(rest) => rest.starts_with('_') && rest.ends_with(".json"),
        None => false,
    }
}
