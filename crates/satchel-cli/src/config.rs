use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/satchel/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Store identifier used as the file-name prefix.
    pub store_id: Option<String>,
    /// Field holding each record's primary key.
    pub key_field: Option<String>,
    /// Directory for record files (system temp dir when unset).
    pub directory: Option<PathBuf>,
    /// Base64 256-bit key enabling encryption at rest (see `satchel keygen`).
    pub cipher_key: Option<String>,
}

impl Config {
    pub fn store_id(&self) -> &str {
        self.store_id.as_deref().unwrap_or("records")
    }

    pub fn key_field(&self) -> &str {
        self.key_field.as_deref().unwrap_or("id")
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("satchel").join("config.toml"))
}

/// Write the given config to disk, creating parent directories as needed.
/// Leaves an existing file untouched so user edits are never clobbered.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn defaults_fill_in_store_identity() {
        let cfg = Config::default();
        assert_eq!(cfg.store_id(), "records");
        assert_eq!(cfg.key_field(), "id");
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            store_id = "abc"
            key_field = "guid"
            directory = "/tmp/satchel-data"
            cipher_key = "c2F0Y2hlbA"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                store_id: Some("abc".into()),
                key_field: Some("guid".into()),
                directory: Some(PathBuf::from("/tmp/satchel-data")),
                cipher_key: Some("c2F0Y2hlbA".into()),
            }
        );
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let cfg = Config {
            store_id: Some("abc".into()),
            key_field: Some("guid".into()),
            directory: Some(PathBuf::from("/tmp/satchel-data")),
            cipher_key: None,
        };

        write_to_path_if_missing(&cfg, &path).expect("write should succeed");
        let second = write_to_path_if_missing(&cfg, &path).expect("second write ok");
        assert_eq!(second, path);
        let loaded: Config =
            toml::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded, cfg);
    }

    fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(config)?;
        fs::write(path, body)?;
        Ok(path.to_path_buf())
    }
}
