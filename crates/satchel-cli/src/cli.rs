use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition: drive a store's file persistence by hand.
#[derive(Parser, Debug)]
#[command(
    name = "satchel",
    about = "Persist keyed JSON records as files, one file per record",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load one record by key, or every record of the store.
    Get {
        /// Record key; omit to load the whole store.
        key: Option<String>,
    },
    /// Persist one record by key, or seed the whole store from a file.
    Set {
        /// Record key; omit to persist every record from --file.
        key: Option<String>,
        /// Inline record JSON.
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,
        /// JSON file holding one record (with a key) or an array of
        /// records (without).
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete one record by key, or every record of the store.
    Remove {
        /// Record key; omit to delete the whole store.
        key: Option<String>,
    },
    /// Run a write/read/delete probe against the configured directory.
    Health,
    /// Generate cipher key material for the config file.
    Keygen,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
