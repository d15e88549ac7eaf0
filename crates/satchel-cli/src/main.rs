mod cli;
mod config;
mod store;

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::ConfigCommand;
use clap::Parser;
use color_eyre::Result;
use satchel_core::adapter::{AdapterOutcome, Operation, PersistenceAdapter};
use satchel_core::record::Record;
use satchel_core::store::{InMemoryStore, Store};
use satchel_fs::codec::CipherKey;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the filesystem adapter.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        cli::Command::Get { key } => run_get(key.as_deref(), &config).await?,
        cli::Command::Set { key, data, file } => {
            run_set(key.as_deref(), data, file, &config).await?
        }
        cli::Command::Remove { key } => run_remove(key.as_deref(), &config).await?,
        cli::Command::Health => run_health_check(&config).await?,
        cli::Command::Keygen => run_keygen(),
        cli::Command::Version => print_version(),
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("satchel-cli {}", env!("CARGO_PKG_VERSION"));
}

fn run_keygen() {
    println!("{}", CipherKey::generate().to_base64());
}

async fn run_get(key: Option<&str>, config: &config::Config) -> Result<()> {
    let adapter = store::adapter_from_config(config)?;
    let handle = store::store_from_config(config);
    match call(&adapter, &handle, Operation::Get, key, None).await? {
        AdapterOutcome::Record(record) => print_json(&record)?,
        AdapterOutcome::Records(records) => print_json(&records)?,
        AdapterOutcome::Done => {}
    }
    Ok(())
}

async fn run_set(
    key: Option<&str>,
    data: Option<String>,
    file: Option<PathBuf>,
    config: &config::Config,
) -> Result<()> {
    let adapter = store::adapter_from_config(config)?;
    let handle = store::store_from_config(config);

    match key {
        Some(key) => {
            let record = load_record(data, file.as_deref())?;
            call(&adapter, &handle, Operation::Set, Some(key), Some(record)).await?;
            println!("Stored {key}");
        }
        None => {
            let path = file.ok_or_else(|| {
                color_eyre::eyre::eyre!("whole-store set needs --file with a JSON array")
            })?;
            let records = load_records(&path)?;
            let count = records.len();
            for record in records {
                handle
                    .insert(record)
                    .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
            }
            call(&adapter, &handle, Operation::Set, None, None).await?;
            println!("Stored {count} records");
        }
    }
    Ok(())
}

async fn run_remove(key: Option<&str>, config: &config::Config) -> Result<()> {
    let adapter = store::adapter_from_config(config)?;
    let handle = store::store_from_config(config);
    call(&adapter, &handle, Operation::Remove, key, None).await?;
    match key {
        Some(key) => println!("Removed {key}"),
        None => println!("Removed all records for {}", handle.id()),
    }
    Ok(())
}

/// Runs a quick round-trip check of the configured storage path.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let adapter = store::adapter_from_config(config)?;
    let handle = store::store_from_config(config);
    run_probe(&adapter, &handle).await?;
    println!("Storage: ok");
    Ok(())
}

async fn run_probe<A: PersistenceAdapter>(adapter: &A, handle: &InMemoryStore) -> Result<()> {
    let probe_key = "health-probe";
    let mut probe = Record::new();
    probe.insert(
        handle.key_field().to_string(),
        Value::String(probe_key.into()),
    );
    probe.insert("ok".to_string(), Value::Bool(true));

    call(
        adapter,
        handle,
        Operation::Set,
        Some(probe_key),
        Some(probe.clone()),
    )
    .await?;
    let round_trip = call(adapter, handle, Operation::Get, Some(probe_key), None).await?;
    call(adapter, handle, Operation::Remove, Some(probe_key), None).await?;

    if round_trip != AdapterOutcome::Record(probe) {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

async fn call<A: PersistenceAdapter>(
    adapter: &A,
    store: &dyn Store,
    op: Operation,
    key: Option<&str>,
    data: Option<Record>,
) -> Result<AdapterOutcome> {
    adapter
        .call(store, op, key, data)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}

fn load_record(data: Option<String>, file: Option<&Path>) -> Result<Record> {
    let text = match (data, file) {
        (Some(data), _) => data,
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => color_eyre::eyre::bail!("set needs --data or --file"),
    };
    Ok(serde_json::from_str(&text)?)
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
