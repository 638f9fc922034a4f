//! `docstore` CLI entry-point.
//!
//! Available sub-commands:
//! - `list`   — print every document of a collection.
//! - `create` — insert a document unless one already matches the key.
//! - `update` — merge fields into the first document matching the key.
//! - `get`    — print the first document matching the key.
//! - `uri`    — print the connection string without connecting.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use db::{DbError, Document, DocumentStoreClient, StoreConfig, TracingSink};

#[derive(Parser)]
#[command(name = "docstore", about = "Minimal document-store access tool", version)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

/// Connection parameters. Flags override values read from `--config`.
#[derive(Args)]
struct StoreArgs {
    /// JSON config file (flat, or with settings under `global`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "DOCSTORE_HOST")]
    host: Option<String>,

    #[arg(long, global = true, env = "DOCSTORE_PORT")]
    port: Option<u16>,

    #[arg(long, global = true, env = "DOCSTORE_DB_NAME")]
    db_name: Option<String>,

    #[arg(long, global = true, env = "DOCSTORE_TLS")]
    tls: Option<bool>,
}

#[derive(Subcommand)]
enum Command {
    /// List every document in a collection.
    List { collection: String },
    /// Insert `--fields` unless a document matches `--key`.
    Create {
        collection: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        fields: String,
    },
    /// Merge `--fields` into the first document matching `--key`.
    Update {
        collection: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        fields: String,
    },
    /// Print the first document matching `--key`.
    Get {
        collection: String,
        #[arg(long)]
        key: String,
    },
    /// Print the connection string.
    Uri,
}

impl StoreArgs {
    fn resolve(&self) -> anyhow::Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read config file {}", path.display()))?;
                StoreConfig::from_json_str(&raw)?
            }
            None => StoreConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db_name) = &self.db_name {
            config.db_name = db_name.clone();
        }
        if let Some(tls) = self.tls {
            config.tls = tls;
        }
        Ok(config)
    }
}

fn parse_document(flag: &str, raw: &str) -> anyhow::Result<Document> {
    match serde_json::from_str::<Value>(raw).with_context(|| format!("--{flag} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        _ => bail!("--{flag} must be a JSON object"),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect(config: &StoreConfig) -> Result<DocumentStoreClient, DbError> {
    info!("Connecting to {}:{} (db={})", config.host, config.port, config.db_name);
    DocumentStoreClient::connect(config, Arc::new(TracingSink)).await
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.store.resolve()?;

    match cli.command {
        Command::Uri => {
            println!("{}", config.connection_string()?);
        }
        Command::List { collection } => {
            let client = connect(&config).await?;
            print_json(&client.list_all(&collection).await?)?;
        }
        Command::Create { collection, key, fields } => {
            let key = parse_document("key", &key)?;
            let fields = parse_document("fields", &fields)?;
            let client = connect(&config).await?;
            let outcome = client.create_if_absent(&collection, &key, fields).await?;
            println!("{outcome}");
        }
        Command::Update { collection, key, fields } => {
            let key = parse_document("key", &key)?;
            let fields = parse_document("fields", &fields)?;
            let client = connect(&config).await?;
            match client.update(&collection, &key, &fields).await {
                Ok(()) => println!("edited document"),
                Err(DbError::NotFound) => {
                    eprintln!("document not found");
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Get { collection, key } => {
            let key = parse_document("key", &key)?;
            let client = connect(&config).await?;
            match client.get_one(&collection, &key).await {
                Ok(document) => print_json(&document)?,
                Err(DbError::NotFound) => {
                    eprintln!("document not found");
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from(["docstore", "--db-name", "shop", "--port", "27018", "uri"])
            .expect("valid arguments");
        let config = cli.store.resolve().unwrap();
        assert_eq!(config.db_name, "shop");
        assert_eq!(config.port, 27018);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(parse_document("key", r#"{"id": 1}"#).is_ok());
        assert!(parse_document("key", "[1, 2]").is_err());
        assert!(parse_document("key", "{ nope").is_err());
    }
}
