//! Command line entry point for the content directory mirror.
//!
//! ```bash
//! # Seed the class templates
//! cdmirror bootstrap
//!
//! # Apply a stream of JSON-lines chain inputs
//! cdmirror ingest inputs.jsonl
//! some-exporter | cdmirror ingest -
//!
//! # Show the entity watermark and ingest cursor
//! cdmirror status
//! ```

mod error;

use cdmirror_config::Config;
use cdmirror_materialize::{ChainInput, Materializer, Outcome};
use cdmirror_store::Database;
use clap::{Parser, Subcommand};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{ErrorKind, Result};

const DEFAULT_FILTER: &str = "cdmirror=info,cdmirror_materialize=info,cdmirror_store=warn";

#[derive(Parser, Debug)]
#[command(name = "cdmirror", version, about = "Relational mirror of a ledger's content directory")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, env = "CDMIRROR_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed missing class templates
    Bootstrap {
        /// Block the templates are stamped with
        #[arg(long, default_value_t = 0)]
        block: u32,
    },
    /// Apply chain inputs, one JSON document per line
    Ingest {
        /// Input file, or `-` for standard input
        input: PathBuf,
    },
    /// Print the entity watermark and ingest cursor
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let mirror = open(&config).await?;
    match cli.command {
        Command::Bootstrap { block } => {
            let created = mirror.bootstrap(block).await.or_raise(|| ErrorKind::Bootstrap)?;
            println!("{created} template(s) created");
        },
        Command::Ingest { input } => ingest(&mirror, &input).await?,
        Command::Status => {
            let status = mirror.status().await.or_raise(|| ErrorKind::Status)?;
            println!("next entity id: {}", status.next_entity_id);
            match status.cursor {
                Some(cursor) => println!("cursor: block {} position {}", cursor.block, cursor.position),
                None => println!("cursor: none"),
            }
        },
    }
    Ok(())
}

async fn open(config: &Config) -> Result<Materializer> {
    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
    }
    tracing::debug!(path = %config.database.display(), "opening database");
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    Ok(Materializer::new(db, config))
}

async fn reader(input: &Path) -> Result<Box<dyn AsyncBufRead + Unpin>> {
    if input == Path::new("-") {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input).await.or_raise(|| ErrorKind::Read)?;
    Ok(Box::new(BufReader::new(file)))
}

/// Inputs are applied strictly in order; the first failure stops the run
/// so that nothing after it is applied out of sequence.
async fn ingest(mirror: &Materializer, input: &Path) -> Result<()> {
    let mut lines = reader(input).await?.lines();
    let (mut applied, mut skipped) = (0usize, 0usize);
    let mut number = 0;
    while let Some(line) = lines.next_line().await.or_raise(|| ErrorKind::Read)? {
        number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let input: ChainInput = serde_json::from_str(&line).or_raise(|| ErrorKind::Malformed(number))?;
        match mirror.apply(&input).await.or_raise(|| ErrorKind::Apply(number))? {
            Outcome::Applied => applied += 1,
            Outcome::Skipped => skipped += 1,
        }
    }
    tracing::info!(applied, skipped, "ingest finished");
    Ok(())
}
