//! `easydms`: file scanned documents by date and company.
//!
//! # Usage
//!
//! ```text
//! easydms add scan1.pdf scan2.pdf
//! easydms store scan.pdf --company "ACME Corp" --ocr
//! easydms -c ~/dms.yaml config dump
//! ```

mod commands;
mod config;
mod ocr;

use std::{
  io::{self, StdinLock, Stdout},
  path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commands::StoreRequest;
use config::Config;
use easydms_core::{
  calendar::parse_date, filing::FilingPolicy, prompt::Prompter, store::DocumentStore,
};
use easydms_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "easydms", version, about = "Simple document management")]
struct Cli {
  /// Path to the YAML configuration file.
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// View the configuration.
  Config {
    #[command(subcommand)]
    action: ConfigCommand,
  },

  /// Add documents to the database, leaving the files where they are.
  Add {
    /// Files to add.
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },

  /// File a document under its company and date and add it to the database.
  Store {
    /// Document to file; moved into the filing tree.
    file: PathBuf,

    /// Company name (or one of its tag aliases).
    #[arg(long)]
    company: String,

    /// Document date (YYYY-MM-DD); asked for when omitted.
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// Run OCR on the document before filing it.
    #[arg(long)]
    ocr: bool,

    /// Open the document in the configured PDF viewer first.
    #[arg(long)]
    view: bool,
  },

  /// List the company names used in the filing tree.
  Companies,

  /// Manage tags and their aliases.
  Tag {
    #[command(subcommand)]
    action: TagCommand,
  },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
  /// Dump the configuration to stdout.
  Dump,
}

#[derive(Subcommand, Debug)]
enum TagCommand {
  /// Create a tag and bind aliases to it.
  Add {
    name:    String,
    aliases: Vec<String>,
  },
  /// Print the primary tag a name resolves to.
  Resolve { name: String },
  /// Print the aliases of the tag a name resolves to.
  Aliases { name: String },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
  parse_date(s).map_err(|e| e.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr; stdout belongs to prompts and command output.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  run(cli).await
}

/// Dispatch a parsed command line.
async fn run(cli: Cli) -> Result<()> {
  let config = Config::load(cli.config.as_deref())?;
  let mut out = io::stdout();

  match cli.command {
    Command::Config { action: ConfigCommand::Dump } => commands::dump_config(&config, &mut out),
    Command::Add { files } => {
      let mut library = Library::open(&config).await?;
      commands::add(&library.store, &mut library.prompter, &files).await
    }
    Command::Store { file, company, date, ocr, view } => {
      let mut library = Library::open(&config).await?;
      let request = StoreRequest { file, company, date, ocr, view };
      commands::store(
        &library.store,
        &library.policy,
        config.settings(),
        &mut library.prompter,
        request,
        &mut out,
      )
      .await
      .map(drop)
    }
    Command::Companies => {
      let library = Library::open(&config).await?;
      commands::companies(&library.policy, &mut out)
    }
    Command::Tag { action } => {
      let library = Library::open(&config).await?;
      match action {
        TagCommand::Add { name, aliases } => {
          commands::tag_add(&library.store, &name, &aliases, &mut out).await
        }
        TagCommand::Resolve { name } => {
          commands::tag_resolve(&library.store, &name, &mut out).await
        }
        TagCommand::Aliases { name } => {
          commands::tag_aliases(&library.store, &name, &mut out).await
        }
      }
    }
  }
}

// ─── Library ──────────────────────────────────────────────────────────────────

/// Everything the document commands work against.
struct Library {
  store:    SqliteStore,
  policy:   FilingPolicy,
  prompter: Prompter<StdinLock<'static>, Stdout>,
}

impl Library {
  /// Bootstrap the filing root and open the library inside it.
  async fn open(config: &Config) -> Result<Self> {
    let settings = config.settings();
    let directory = settings.directory()?;
    let mut prompter = Prompter::stdio();
    commands::ensure_directory(&directory, &mut prompter)?;

    let library = settings.library_path()?;
    let store = SqliteStore::open(&library)
      .await
      .with_context(|| format!("failed to open library at {}", library.display()))?;
    store
      .create_schema()
      .await
      .context("failed to prepare library schema")?;

    Ok(Self { store, policy: FilingPolicy::new(&directory), prompter })
  }
}
