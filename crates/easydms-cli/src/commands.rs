//! Subcommand implementations.
//!
//! Every command writes its user-facing output to `out` and reads answers
//! through a [`Prompter`], so the same code runs against the terminal and
//! against buffers in tests.

use std::{
  fs,
  io::{BufRead, Write},
  path::{Path, PathBuf},
  process::Command,
};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use easydms_core::{
  calendar::guess_document_date,
  document::Document,
  filing::{FilingPolicy, validate_label},
  prompt::Prompter,
  store::DocumentStore,
};
use tokio::task::block_in_place;

use crate::{
  config::{Config, Settings},
  ocr::{OcrJob, OcrOutput},
};

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// Make sure the filing root exists, offering to create it.
pub fn ensure_directory<R: BufRead, W: Write>(
  directory: &Path,
  prompter: &mut Prompter<R, W>,
) -> Result<()> {
  if directory.exists() {
    return Ok(());
  }

  let question = format!("Directory \"{}\" does not exist. Create?", directory.display());
  if !block_in_place(|| prompter.yes_no(&question, false))? {
    bail!("Abort due to not existing directory");
  }

  fs::create_dir_all(directory)
    .with_context(|| format!("failed to create {}", directory.display()))?;
  tracing::info!(directory = %directory.display(), "created filing root");
  Ok(())
}

// ─── config ───────────────────────────────────────────────────────────────────

/// `config dump`
pub fn dump_config(config: &Config, out: &mut impl Write) -> Result<()> {
  let raw = config.raw()?;
  out.write_all(raw.as_bytes())?;
  if !raw.ends_with('\n') {
    writeln!(out)?;
  }
  Ok(())
}

// ─── add ──────────────────────────────────────────────────────────────────────

/// `add <files...>`: ask for each file's date and record it where it is.
pub async fn add<S, R, W>(
  store: &S,
  prompter: &mut Prompter<R, W>,
  files: &[PathBuf],
) -> Result<()>
where
  S: DocumentStore,
  R: BufRead,
  W: Write,
{
  for file in files {
    let question = format!("Date of document {}?", file.display());
    let default = guess_document_date(file);
    let date = block_in_place(|| prompter.date(&question, Some(default)))?;

    let id = store.insert_document(&Document::new(file, date)).await?;
    tracing::info!(id, path = %file.display(), %date, "recorded document");
  }
  Ok(())
}

// ─── store ────────────────────────────────────────────────────────────────────

/// Arguments of `store`.
#[derive(Debug, Clone)]
pub struct StoreRequest {
  pub file:    PathBuf,
  pub company: String,
  pub date:    Option<NaiveDate>,
  pub ocr:     bool,
  pub view:    bool,
}

/// `store <file>`: OCR, file and record one document.
///
/// The company name is normalised through the tag table when it is a known
/// alias. The OCR job starts once the label is settled and runs while the
/// user is asked for the date.
pub async fn store<S, R, W>(
  store: &S,
  policy: &FilingPolicy,
  settings: &Settings,
  prompter: &mut Prompter<R, W>,
  request: StoreRequest,
  out: &mut impl Write,
) -> Result<PathBuf>
where
  S: DocumentStore,
  R: BufRead,
  W: Write,
{
  if request.company.trim().is_empty() {
    bail!("Company name is empty");
  }
  validate_label(&request.company)?;

  let source = resolve_source(settings.import_dir().as_deref(), &request.file);
  if !source.is_file() {
    bail!("{} is not a file", source.display());
  }

  if request.view {
    open_in_viewer(settings.pdf_viewer.as_deref(), &source)?;
  }

  let label = store
    .primary_tag(&request.company)
    .await?
    .unwrap_or_else(|| request.company.clone());
  validate_label(&label)?;

  // Dropping the job on any early return kills OCR and discards its output.
  let job = if request.ocr {
    Some(OcrJob::spawn(settings.ocr_command(), &source)?)
  } else {
    None
  };

  let date = match request.date {
    Some(date) => date,
    None => {
      let default = guess_document_date(&source);
      block_in_place(|| prompter.date("Date of document?", Some(default)))?
    }
  };

  let processed = match job {
    Some(job) => Some(job.finished().await.context("OCR failed")?),
    None => None,
  };

  let destination = policy.file(
    &source,
    processed.as_ref().map(OcrOutput::path),
    date,
    &label,
  )?;
  let id = store.insert_document(&Document::new(&destination, date)).await?;
  tracing::info!(id, path = %destination.display(), %date, "recorded document");

  writeln!(out, "{}", destination.display())?;
  Ok(destination)
}

/// Relative paths that do not exist here are looked up in the import
/// directory.
fn resolve_source(import_dir: Option<&Path>, file: &Path) -> PathBuf {
  match import_dir {
    Some(dir) if file.is_relative() && !file.exists() => dir.join(file),
    _ => file.to_path_buf(),
  }
}

/// Open `file` in the configured PDF viewer without waiting for it.
fn open_in_viewer(viewer: Option<&str>, file: &Path) -> Result<()> {
  let Some(viewer) = viewer else {
    tracing::warn!("no pdf_viewer configured; not opening {}", file.display());
    return Ok(());
  };
  Command::new(viewer)
    .arg(file)
    .spawn()
    .with_context(|| format!("failed to start viewer {viewer}"))?;
  Ok(())
}

// ─── companies ────────────────────────────────────────────────────────────────

/// `companies`: the labels already present in the filing tree.
pub fn companies(policy: &FilingPolicy, out: &mut impl Write) -> Result<()> {
  for label in policy.labels()? {
    writeln!(out, "{label}")?;
  }
  Ok(())
}

// ─── tag ──────────────────────────────────────────────────────────────────────

/// `tag add <name> [aliases...]`
pub async fn tag_add<S: DocumentStore>(
  store: &S,
  name: &str,
  aliases: &[String],
  out: &mut impl Write,
) -> Result<()> {
  let tag = store.insert_tag(name, aliases).await?;
  writeln!(out, "{}", tag.primary)?;
  for alias in &tag.alternatives {
    writeln!(out, "  {alias}")?;
  }
  Ok(())
}

/// `tag resolve <name>`
pub async fn tag_resolve<S: DocumentStore>(
  store: &S,
  name: &str,
  out: &mut impl Write,
) -> Result<()> {
  match store.primary_tag(name).await? {
    Some(primary) => writeln!(out, "{primary}")?,
    None => bail!("unknown tag: {name}"),
  }
  Ok(())
}

/// `tag aliases <name>`
pub async fn tag_aliases<S: DocumentStore>(
  store: &S,
  name: &str,
  out: &mut impl Write,
) -> Result<()> {
  let Some(primary) = store.primary_tag(name).await? else {
    bail!("unknown tag: {name}");
  };
  for alias in store.tag_alternatives(&primary).await? {
    writeln!(out, "{alias}")?;
  }
  Ok(())
}
