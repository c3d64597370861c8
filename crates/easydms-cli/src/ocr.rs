//! One-shot OCR offload.
//!
//! The external OCR command is run as `{program} {input} {output}` on a
//! spawned task. `output` lives in a private temporary directory, so files
//! next to the input are never touched. Jobs have no timeout and are not
//! retried; dropping an unfinished job kills the OCR process and removes its
//! output.

use std::{
  io,
  path::{Path, PathBuf},
  process::ExitStatus,
};

use tempfile::TempDir;
use thiserror::Error;
use tokio::{process::Command, task::JoinHandle};

#[derive(Debug, Error)]
pub enum OcrError {
  #[error("failed to create OCR work directory: {0}")]
  WorkDir(#[source] io::Error),

  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source:  io::Error,
  },

  #[error("{program} failed on {input}: {status}")]
  Failed {
    program: String,
    input:   PathBuf,
    status:  ExitStatus,
  },

  #[error("ocr task ended without reporting a result")]
  Dropped,
}

/// The file produced by a finished job.
///
/// The file and its directory are removed when this value is dropped.
#[derive(Debug)]
pub struct OcrOutput {
  path: PathBuf,
  _dir: TempDir,
}

impl OcrOutput {
  pub fn path(&self) -> &Path { &self.path }
}

/// A running OCR job.
pub struct OcrJob {
  task:   AbortOnDrop,
  output: OcrOutput,
}

struct AbortOnDrop(JoinHandle<Result<(), OcrError>>);

impl Drop for AbortOnDrop {
  fn drop(&mut self) { self.0.abort(); }
}

impl OcrJob {
  /// Start OCR of `input` with `program` in the background.
  pub fn spawn(program: &str, input: &Path) -> Result<Self, OcrError> {
    let dir = tempfile::Builder::new()
      .prefix("easydms-ocr-")
      .tempdir()
      .map_err(OcrError::WorkDir)?;
    let stem = input
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    let path = dir.path().join(format!("{stem}.ocr.pdf"));

    let task = tokio::spawn(run(program.to_owned(), input.to_path_buf(), path.clone()));

    Ok(Self {
      task:   AbortOnDrop(task),
      output: OcrOutput { path, _dir: dir },
    })
  }

  /// Wait for the job and return the processed file.
  pub async fn finished(mut self) -> Result<OcrOutput, OcrError> {
    match (&mut self.task.0).await {
      Ok(result) => result?,
      Err(_) => return Err(OcrError::Dropped),
    }
    Ok(self.output)
  }
}

async fn run(program: String, input: PathBuf, output: PathBuf) -> Result<(), OcrError> {
  tracing::info!(program, input = %input.display(), "ocr started");

  let status = Command::new(&program)
    .arg(&input)
    .arg(&output)
    .kill_on_drop(true)
    .status()
    .await
    .map_err(|source| OcrError::Spawn { program: program.clone(), source })?;

  if !status.success() {
    return Err(OcrError::Failed { program, input, status });
  }

  tracing::info!(output = %output.display(), "ocr finished");
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::{fs, time::Duration};

  use super::*;

  #[cfg(unix)]
  #[tokio::test]
  async fn job_reports_processed_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.pdf");
    fs::write(&input, b"%PDF-1.4").unwrap();

    // `cp in out` stands in for the OCR tool.
    let output = OcrJob::spawn("cp", &input).unwrap().finished().await.unwrap();
    assert_eq!(output.path().file_name().unwrap(), "scan.ocr.pdf");
    assert_ne!(output.path().parent(), Some(dir.path()));
    assert_eq!(fs::read(output.path()).unwrap(), b"%PDF-1.4");
    assert!(input.exists());

    let produced = output.path().to_path_buf();
    drop(output);
    assert!(!produced.exists());
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn existing_neighbour_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.pdf");
    let neighbour = dir.path().join("scan.ocr.pdf");
    fs::write(&input, b"SCAN").unwrap();
    fs::write(&neighbour, b"OTHER").unwrap();

    let output = OcrJob::spawn("cp", &input).unwrap().finished().await.unwrap();
    assert_eq!(fs::read(output.path()).unwrap(), b"SCAN");
    drop(output);
    assert_eq!(fs::read(&neighbour).unwrap(), b"OTHER");
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn failing_command_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.pdf");

    let err = OcrJob::spawn("false", &input)
      .unwrap()
      .finished()
      .await
      .unwrap_err();
    assert!(matches!(err, OcrError::Failed { .. }), "{err:?}");
  }

  #[tokio::test]
  async fn missing_command_is_reported() {
    let err = OcrJob::spawn("easydms-no-such-ocr-tool", Path::new("scan.pdf"))
      .unwrap()
      .finished()
      .await
      .unwrap_err();
    assert!(matches!(err, OcrError::Spawn { .. }), "{err:?}");
  }

  #[cfg(unix)]
  #[tokio::test(flavor = "multi_thread")]
  async fn dropped_job_kills_process() {
    let dir = TempDir::new().unwrap();
    // Run by `sh script output`; `$0` is the script itself.
    let script = dir.path().join("slow.sh");
    fs::write(&script, "sleep 1\ntouch \"$0.ran\"\n").unwrap();

    let job = OcrJob::spawn("sh", &script).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(job);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!dir.path().join("slow.sh.ran").exists());
  }
}
