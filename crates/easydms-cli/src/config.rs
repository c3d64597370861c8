//! Configuration discovery and loading.
//!
//! The configuration is a YAML file searched for in a short, platform
//! specific list of locations. Values can be overridden with `EASYDMS_*`
//! environment variables.

use std::{
  fs::{self, OpenOptions},
  path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "easydms.yaml";
pub const ENV_PREFIX: &str = "EASYDMS";

const UNIX_DIR_VAR: &str = "XDG_CONFIG_HOME";
const WINDOWS_DIR_VAR: &str = "APPDATA";

const DEFAULT_OCR_COMMAND: &str = "ocrmypdf";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(
    "Could not load configuration\nfollowing path(s) were searched:\n{}",
    join_paths(.searched)
  )]
  NotFound { searched: Vec<PathBuf> },

  #[error("required configuration key missing: {0}")]
  MissingKey(&'static str),

  #[error("failed to read configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("io error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

fn join_paths(paths: &[PathBuf]) -> String {
  paths
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join("\n")
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Shape of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
  /// Root of the filing tree.
  pub directory:          Option<PathBuf>,
  /// Database file name, relative to `directory`.
  pub library:            Option<String>,
  #[serde(alias = "pdfViewer", alias = "pdfviewer")]
  pub pdf_viewer:         Option<String>,
  pub default_import_dir: Option<PathBuf>,
  pub ocr_command:        Option<String>,
}

impl Settings {
  /// The filing root, with `~` expanded.
  pub fn directory(&self) -> Result<PathBuf, ConfigError> {
    self
      .directory
      .as_deref()
      .map(expand_tilde)
      .ok_or(ConfigError::MissingKey("directory"))
  }

  /// Location of the database file.
  pub fn library_path(&self) -> Result<PathBuf, ConfigError> {
    let library = self.library.as_deref().ok_or(ConfigError::MissingKey("library"))?;
    Ok(self.directory()?.join(library))
  }

  pub fn import_dir(&self) -> Option<PathBuf> {
    self.default_import_dir.as_deref().map(expand_tilde)
  }

  pub fn ocr_command(&self) -> &str {
    self.ocr_command.as_deref().unwrap_or(DEFAULT_OCR_COMMAND)
  }
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// A located configuration file and the settings read from it.
#[derive(Debug, Clone)]
pub struct Config {
  path:     PathBuf,
  settings: Settings,
}

impl Config {
  /// Load the configuration from `explicit`, or from the first usable
  /// default location when no path is given.
  ///
  /// An explicit path must already exist.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let path = match explicit {
      Some(path) if path.is_file() => path.to_path_buf(),
      Some(path) => {
        return Err(ConfigError::NotFound { searched: vec![path.to_path_buf()] });
      }
      None => config_location(&list_config_locations())?,
    };

    let settings = config::Config::builder()
      .add_source(config::File::from(path.as_path()).format(config::FileFormat::Yaml))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()?;

    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(Self { path, settings })
  }

  pub fn settings(&self) -> &Settings { &self.settings }

  /// The configuration file exactly as it is on disk.
  pub fn raw(&self) -> Result<String, ConfigError> {
    fs::read_to_string(&self.path)
      .map_err(|source| ConfigError::Io { path: self.path.clone(), source })
  }
}

// ─── Discovery ────────────────────────────────────────────────────────────────

/// Candidate configuration files for this platform, highest priority first.
pub fn list_config_locations() -> Vec<PathBuf> {
  let home = dirs::home_dir().unwrap_or_default();
  locations_for(std::env::consts::OS, &home, |var| {
    std::env::var_os(var).map(PathBuf::from)
  })
}

fn locations_for(
  os: &str,
  home: &Path,
  env: impl Fn(&str) -> Option<PathBuf>,
) -> Vec<PathBuf> {
  let mut dirs = Vec::new();
  match os {
    "macos" => {
      dirs.push(home.join("Library").join("Application Support"));
      dirs.push(home.join(".config"));
      dirs.extend(env(UNIX_DIR_VAR));
    }
    "windows" => {
      dirs.push(home.join("AppData").join("Roaming"));
      dirs.extend(env(WINDOWS_DIR_VAR));
    }
    _ => {
      dirs.push(home.join(".config"));
      dirs.extend(env(UNIX_DIR_VAR));
    }
  }

  let mut out: Vec<PathBuf> = Vec::new();
  for dir in dirs {
    let path = dir.join(CONFIG_FILENAME);
    let path = std::path::absolute(&path).unwrap_or(path);
    if !out.contains(&path) {
      out.push(path);
    }
  }
  out
}

/// The first existing candidate, or else the first one that can be created.
///
/// A created candidate is left behind as an empty file.
pub fn config_location(candidates: &[PathBuf]) -> Result<PathBuf, ConfigError> {
  if let Some(existing) = candidates.iter().find(|p| p.is_file()) {
    return Ok(existing.clone());
  }

  for candidate in candidates {
    if OpenOptions::new().append(true).create(true).open(candidate).is_ok() {
      tracing::info!(path = %candidate.display(), "created empty configuration");
      return Ok(candidate.clone());
    }
  }

  Err(ConfigError::NotFound { searched: candidates.to_vec() })
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
