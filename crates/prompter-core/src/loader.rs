//! Script retrieval.
//!
//! A source identifier is either an `http(s)://` URL, fetched with a blocking
//! client, or a path on disk. Either way the payload goes through
//! [`parse_script`] so callers only ever see validated lines or a
//! [`LoadError`] whose `Display` is fit to show the presenter.

use crate::cancel::CancellationToken;
use crate::script::{ScriptLine, parse_script};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a script could not be loaded.
///
/// Cheap to clone so results can travel inside UI messages.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: Arc<std::io::Error>,
    },
    #[error("request failed: {0}")]
    Http(Arc<reqwest::Error>),
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("invalid JSON: {0}")]
    Json(Arc<serde_json::Error>),
    #[error("script format is invalid, expected an array of lines")]
    NotASequence,
    #[error("line {index} is invalid: {reason}")]
    InvalidLine { index: usize, reason: String },
    #[error("load cancelled before {stage}")]
    Cancelled { stage: &'static str },
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

/// Something that turns a source identifier into script lines.
pub trait ScriptLoader {
    /// Load `source`, giving up at the next stage boundary once `cancel` fires.
    fn load_with(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScriptLine>, LoadError>;

    fn load(&self, source: &str) -> Result<Vec<ScriptLine>, LoadError> {
        self.load_with(source, &CancellationToken::new())
    }
}

/// Loads from URLs or local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLoader;

impl ScriptLoader for SourceLoader {
    fn load_with(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScriptLine>, LoadError> {
        cancel.checkpoint("fetch")?;
        let raw = if is_remote(source) {
            fetch_remote(source, cancel)?
        } else {
            read_local(Path::new(source))?
        };
        debug!(source, bytes = raw.len(), "Fetched script payload");
        cancel.checkpoint("parse")?;
        let lines = parse_script(&raw)?;
        info!(source, lines = lines.len(), "Loaded script");
        Ok(lines)
    }
}

/// Read and validate a script file picked by the presenter.
pub fn import_script(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<ScriptLine>, LoadError> {
    cancel.checkpoint("read")?;
    let raw = read_local(path)?;
    cancel.checkpoint("parse")?;
    let lines = parse_script(&raw)?;
    info!(path = %path.display(), lines = lines.len(), "Imported script");
    Ok(lines)
}

pub fn is_remote(source: &str) -> bool {
    let lowered = source.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn fetch_remote(url: &str, cancel: &CancellationToken) -> Result<String, LoadError> {
    let response = reqwest::blocking::get(url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        });
    }
    cancel.checkpoint("body")?;
    Ok(response.text()?)
}

fn read_local(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source: Arc::new(source),
    })
}
