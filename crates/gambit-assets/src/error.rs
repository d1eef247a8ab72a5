//! Asset cache error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of the rendering capability itself.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer could not be started.
    #[error("failed to launch renderer: {0}")]
    Launch(String),

    /// The renderer did not finish within its ceiling.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    /// The renderer ran but reported failure.
    #[error("renderer process failed: {0}")]
    Process(String),

    /// The renderer produced something that is not a PDF.
    #[error("renderer produced invalid output: {0}")]
    InvalidOutput(String),

    /// Scratch file handling failed.
    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by `AssetCache`.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The HTML template could not be read.
    #[error("failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rendering failed.
    #[error("PDF generation failed: {0}")]
    Generation(#[from] RenderError),

    /// Reading or writing the cached artifact failed.
    #[error("asset storage I/O failed on {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    /// Whether the failure happened while producing the PDF, as opposed to
    /// while reading or writing the cache file.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::Template { .. } | Self::Generation(_))
    }
}
