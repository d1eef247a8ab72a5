//! Lead store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when submitting or persisting leads.
#[derive(Error, Debug)]
pub enum LeadError {
    /// Missing or malformed email address.
    #[error("Valid email required")]
    InvalidEmail,

    /// Reading or writing the collection failed.
    #[error("Lead storage I/O failed on {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be (de)serialized.
    #[error("Lead collection is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl LeadError {
    /// Whether the error was caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidEmail)
    }
}
