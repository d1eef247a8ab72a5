//! Lead collection storage backends.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{Lead, LeadError};

/// Result type for storage operations.
pub type LeadResult<T> = Result<T, LeadError>;

/// Whole-collection load/save.
///
/// Implementations read and write the full collection; there are no
/// partial updates.
#[async_trait]
pub trait LeadStorage: Send + Sync {
    /// Load every stored lead in insertion order.
    async fn load(&self) -> LeadResult<Vec<Lead>>;

    /// Replace the stored collection.
    async fn save(&self, leads: &[Lead]) -> LeadResult<()>;
}

#[async_trait]
impl<T: LeadStorage + ?Sized> LeadStorage for Arc<T> {
    async fn load(&self) -> LeadResult<Vec<Lead>> {
        (**self).load().await
    }

    async fn save(&self, leads: &[Lead]) -> LeadResult<()> {
        (**self).save(leads).await
    }
}

/// Pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileLeadStorage {
    path: PathBuf,
}

impl FileLeadStorage {
    /// Storage backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Collection file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty collection (`[]`) if the file does not exist yet.
    pub async fn init(&self) -> LeadResult<()> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| self.io_error(e))?
        {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        tokio::fs::write(&self.path, "[]")
            .await
            .map_err(|e| self.io_error(e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> LeadError {
        LeadError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl LeadStorage for FileLeadStorage {
    async fn load(&self) -> LeadResult<Vec<Lead>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, leads: &[Lead]) -> LeadResult<()> {
        let content = serde_json::to_string_pretty(leads)?;
        let temp = self.temp_path();

        // Replace by rename so readers never observe a half-written file.
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// In-memory backend (for development/testing).
#[derive(Debug, Default)]
pub struct InMemoryLeadStorage {
    leads: Mutex<Vec<Lead>>,
    saves: AtomicUsize,
}

impl InMemoryLeadStorage {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `leads`.
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        Self {
            leads: Mutex::new(leads),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current contents.
    pub fn snapshot(&self) -> Vec<Lead> {
        self.leads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LeadStorage for InMemoryLeadStorage {
    async fn load(&self) -> LeadResult<Vec<Lead>> {
        Ok(self.snapshot())
    }

    async fn save(&self, leads: &[Lead]) -> LeadResult<()> {
        *self
            .leads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = leads.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
