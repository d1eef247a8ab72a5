//! Deduplicating lead store.

use gambit_core::DEFAULT_LEAD_SOURCE;
use tokio::sync::Mutex;

use crate::{Lead, LeadResult, LeadStorage, LeadSubmission, NewLead, SubmitOutcome};

/// Append-only lead collection keyed by exact email match.
///
/// Each insert reads the whole collection, appends, and writes it back.
/// Inserts are serialized so two concurrent submissions cannot overwrite
/// each other's read-modify-write.
pub struct LeadStore<S: LeadStorage> {
    storage: S,
    default_source: String,
    write_lock: Mutex<()>,
}

impl<S: LeadStorage> LeadStore<S> {
    /// Create a store over `storage`.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            default_source: DEFAULT_LEAD_SOURCE.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Override the source recorded for submissions that omit one.
    pub fn with_default_source(mut self, source: impl Into<String>) -> Self {
        self.default_source = source.into();
        self
    }

    /// Validate and record a raw submission.
    pub async fn submit(&self, submission: LeadSubmission) -> LeadResult<SubmitOutcome> {
        let lead = submission.validate()?;
        self.record(lead).await
    }

    /// Record a validated submission unless its email is already stored.
    pub async fn record(&self, new_lead: NewLead) -> LeadResult<SubmitOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut leads = self.storage.load().await?;
        if leads.iter().any(|l| l.email == new_lead.email.as_str()) {
            return Ok(SubmitOutcome::AlreadySubscribed);
        }

        let source = new_lead
            .source
            .unwrap_or_else(|| self.default_source.clone());
        let lead = Lead::new(new_lead.email, source);
        leads.push(lead.clone());
        self.storage.save(&leads).await?;

        Ok(SubmitOutcome::Saved(lead))
    }

    /// Every stored lead in insertion order.
    pub async fn leads(&self) -> LeadResult<Vec<Lead>> {
        self.storage.load().await
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{FileLeadStorage, InMemoryLeadStorage, LeadError};

    fn store() -> LeadStore<InMemoryLeadStorage> {
        LeadStore::new(InMemoryLeadStorage::new())
    }

    // === Validation Tests ===

    #[tokio::test]
    async fn test_invalid_email_leaves_collection_unchanged() {
        let store = store();
        store.submit(LeadSubmission::new("a@b.com")).await.unwrap();

        for raw in ["notanemail", "a@b", "", "two words@x.com"] {
            let result = store.submit(LeadSubmission::new(raw)).await;
            assert!(matches!(result, Err(LeadError::InvalidEmail)), "{raw:?}");
        }
        let missing = store.submit(LeadSubmission::default()).await;
        assert!(missing.unwrap_err().is_validation());

        assert_eq!(store.leads().await.unwrap().len(), 1);
        assert_eq!(store.storage().save_count(), 1);
    }

    // === Deduplication Tests ===

    #[tokio::test]
    async fn test_duplicate_is_idempotent_without_write() {
        let store = store();

        let first = store.submit(LeadSubmission::new("a@b.com")).await.unwrap();
        let second = store
            .submit(LeadSubmission::new("a@b.com").with_source("footer"))
            .await
            .unwrap();

        assert_eq!(first.message(), "Lead saved");
        assert_eq!(second, SubmitOutcome::AlreadySubscribed);
        assert_eq!(store.storage().save_count(), 1);

        let leads = store.leads().await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].source, "popup");
    }

    #[tokio::test]
    async fn test_duplicate_check_is_case_sensitive() {
        let store = store();

        store.submit(LeadSubmission::new("a@b.com")).await.unwrap();
        let outcome = store.submit(LeadSubmission::new("A@b.com")).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
        assert_eq!(store.leads().await.unwrap().len(), 2);
    }

    // === Ordering / Defaults Tests ===

    #[tokio::test]
    async fn test_insertion_order_and_sources() {
        let store = store();

        store
            .submit(LeadSubmission::new("a@b.com").with_source("hero"))
            .await
            .unwrap();
        store.submit(LeadSubmission::new("c@d.com")).await.unwrap();

        let leads = store.leads().await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].email, "a@b.com");
        assert_eq!(leads[0].source, "hero");
        assert_eq!(leads[1].email, "c@d.com");
        assert_eq!(leads[1].source, "popup");
        assert!(leads[0].created_at <= leads[1].created_at);
    }

    #[tokio::test]
    async fn test_configured_default_source() {
        let store = store().with_default_source("landing");

        let outcome = store.submit(LeadSubmission::new("x@y.com")).await.unwrap();

        assert_eq!(outcome.lead().unwrap().source, "landing");
    }

    #[tokio::test]
    async fn test_existing_leads_are_preserved() {
        let existing = Lead::new(crate::EmailAddress::parse("old@lead.io").unwrap(), "popup");
        let store = LeadStore::new(InMemoryLeadStorage::with_leads(vec![existing.clone()]));

        store.submit(LeadSubmission::new("new@lead.io")).await.unwrap();

        let leads = store.leads().await.unwrap();
        assert_eq!(leads[0], existing);
        assert_eq!(leads[1].email, "new@lead.io");
    }

    // === Concurrency Tests ===

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_are_not_lost() {
        let dir = std::env::temp_dir().join(format!("gambit-store-{}", uuid::Uuid::new_v4()));
        let storage = FileLeadStorage::new(dir.join("leads.json"));
        storage.init().await.unwrap();
        let store = Arc::new(LeadStore::new(storage));

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .submit(LeadSubmission::new(format!("user{i}@example.com")))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.leads().await.unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let storage = FileLeadStorage::new(
            std::env::temp_dir()
                .join(format!("gambit-missing-{}", uuid::Uuid::new_v4()))
                .join("leads.json"),
        );
        let store = LeadStore::new(storage);

        let result = store.submit(LeadSubmission::new("a@b.com")).await;

        assert!(matches!(result, Err(LeadError::Storage { .. })));
    }
}
