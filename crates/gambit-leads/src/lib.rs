//! Lead capture for the Gambit lead service.
//!
//! This crate provides:
//! - `EmailAddress` - Validated email newtype
//! - `Lead` / `LeadSubmission` / `NewLead` - Stored record, raw payload, validated payload
//! - `LeadStorage` - Load/save abstraction with file and in-memory backends
//! - `LeadStore` - Deduplicating, append-only submission logic
//!
//! # Example
//!
//! ```ignore
//! use gambit_leads::{FileLeadStorage, LeadStore, LeadSubmission};
//!
//! let storage = FileLeadStorage::new("leads.json");
//! storage.init().await?;
//!
//! let store = LeadStore::new(storage);
//! let outcome = store.submit(LeadSubmission::new("a@b.com")).await?;
//! println!("{}", outcome.message());
//! ```

mod email;
mod error;
mod lead;
mod storage;
mod store;

pub use email::*;
pub use error::*;
pub use lead::*;
pub use storage::*;
pub use store::*;
