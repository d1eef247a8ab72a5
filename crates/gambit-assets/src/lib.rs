//! PDF asset cache for the Gambit lead service.
//!
//! This crate provides:
//! - `RendererFactory` / `PdfRenderer` - Injected HTML-to-PDF capability
//! - `render_scoped` - Acquire, render, release on every exit path
//! - `ChromeRendererFactory` - Headless Chrome/Chromium implementation
//! - `AssetCache` - Render the checklist once, serve the cached bytes forever
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gambit_assets::{AssetCache, ChromeRendererFactory};
//!
//! let factory = Arc::new(ChromeRendererFactory::from_config(&config.renderer));
//! let cache = AssetCache::new(
//!     config.storage.checklist_path(),
//!     config.storage.template_path(),
//!     factory,
//! );
//!
//! let pdf = cache.fetch_checklist().await?;
//! assert!(pdf.bytes.starts_with(b"%PDF"));
//! ```

mod cache;
mod chrome;
mod error;
mod renderer;

pub use cache::*;
pub use chrome::*;
pub use error::*;
pub use renderer::*;

pub use gambit_core::PageFormat;
