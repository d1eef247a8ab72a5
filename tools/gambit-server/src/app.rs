//! Router and shared state.

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use gambit_assets::{AssetCache, ChromeRendererFactory, PdfOptions};
use gambit_core::{GambitConfig, LogFormat, RequestId};
use gambit_leads::{FileLeadStorage, LeadError, LeadStorage, LeadStore};
use gambit_observability::{LogLevel, StructuredLogger};
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::{answer_preflight, apply_cors, assign_request_id};

/// Lead store over any storage backend.
pub type SharedLeadStore = LeadStore<Arc<dyn LeadStorage>>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub leads: Arc<SharedLeadStore>,
    pub assets: Arc<AssetCache>,
    log_format: LogFormat,
    log_level: LogLevel,
}

impl AppState {
    /// State over an existing store and cache.
    pub fn new(leads: SharedLeadStore, assets: AssetCache) -> Self {
        Self {
            leads: Arc::new(leads),
            assets: Arc::new(assets),
            log_format: LogFormat::Human,
            log_level: LogLevel::Info,
        }
    }

    /// Set request log format and minimum level.
    pub fn with_logging(mut self, format: LogFormat, level: LogLevel) -> Self {
        self.log_format = format;
        self.log_level = level;
        self
    }

    /// Request-scoped logger.
    pub fn logger(&self, request_id: RequestId, route: &str) -> StructuredLogger {
        StructuredLogger::new(request_id)
            .with_route(route)
            .with_format(self.log_format)
            .with_min_level(self.log_level)
    }
}

/// File-backed lead store, creating the collection file if it is missing.
pub async fn lead_store_from_config(config: &GambitConfig) -> Result<SharedLeadStore, LeadError> {
    let storage = FileLeadStorage::new(config.storage.leads_path());
    storage.init().await?;

    let storage: Arc<dyn LeadStorage> = Arc::new(storage);
    Ok(LeadStore::new(storage).with_default_source(&config.leads.default_source))
}

/// Checklist cache rendering through headless Chrome.
pub fn asset_cache_from_config(config: &GambitConfig) -> AssetCache {
    let factory = Arc::new(ChromeRendererFactory::from_config(&config.renderer));
    AssetCache::new(
        config.storage.checklist_path(),
        config.storage.template_path(),
        factory,
    )
    .with_options(PdfOptions::from(&config.renderer))
}

/// Build the service router. Unmatched paths are served from `public_dir`.
pub fn build_router(state: AppState, public_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/lead", post(handlers::submit_lead))
        .route("/api/checklist.pdf", get(handlers::download_checklist))
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .layer(axum::middleware::from_fn(answer_preflight))
        .layer(axum::middleware::from_fn(assign_request_id))
        .layer(axum::middleware::map_response(apply_cors))
        .with_state(state)
}
