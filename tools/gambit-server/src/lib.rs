//! HTTP surface of the Gambit lead service.
//!
//! Routes:
//! - `GET /health` - Liveness probe
//! - `POST /api/lead` - Lead submission
//! - `GET /api/checklist.pdf` - Cached checklist download
//! - anything else - Static files from the public directory

mod app;
mod handlers;
mod middleware;

pub use app::*;
pub use handlers::{ErrorResponse, HealthResponse, LeadResponse};
pub use middleware::{ALLOWED_HEADERS, X_CACHE_STATUS, X_REQUEST_ID};
