//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use gambit_assets::PDF_CONTENT_TYPE;
use gambit_core::RequestId;
use gambit_leads::LeadSubmission;
use gambit_observability::LogLevel;
use http::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::middleware::X_CACHE_STATUS;

/// `GET /health` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `POST /api/lead` success body.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
}

/// Error body shared by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn reply(status: StatusCode, error: &str) -> Response {
        (
            status,
            Json(Self {
                error: error.to_string(),
            }),
        )
            .into_response()
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Bodies that are not a JSON object count as an empty submission.
pub async fn submit_lead(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Response {
    let logger = state
        .logger(request_id, "/api/lead")
        .with_component("leads");
    let submission = payload.map(|Json(body)| body).unwrap_or_default();

    match state.leads.submit(submission).await {
        Ok(outcome) => {
            match outcome.lead() {
                Some(lead) => logger
                    .event(LogLevel::Info, "New lead")
                    .field("email", &lead.email)
                    .field("source", &lead.source)
                    .field("created_at", lead.created_at.to_rfc3339())
                    .emit(),
                None => logger
                    .event(LogLevel::Debug, "Duplicate lead ignored")
                    .emit(),
            }

            Json(LeadResponse {
                success: true,
                message: outcome.message().to_string(),
            })
            .into_response()
        }
        Err(e) if e.is_validation() => {
            ErrorResponse::reply(StatusCode::BAD_REQUEST, "Valid email required")
        }
        Err(e) => {
            logger
                .event(LogLevel::Error, "Lead storage failed")
                .field("error", e.to_string())
                .emit();
            ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub async fn download_checklist(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let logger = state
        .logger(request_id, "/api/checklist.pdf")
        .with_component("assets");

    match state.assets.fetch_checklist().await {
        Ok(pdf) => {
            logger
                .event(LogLevel::Info, "Checklist served")
                .field("cache", pdf.status.to_string())
                .field_u64("bytes", pdf.bytes.len() as u64)
                .emit();

            let headers = [
                (CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
                (CONTENT_DISPOSITION, pdf.content_disposition()),
                (
                    HeaderName::from_static(X_CACHE_STATUS),
                    pdf.status.to_string(),
                ),
            ];
            (StatusCode::OK, headers, pdf.bytes).into_response()
        }
        Err(e) if e.is_generation_failure() => {
            logger
                .event(LogLevel::Error, "PDF generation error")
                .field("error", e.to_string())
                .emit();
            ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, "PDF generation failed")
        }
        Err(e) => {
            logger
                .event(LogLevel::Error, "Checklist storage failed")
                .field("error", e.to_string())
                .emit();
            ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
