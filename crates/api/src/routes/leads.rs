//! Lead intake endpoints.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::{lead, Lead, NewLead};

use crate::error::Result;
use crate::state::AppState;

/// Request header carrying the default client fingerprint.
pub const FINGERPRINT_HEADER: &str = "x-client-fingerprint";

/// `POST /api/leads` - run a submission through the guard pipeline.
///
/// Returns 201 with the created lead; 429 when a rate limit rejects it,
/// 422 for phone verification and reference validation failures.
pub async fn create_lead(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<NewLead>,
) -> Result<(StatusCode, Json<Lead>)> {
    let fingerprint_header = headers
        .get(FINGERPRINT_HEADER)
        .and_then(|value| value.to_str().ok());

    let created = state.intake.intake(submission, fingerprint_header).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/leads/:id` - fetch a lead. Soft-deleted leads are 404.
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Lead>> {
    let found = lead::get_lead(state.db.pool(), id).await?;
    Ok(Json(found))
}
