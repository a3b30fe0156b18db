//! Route handlers for the lead intake API.

pub mod health;
pub mod leads;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Lead intake
        .route("/api/leads", post(leads::create_lead))
        .route("/api/leads/:id", get(leads::get_lead))
}
