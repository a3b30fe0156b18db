//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use geoip::{GeoService, HttpGeoProvider};
use phone_verify::{HttpLookupProvider, VerificationGate};
use pipeline::IntakePipeline;

/// The production pipeline over the HTTP-backed providers.
pub type LivePipeline =
    IntakePipeline<GeoService<HttpGeoProvider>, VerificationGate<HttpLookupProvider>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Lead intake guard pipeline.
    pub intake: Arc<LivePipeline>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, intake: LivePipeline) -> Self {
        Self {
            db,
            intake: Arc::new(intake),
        }
    }
}
