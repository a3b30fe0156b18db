//! Lead ingestion HTTP API.
//!
//! Exposes lead intake over HTTP: submissions pass through the guard
//! pipeline before anything is written, and rejections surface as
//! 422/429 responses.

mod config;
mod error;
mod routes;
mod state;

use database::Database;
use geoip::{GeoIpConfig, GeoService};
use phone_verify::{PhoneVerifyConfig, VerificationGate};
use pipeline::{IntakePipeline, RateLimitConfig};
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting lead intake API");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build the guard pipeline collaborators
    let geo = GeoService::from_config(&GeoIpConfig::from_env())?;
    let phone = VerificationGate::from_config(db.pool().clone(), &PhoneVerifyConfig::from_env())?;
    let intake = IntakePipeline::new(db.clone(), geo, phone, RateLimitConfig::from_env());

    // Build application state
    let state = AppState::new(db, intake);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Lead intake API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
