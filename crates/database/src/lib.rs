//! SQLite persistence layer for the lead intake service.
//!
//! This crate provides async database operations for leads, block-list
//! entries, and phone verification records using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, models::NewLead, lead};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:leads.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Persist a lead
//!     let candidate = NewLead {
//!         email: Some("bob@example.com".to_string()),
//!         fingerprint: Some("fp-1".to_string()),
//!         ..Default::default()
//!     };
//!     let lead = lead::create_lead(db.pool(), &candidate).await?;
//!     println!("created lead {}", lead.id);
//!
//!     Ok(())
//! }
//! ```

pub mod blocklist;
pub mod error;
pub mod lead;
pub mod models;
pub mod phone_verification;
pub mod quiz;
pub mod user;

pub use error::{DatabaseError, Result};
pub use models::{
    BlockMatch, BlocklistEntry, Lead, LeadStatus, NewLead, PhoneVerification, Quiz, User,
    VerificationStatus,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent intake requests.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for an in-memory database (tests).
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_lead_roundtrip() {
        let db = test_db().await;

        let candidate = NewLead {
            email: Some("alice@example.com".to_string()),
            fingerprint: Some("fp-roundtrip".to_string()),
            ..Default::default()
        };
        let created = lead::create_lead(db.pool(), &candidate).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status, LeadStatus::New);

        let fetched = lead::get_lead(db.pool(), created.id).await.unwrap();
        assert_eq!(fetched.email.as_deref(), Some("alice@example.com"));

        lead::soft_delete_lead(db.pool(), created.id).await.unwrap();
        let result = lead::get_lead(db.pool(), created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
