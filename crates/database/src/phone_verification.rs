//! Phone verification record storage.
//!
//! One row per verification attempt. A record gates lead intake only while
//! its status is `verified` and `expires_at` is NULL or in the future;
//! expiry is a time comparison, not a stored transition.

use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{PhoneVerification, VerificationStatus};

const VERIFICATION_COLUMNS: &str =
    "id, phone, status, verified_at, expires_at, provider_response, lead_id, created_at";

/// Insert a verification attempt and return the created row.
///
/// `verified_at` is stamped for `verified` records. `ttl_minutes`, when
/// present, sets `expires_at` that far into the future; `Some(0)` produces
/// an immediately-expired record (used for failed lookups so the next
/// attempt triggers a fresh one).
pub async fn insert_verification(
    pool: &SqlitePool,
    phone: &str,
    status: VerificationStatus,
    ttl_minutes: Option<u32>,
    provider_response: Option<&Value>,
) -> Result<PhoneVerification> {
    let verified_now = status == VerificationStatus::Verified;
    let expires_modifier = ttl_minutes.map(|m| format!("+{} minutes", m));

    let result = sqlx::query(
        r#"
        INSERT INTO phone_verifications (phone, status, verified_at, expires_at, provider_response)
        VALUES (
            ?1,
            ?2,
            CASE WHEN ?3 THEN datetime('now') ELSE NULL END,
            CASE WHEN ?4 IS NOT NULL THEN datetime('now', ?4) ELSE NULL END,
            ?5
        )
        "#,
    )
    .bind(phone)
    .bind(status)
    .bind(verified_now)
    .bind(&expires_modifier)
    .bind(provider_response.map(Json))
    .execute(pool)
    .await?;

    get_verification(pool, result.last_insert_rowid()).await
}

/// Get a verification record by ID.
pub async fn get_verification(pool: &SqlitePool, id: i64) -> Result<PhoneVerification> {
    sqlx::query_as::<_, PhoneVerification>(&format!(
        "SELECT {VERIFICATION_COLUMNS} FROM phone_verifications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "PhoneVerification",
        id: id.to_string(),
    })
}

/// Most recent verification record for a phone, by latest `verified_at`.
///
/// Records that were never verified sort last (SQLite treats NULL as the
/// smallest value); ties break on the highest ID.
pub async fn latest_for_phone(pool: &SqlitePool, phone: &str) -> Result<Option<PhoneVerification>> {
    let record = sqlx::query_as::<_, PhoneVerification>(&format!(
        "SELECT {VERIFICATION_COLUMNS} FROM phone_verifications \
         WHERE phone = ? \
         ORDER BY verified_at DESC, id DESC LIMIT 1"
    ))
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Whether a record's `expires_at` lies in the past.
pub async fn is_expired(pool: &SqlitePool, id: i64) -> Result<bool> {
    let expired = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT expires_at IS NOT NULL AND expires_at <= datetime('now')
        FROM phone_verifications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "PhoneVerification",
        id: id.to_string(),
    })?;

    Ok(expired)
}

/// Whether a phone currently has a verification usable for gating.
pub async fn has_usable_verification(pool: &SqlitePool, phone: &str) -> Result<bool> {
    let usable = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM phone_verifications
            WHERE phone = ?
              AND status = 'verified'
              AND (expires_at IS NULL OR expires_at > datetime('now'))
        )
        "#,
    )
    .bind(phone)
    .fetch_one(pool)
    .await?;

    Ok(usable)
}

/// Newest verification record for a phone not yet linked to any lead.
pub async fn latest_unlinked_for_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Option<PhoneVerification>> {
    let record = sqlx::query_as::<_, PhoneVerification>(&format!(
        "SELECT {VERIFICATION_COLUMNS} FROM phone_verifications \
         WHERE phone = ? AND lead_id IS NULL \
         ORDER BY id DESC LIMIT 1"
    ))
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Link a verification record to the lead it gated.
pub async fn link_to_lead(pool: &SqlitePool, id: i64, lead_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE phone_verifications
        SET lead_id = ?
        WHERE id = ?
        "#,
    )
    .bind(lead_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "PhoneVerification",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    /// Force a record's expiry into the past.
    async fn expire(pool: &SqlitePool, id: i64) {
        sqlx::query(
            "UPDATE phone_verifications SET expires_at = datetime('now', '-1 hour') WHERE id = ?",
        )
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_verified_record_is_usable_until_expiry() {
        let db = test_db().await;

        let rec = insert_verification(
            db.pool(),
            "+15550100",
            VerificationStatus::Verified,
            Some(60),
            None,
        )
        .await
        .unwrap();
        assert!(rec.verified_at.is_some());
        assert!(rec.expires_at.is_some());

        assert!(has_usable_verification(db.pool(), "+15550100").await.unwrap());
        assert!(!is_expired(db.pool(), rec.id).await.unwrap());

        expire(db.pool(), rec.id).await;
        assert!(!has_usable_verification(db.pool(), "+15550100").await.unwrap());
        assert!(is_expired(db.pool(), rec.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_record_never_gates() {
        let db = test_db().await;

        let rec = insert_verification(
            db.pool(),
            "+15550101",
            VerificationStatus::Failed,
            Some(0),
            None,
        )
        .await
        .unwrap();
        assert!(rec.verified_at.is_none());

        assert!(!has_usable_verification(db.pool(), "+15550101").await.unwrap());
        // Zero TTL: already expired, so the gate retries the provider.
        assert!(is_expired(db.pool(), rec.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_latest_for_phone_prefers_verified_at() {
        let db = test_db().await;

        let verified = insert_verification(
            db.pool(),
            "+15550102",
            VerificationStatus::Verified,
            Some(60),
            None,
        )
        .await
        .unwrap();
        // A later failed attempt has no verified_at and sorts after.
        insert_verification(db.pool(), "+15550102", VerificationStatus::Failed, Some(0), None)
            .await
            .unwrap();

        let latest = latest_for_phone(db.pool(), "+15550102")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, verified.id);
    }

    #[tokio::test]
    async fn test_link_to_lead() {
        let db = test_db().await;

        let lead = crate::lead::create_lead(db.pool(), &crate::NewLead::default())
            .await
            .unwrap();
        let rec = insert_verification(
            db.pool(),
            "+15550103",
            VerificationStatus::Verified,
            Some(60),
            None,
        )
        .await
        .unwrap();

        let unlinked = latest_unlinked_for_phone(db.pool(), "+15550103")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unlinked.id, rec.id);

        link_to_lead(db.pool(), rec.id, lead.id).await.unwrap();
        assert!(latest_unlinked_for_phone(db.pool(), "+15550103")
            .await
            .unwrap()
            .is_none());

        let fetched = get_verification(db.pool(), rec.id).await.unwrap();
        assert_eq!(fetched.lead_id, Some(lead.id));
    }
}
