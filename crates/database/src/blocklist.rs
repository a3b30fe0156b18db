//! Block-list storage and matching.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{BlockMatch, BlocklistEntry};

/// Check whether any blacklist entry matches the given attributes.
///
/// A single matching attribute is sufficient (OR of the present fields);
/// absent fields never participate in the match. Returns `false`
/// immediately when nothing is matchable.
pub async fn matches_blacklist(pool: &SqlitePool, m: &BlockMatch) -> Result<bool> {
    if m.is_empty() {
        return Ok(false);
    }

    let found = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM blocklist
            WHERE entry_type = 'blacklist'
              AND (
                   (?1 IS NOT NULL AND phone = ?1)
                OR (?2 IS NOT NULL AND email = ?2)
                OR (?3 IS NOT NULL AND fingerprint = ?3)
                OR (?4 IS NOT NULL AND ip_address = ?4)
                OR (?5 IS NOT NULL AND quiz_id = ?5)
                OR (?6 IS NOT NULL AND user_id = ?6)
              )
        )
        "#,
    )
    .bind(&m.phone)
    .bind(&m.email)
    .bind(&m.fingerprint)
    .bind(&m.ip_address)
    .bind(m.quiz_id)
    .bind(m.user_id)
    .fetch_one(pool)
    .await?;

    Ok(found)
}

/// Insert a block-list entry. Management surface; the intake pipeline only reads.
pub async fn create_entry(pool: &SqlitePool, entry_type: &str, m: &BlockMatch, reason: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO blocklist (entry_type, phone, email, fingerprint, ip_address, quiz_id, user_id, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry_type)
    .bind(&m.phone)
    .bind(&m.email)
    .bind(&m.fingerprint)
    .bind(&m.ip_address)
    .bind(m.quiz_id)
    .bind(m.user_id)
    .bind(reason)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List all block-list entries, newest first.
pub async fn list_entries(pool: &SqlitePool) -> Result<Vec<BlocklistEntry>> {
    let entries = sqlx::query_as::<_, BlocklistEntry>(
        r#"
        SELECT id, entry_type, phone, email, fingerprint, ip_address, quiz_id, user_id, reason, created_at
        FROM blocklist
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
