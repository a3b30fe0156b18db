//! Lead persistence and the count queries backing the intake rate limits.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Lead, NewLead};

/// Default for `external_system` when the submission omits it.
pub const DEFAULT_EXTERNAL_SYSTEM: &str = "direct";
/// Default for `external_entity` when the submission omits it.
pub const DEFAULT_EXTERNAL_ENTITY: &str = "quiz";
/// Default for `external_entity_id` when the submission omits it and carries
/// no quiz reference.
pub const DEFAULT_EXTERNAL_ENTITY_ID: &str = "0";

const LEAD_COLUMNS: &str = "id, external_id, external_system, external_entity, external_entity_id, \
     user_id, quiz_id, name, email, phone, messengers, answers, ip_address, city, country, \
     utm_source, utm_medium, utm_campaign, utm_term, utm_content, status, is_test, viewed, \
     paid, blocked, fingerprint, equal_answer_id, created_at, updated_at, deleted_at";

/// Persist a lead candidate and return the created row.
///
/// The external identity fields are defaulted here so the stored row never
/// carries an empty `external_system` / `external_entity` /
/// `external_entity_id`.
pub async fn create_lead(pool: &SqlitePool, candidate: &NewLead) -> Result<Lead> {
    let external_system = candidate
        .external_system
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTERNAL_SYSTEM.to_string());
    let external_entity = candidate
        .external_entity
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTERNAL_ENTITY.to_string());
    let external_entity_id = candidate
        .external_entity_id
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            candidate
                .quiz_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| DEFAULT_EXTERNAL_ENTITY_ID.to_string())
        });

    let result = sqlx::query(
        r#"
        INSERT INTO leads (
            external_id, external_system, external_entity, external_entity_id,
            user_id, quiz_id, name, email, phone, messengers, answers,
            ip_address, city, country,
            utm_source, utm_medium, utm_campaign, utm_term, utm_content,
            is_test, paid, blocked, fingerprint, equal_answer_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&candidate.external_id)
    .bind(&external_system)
    .bind(&external_entity)
    .bind(&external_entity_id)
    .bind(candidate.user_id)
    .bind(candidate.quiz_id)
    .bind(&candidate.name)
    .bind(&candidate.email)
    .bind(&candidate.phone)
    .bind(Json(&candidate.messengers))
    .bind(Json(&candidate.answers))
    .bind(&candidate.ip_address)
    .bind(&candidate.city)
    .bind(&candidate.country)
    .bind(&candidate.utm_source)
    .bind(&candidate.utm_medium)
    .bind(&candidate.utm_campaign)
    .bind(&candidate.utm_term)
    .bind(&candidate.utm_content)
    .bind(candidate.is_test)
    .bind(candidate.paid)
    .bind(candidate.blocked)
    .bind(&candidate.fingerprint)
    .bind(candidate.equal_answer_id)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(lead_id = id, "Lead row inserted");

    get_lead(pool, id).await
}

/// Get a non-deleted lead by ID.
pub async fn get_lead(pool: &SqlitePool, id: i64) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Lead",
        id: id.to_string(),
    })
}

/// Most recent non-deleted lead with the given fingerprint.
///
/// "Most recent" is the highest ID, so two leads created in the same instant
/// still resolve deterministically.
pub async fn latest_by_fingerprint(pool: &SqlitePool, fingerprint: &str) -> Result<Option<Lead>> {
    let lead = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads \
         WHERE fingerprint = ? AND deleted_at IS NULL \
         ORDER BY id DESC LIMIT 1"
    ))
    .bind(fingerprint)
    .fetch_optional(pool)
    .await?;

    Ok(lead)
}

/// Count leads created by a user within the last `window_minutes`.
pub async fn count_recent_by_user(
    pool: &SqlitePool,
    user_id: i64,
    window_minutes: u32,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads
        WHERE user_id = ? AND created_at >= datetime('now', ?)
        "#,
    )
    .bind(user_id)
    .bind(window_modifier(window_minutes))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count leads with the given fingerprint created within the last `window_minutes`.
pub async fn count_recent_by_fingerprint(
    pool: &SqlitePool,
    fingerprint: &str,
    window_minutes: u32,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads
        WHERE fingerprint = ? AND created_at >= datetime('now', ?)
        "#,
    )
    .bind(fingerprint)
    .bind(window_modifier(window_minutes))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Distinct quiz IDs seen for a fingerprint within the last `window_minutes`.
pub async fn recent_quiz_ids_by_fingerprint(
    pool: &SqlitePool,
    fingerprint: &str,
    window_minutes: u32,
) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT DISTINCT quiz_id FROM leads
        WHERE fingerprint = ? AND quiz_id IS NOT NULL
          AND created_at >= datetime('now', ?)
        "#,
    )
    .bind(fingerprint)
    .bind(window_modifier(window_minutes))
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Count test leads with the given fingerprint created within the last `window_minutes`.
pub async fn count_recent_test_by_fingerprint(
    pool: &SqlitePool,
    fingerprint: &str,
    window_minutes: u32,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads
        WHERE fingerprint = ? AND is_test = 1 AND created_at >= datetime('now', ?)
        "#,
    )
    .bind(fingerprint)
    .bind(window_modifier(window_minutes))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Soft-delete a lead. The row stays in place for duplicate/rate-limit history.
pub async fn soft_delete_lead(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET deleted_at = datetime('now'), updated_at = datetime('now')
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// SQLite datetime modifier for "window_minutes ago".
fn window_modifier(window_minutes: u32) -> String {
    format!("-{} minutes", window_minutes)
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

    fn candidate(fingerprint: &str) -> NewLead {
        NewLead {
            fingerprint: Some(fingerprint.to_string()),
            ..Default::default()
        }
    }

    /// Push a lead's created_at into the past, outside any test window.
    async fn backdate(pool: &SqlitePool, id: i64, minutes: i64) {
        sqlx::query("UPDATE leads SET created_at = datetime('now', ?) WHERE id = ?")
            .bind(format!("-{} minutes", minutes))
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_external_fields_defaulted() {
        let db = test_db().await;

        let lead = create_lead(db.pool(), &NewLead::default()).await.unwrap();
        assert_eq!(lead.external_system, DEFAULT_EXTERNAL_SYSTEM);
        assert_eq!(lead.external_entity, DEFAULT_EXTERNAL_ENTITY);
        assert_eq!(lead.external_entity_id, DEFAULT_EXTERNAL_ENTITY_ID);

        let with_quiz = create_lead(
            db.pool(),
            &NewLead {
                quiz_id: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(with_quiz.external_entity_id, "42");
    }

    #[tokio::test]
    async fn test_latest_by_fingerprint_prefers_highest_id() {
        let db = test_db().await;

        let a = create_lead(db.pool(), &candidate("fp-x")).await.unwrap();
        let b = create_lead(db.pool(), &candidate("fp-x")).await.unwrap();
        create_lead(db.pool(), &candidate("fp-other")).await.unwrap();

        let latest = latest_by_fingerprint(db.pool(), "fp-x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, b.id);

        // Soft-deleted leads no longer participate.
        soft_delete_lead(db.pool(), b.id).await.unwrap();
        let latest = latest_by_fingerprint(db.pool(), "fp-x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, a.id);
    }

    #[tokio::test]
    async fn test_count_recent_by_fingerprint_respects_window() {
        let db = test_db().await;

        for _ in 0..3 {
            create_lead(db.pool(), &candidate("fp-count")).await.unwrap();
        }
        let old = create_lead(db.pool(), &candidate("fp-count")).await.unwrap();
        backdate(db.pool(), old.id, 30).await;

        let count = count_recent_by_fingerprint(db.pool(), "fp-count", 20)
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_recent_quiz_ids_distinct() {
        let db = test_db().await;

        for quiz_id in [1, 1, 2, 3] {
            create_lead(
                db.pool(),
                &NewLead {
                    quiz_id: Some(quiz_id),
                    ..candidate("fp-quiz")
                },
            )
            .await
            .unwrap();
        }
        // No quiz reference: not counted.
        create_lead(db.pool(), &candidate("fp-quiz")).await.unwrap();

        let mut ids = recent_quiz_ids_by_fingerprint(db.pool(), "fp-quiz", 20)
            .await
            .unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_count_recent_test_leads() {
        let db = test_db().await;

        create_lead(
            db.pool(),
            &NewLead {
                is_test: true,
                ..candidate("fp-test")
            },
        )
        .await
        .unwrap();
        create_lead(db.pool(), &candidate("fp-test")).await.unwrap();

        let count = count_recent_test_by_fingerprint(db.pool(), "fp-test", 10)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_count_recent_by_user() {
        let db = test_db().await;

        for _ in 0..2 {
            create_lead(
                db.pool(),
                &NewLead {
                    user_id: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(count_recent_by_user(db.pool(), 7, 60).await.unwrap(), 2);
        assert_eq!(count_recent_by_user(db.pool(), 8, 60).await.unwrap(), 0);
    }
}
