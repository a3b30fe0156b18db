//! Quiz lookups for intake validation.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Quiz;

/// Create a quiz and return the created row.
pub async fn create_quiz(
    pool: &SqlitePool,
    user_id: Option<i64>,
    title: &str,
    blocked: bool,
) -> Result<Quiz> {
    let result = sqlx::query("INSERT INTO quizzes (user_id, title, blocked) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(title)
        .bind(blocked)
        .execute(pool)
        .await?;

    get_quiz(pool, result.last_insert_rowid()).await
}

/// Get a quiz by ID.
pub async fn get_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, user_id, title, blocked, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Quiz",
        id: id.to_string(),
    })
}

/// Set a quiz's blocked flag.
pub async fn set_quiz_blocked(pool: &SqlitePool, id: i64, blocked: bool) -> Result<()> {
    let result = sqlx::query("UPDATE quizzes SET blocked = ? WHERE id = ?")
        .bind(blocked)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Quiz",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_quiz_blocked_flag() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let quiz = create_quiz(db.pool(), None, "Onboarding", false).await.unwrap();
        assert!(!quiz.blocked);

        set_quiz_blocked(db.pool(), quiz.id, true).await.unwrap();
        let quiz = get_quiz(db.pool(), quiz.id).await.unwrap();
        assert!(quiz.blocked);

        let missing = get_quiz(db.pool(), quiz.id + 1).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
