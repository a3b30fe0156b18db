//! Sliding-window rate limiters backed by point-in-time count queries.
//!
//! None of these keep a counter: each check re-counts lead rows inside
//! `now() - window`, so correctness under concurrent submissions is best
//! effort (two requests can both pass before either commits).

use std::env;

use sqlx::SqlitePool;

use crate::error::{IntakeError, RateLimitScope};

/// Thresholds and windows for the four intake rate limiters.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Leads per user, any client.
    pub user_limit: i64,
    pub user_window_minutes: u32,

    /// Leads per client fingerprint.
    pub client_leads_limit: i64,
    pub client_leads_window_minutes: u32,

    /// Distinct quizzes per client fingerprint.
    pub client_quizzes_limit: usize,
    pub client_quizzes_window_minutes: u32,

    /// Test leads per client fingerprint.
    pub test_limit: i64,
    pub test_window_minutes: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            user_limit: 20_000,
            user_window_minutes: 60,
            client_leads_limit: 5,
            client_leads_window_minutes: 20,
            client_quizzes_limit: 5,
            client_quizzes_window_minutes: 20,
            test_limit: 20,
            test_window_minutes: 10,
        }
    }
}

impl RateLimitConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `LEAD_LIMIT_USER` | Leads per user | `20000` |
    /// | `LEAD_LIMIT_USER_WINDOW_MINUTES` | User window | `60` |
    /// | `LEAD_LIMIT_CLIENT` | Leads per fingerprint | `5` |
    /// | `LEAD_LIMIT_CLIENT_WINDOW_MINUTES` | Fingerprint window | `20` |
    /// | `LEAD_LIMIT_QUIZZES` | Distinct quizzes per fingerprint | `5` |
    /// | `LEAD_LIMIT_QUIZZES_WINDOW_MINUTES` | Quiz window | `20` |
    /// | `LEAD_LIMIT_TEST` | Test leads per fingerprint | `20` |
    /// | `LEAD_LIMIT_TEST_WINDOW_MINUTES` | Test lead window | `10` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        fn var<T: std::str::FromStr>(name: &str, default: T) -> T {
            env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        Self {
            user_limit: var("LEAD_LIMIT_USER", defaults.user_limit),
            user_window_minutes: var("LEAD_LIMIT_USER_WINDOW_MINUTES", defaults.user_window_minutes),
            client_leads_limit: var("LEAD_LIMIT_CLIENT", defaults.client_leads_limit),
            client_leads_window_minutes: var(
                "LEAD_LIMIT_CLIENT_WINDOW_MINUTES",
                defaults.client_leads_window_minutes,
            ),
            client_quizzes_limit: var("LEAD_LIMIT_QUIZZES", defaults.client_quizzes_limit),
            client_quizzes_window_minutes: var(
                "LEAD_LIMIT_QUIZZES_WINDOW_MINUTES",
                defaults.client_quizzes_window_minutes,
            ),
            test_limit: var("LEAD_LIMIT_TEST", defaults.test_limit),
            test_window_minutes: var("LEAD_LIMIT_TEST_WINDOW_MINUTES", defaults.test_window_minutes),
        }
    }
}

/// The four intake rate limiters. Each is a no-op when its key attribute
/// is absent from the submission.
#[derive(Debug, Clone)]
pub struct RateLimiters {
    config: RateLimitConfig,
}

impl RateLimiters {
    /// Create limiters with the given thresholds.
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    /// Global per-user quota.
    pub async fn ensure_user_quota(
        &self,
        pool: &SqlitePool,
        user_id: Option<i64>,
    ) -> Result<(), IntakeError> {
        let Some(user_id) = user_id else {
            return Ok(());
        };

        let count = database::lead::count_recent_by_user(
            pool,
            user_id,
            self.config.user_window_minutes,
        )
        .await?;

        if count >= self.config.user_limit {
            return Err(self.exceeded(RateLimitScope::GlobalUser));
        }
        Ok(())
    }

    /// Leads per client fingerprint.
    pub async fn ensure_client_leads(
        &self,
        pool: &SqlitePool,
        fingerprint: Option<&str>,
    ) -> Result<(), IntakeError> {
        let Some(fingerprint) = fingerprint else {
            return Ok(());
        };

        let count = database::lead::count_recent_by_fingerprint(
            pool,
            fingerprint,
            self.config.client_leads_window_minutes,
        )
        .await?;

        if count >= self.config.client_leads_limit {
            return Err(self.exceeded(RateLimitScope::ClientLeads));
        }
        Ok(())
    }

    /// Distinct quizzes per client fingerprint. A quiz already seen inside
    /// the window never counts against the budget.
    pub async fn ensure_client_quizzes(
        &self,
        pool: &SqlitePool,
        fingerprint: Option<&str>,
        quiz_id: Option<i64>,
    ) -> Result<(), IntakeError> {
        let (Some(fingerprint), Some(quiz_id)) = (fingerprint, quiz_id) else {
            return Ok(());
        };

        let seen = database::lead::recent_quiz_ids_by_fingerprint(
            pool,
            fingerprint,
            self.config.client_quizzes_window_minutes,
        )
        .await?;

        if !seen.contains(&quiz_id) && seen.len() >= self.config.client_quizzes_limit {
            return Err(self.exceeded(RateLimitScope::ClientQuizzes));
        }
        Ok(())
    }

    /// Test leads per client fingerprint. Only applies to test submissions.
    pub async fn ensure_test_leads(
        &self,
        pool: &SqlitePool,
        fingerprint: Option<&str>,
        is_test: bool,
    ) -> Result<(), IntakeError> {
        if !is_test {
            return Ok(());
        }
        let Some(fingerprint) = fingerprint else {
            return Ok(());
        };

        let count = database::lead::count_recent_test_by_fingerprint(
            pool,
            fingerprint,
            self.config.test_window_minutes,
        )
        .await?;

        if count >= self.config.test_limit {
            return Err(self.exceeded(RateLimitScope::TestLead));
        }
        Ok(())
    }

    fn exceeded(&self, scope: RateLimitScope) -> IntakeError {
        let (limit, window_minutes) = match scope {
            RateLimitScope::GlobalUser => (self.config.user_limit, self.config.user_window_minutes),
            RateLimitScope::ClientLeads => (
                self.config.client_leads_limit,
                self.config.client_leads_window_minutes,
            ),
            RateLimitScope::ClientQuizzes => (
                self.config.client_quizzes_limit as i64,
                self.config.client_quizzes_window_minutes,
            ),
            RateLimitScope::TestLead => (self.config.test_limit, self.config.test_window_minutes),
        };

        tracing::warn!(%scope, limit, window_minutes, "Rate limit exceeded");
        IntakeError::RateLimitExceeded {
            scope,
            limit,
            window_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{lead, Database, NewLead};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn limiters() -> RateLimiters {
        RateLimiters::new(RateLimitConfig {
            client_leads_limit: 2,
            test_limit: 1,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_missing_key_attribute_is_a_noop() {
        let db = test_db().await;
        let limiters = limiters();

        limiters.ensure_user_quota(db.pool(), None).await.unwrap();
        limiters.ensure_client_leads(db.pool(), None).await.unwrap();
        limiters
            .ensure_client_quizzes(db.pool(), Some("fp"), None)
            .await
            .unwrap();
        limiters
            .ensure_client_quizzes(db.pool(), None, Some(1))
            .await
            .unwrap();
        limiters
            .ensure_test_leads(db.pool(), Some("fp"), false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_client_leads_threshold() {
        let db = test_db().await;
        let limiters = limiters();

        for _ in 0..2 {
            limiters
                .ensure_client_leads(db.pool(), Some("fp-l"))
                .await
                .unwrap();
            lead::create_lead(
                db.pool(),
                &NewLead {
                    fingerprint: Some("fp-l".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let err = limiters
            .ensure_client_leads(db.pool(), Some("fp-l"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::RateLimitExceeded {
                scope: RateLimitScope::ClientLeads,
                limit: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_seen_quiz_never_counts_against_budget() {
        let db = test_db().await;
        let limiters = RateLimiters::new(RateLimitConfig {
            client_quizzes_limit: 2,
            ..Default::default()
        });

        for quiz_id in [10, 11] {
            lead::create_lead(
                db.pool(),
                &NewLead {
                    fingerprint: Some("fp-q".to_string()),
                    quiz_id: Some(quiz_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        // Budget of 2 distinct quizzes is spent, but a seen quiz still passes.
        limiters
            .ensure_client_quizzes(db.pool(), Some("fp-q"), Some(10))
            .await
            .unwrap();

        let err = limiters
            .ensure_client_quizzes(db.pool(), Some("fp-q"), Some(12))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::RateLimitExceeded {
                scope: RateLimitScope::ClientQuizzes,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_test_lead_threshold_ignores_real_leads() {
        let db = test_db().await;
        let limiters = limiters();

        // Real leads do not consume the test budget.
        lead::create_lead(
            db.pool(),
            &NewLead {
                fingerprint: Some("fp-t".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        limiters
            .ensure_test_leads(db.pool(), Some("fp-t"), true)
            .await
            .unwrap();

        lead::create_lead(
            db.pool(),
            &NewLead {
                fingerprint: Some("fp-t".to_string()),
                is_test: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = limiters
            .ensure_test_leads(db.pool(), Some("fp-t"), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::RateLimitExceeded {
                scope: RateLimitScope::TestLead,
                ..
            }
        ));
    }
}
