//! The intake pipeline: ordered guards and enrichments around a single
//! lead insert.

use database::{blocklist, lead, quiz, user, BlockMatch, Database, DatabaseError, Lead, NewLead};
use intake_core::{Geolocator, PhoneVerifier};
use tracing::{info, warn};

use crate::error::IntakeError;
use crate::limits::{RateLimitConfig, RateLimiters};
use crate::payment;

/// The lead intake guard pipeline.
///
/// All collaborators are constructor-injected so tests can substitute
/// fakes for the geolocation and phone-verification services.
pub struct IntakePipeline<G: Geolocator, V: PhoneVerifier> {
    db: Database,
    geo: G,
    phone: V,
    limits: RateLimiters,
}

impl<G: Geolocator, V: PhoneVerifier> IntakePipeline<G, V> {
    /// Create a pipeline over the given collaborators.
    pub fn new(db: Database, geo: G, phone: V, config: RateLimitConfig) -> Self {
        Self {
            db,
            geo,
            phone,
            limits: RateLimiters::new(config),
        }
    }

    /// Run the full guard sequence and persist the lead.
    ///
    /// `fingerprint_header` is the `X-Client-Fingerprint` request header,
    /// used as the fingerprint default when the submission carries none.
    /// The first terminating failure aborts the creation; nothing is
    /// written in that case.
    pub async fn intake(
        &self,
        mut candidate: NewLead,
        fingerprint_header: Option<&str>,
    ) -> Result<Lead, IntakeError> {
        let pool = self.db.pool();

        // 1. Fingerprint default from the client header.
        if candidate.fingerprint.as_deref().map_or(true, str::is_empty) {
            candidate.fingerprint = fingerprint_header
                .filter(|h| !h.is_empty())
                .map(String::from);
        }

        // 2. Referenced user/quiz must exist; blocked quizzes reject.
        self.validate_references(&candidate).await?;

        // 3. Phone verification gate.
        self.phone
            .ensure_verified(candidate.phone.as_deref().unwrap_or(""))
            .await?;

        // 4-7. Rate limits, cheapest rejection first.
        let fingerprint = candidate.fingerprint.as_deref();
        self.limits.ensure_user_quota(pool, candidate.user_id).await?;
        self.limits.ensure_client_leads(pool, fingerprint).await?;
        self.limits
            .ensure_client_quizzes(pool, fingerprint, candidate.quiz_id)
            .await?;
        self.limits
            .ensure_test_leads(pool, fingerprint, candidate.is_test)
            .await?;

        // 8. Duplicate detection: link the most recent lead with the same
        // fingerprint. Mutation only; the insert below persists it.
        if let Some(fp) = &candidate.fingerprint {
            if let Some(prior) = lead::latest_by_fingerprint(pool, fp).await? {
                candidate.equal_answer_id = Some(prior.id);
            }
        }

        // 9. Payment signal. One-way: never clears an already-set flag.
        if payment::should_mark_paid(&candidate.answers) {
            candidate.paid = true;
        }

        // 10. Block list. A read failure degrades to "not blocked".
        match blocklist::matches_blacklist(pool, &block_match(&candidate)).await {
            Ok(true) => candidate.blocked = true,
            Ok(false) => {}
            Err(err) => warn!(error = %err, "Block list check failed, not blocking"),
        }

        // 11. Geo-enrichment, only for the fields still missing.
        if let Some(ip) = candidate.ip_address.clone() {
            if candidate.city.is_none() || candidate.country.is_none() {
                let location = self.geo.locate(&ip).await;
                if candidate.city.is_none() {
                    candidate.city = location.city;
                }
                if candidate.country.is_none() {
                    candidate.country = location.country;
                }
            }
        }

        let created = lead::create_lead(pool, &candidate).await?;
        info!(
            lead_id = created.id,
            blocked = created.blocked,
            paid = created.paid,
            duplicate_of = created.equal_answer_id,
            "Lead created"
        );

        // Post-creation: link the verification record to the new lead.
        // Best-effort; the lead stands regardless.
        if let Some(phone) = &created.phone {
            self.phone.attach_lead(created.id, phone).await;
        }

        Ok(created)
    }

    async fn validate_references(&self, candidate: &NewLead) -> Result<(), IntakeError> {
        let pool = self.db.pool();

        if let Some(user_id) = candidate.user_id {
            if !user::user_exists(pool, user_id).await? {
                return Err(IntakeError::Validation(format!(
                    "user {user_id} does not exist"
                )));
            }
        }

        if let Some(quiz_id) = candidate.quiz_id {
            match quiz::get_quiz(pool, quiz_id).await {
                Ok(quiz) if quiz.blocked => {
                    return Err(IntakeError::Validation(format!("quiz {quiz_id} is blocked")));
                }
                Ok(_) => {}
                Err(DatabaseError::NotFound { .. }) => {
                    return Err(IntakeError::Validation(format!(
                        "quiz {quiz_id} does not exist"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}

fn block_match(candidate: &NewLead) -> BlockMatch {
    BlockMatch {
        phone: candidate.phone.clone(),
        email: candidate.email.clone(),
        fingerprint: candidate.fingerprint.clone(),
        ip_address: candidate.ip_address.clone(),
        quiz_id: candidate.quiz_id,
        user_id: candidate.user_id,
    }
}
