//! Database models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// Lead status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
pub enum LeadStatus {
    /// Freshly captured, nobody has acted on it yet.
    New = 0,
    /// Picked up by a manager.
    AtWork = 1,
    /// Converted.
    Success = 2,
    /// Rejected by a manager.
    Declined = 3,
}

/// A captured form/quiz submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Identifier assigned by the upstream system, if any.
    pub external_id: Option<String>,
    /// Upstream system name. Never empty; defaulted at creation.
    pub external_system: String,
    /// Upstream entity kind. Never empty; defaulted at creation.
    pub external_entity: String,
    /// Upstream entity identifier. Never empty; defaulted at creation.
    pub external_entity_id: String,
    /// Owning user, if known.
    pub user_id: Option<i64>,
    /// Source quiz, if known.
    pub quiz_id: Option<i64>,
    /// Contact name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Messenger handles keyed by messenger name.
    pub messengers: Json<Value>,
    /// Free-form answer payload as submitted.
    pub answers: Json<Value>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// City resolved from the IP address.
    pub city: Option<String>,
    /// Country resolved from the IP address.
    pub country: Option<String>,
    /// UTM attribution.
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    /// Processing status.
    pub status: LeadStatus,
    /// Marked as a test submission by the client.
    pub is_test: bool,
    /// Seen by a manager.
    pub viewed: bool,
    /// Submission already represents a paid conversion.
    pub paid: bool,
    /// Matched a blacklist entry at intake.
    pub blocked: bool,
    /// Opaque client fingerprint used for dedup and rate limiting.
    pub fingerprint: Option<String>,
    /// ID of the most recent earlier lead with the same fingerprint.
    pub equal_answer_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Soft-delete timestamp.
    pub deleted_at: Option<String>,
}

/// A lead candidate about to be persisted.
///
/// The intake pipeline mutates this in place (fingerprint default,
/// `equal_answer_id`, `paid`, `blocked`, city/country) before the single
/// insert that creates the row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    pub external_id: Option<String>,
    pub external_system: Option<String>,
    pub external_entity: Option<String>,
    pub external_entity_id: Option<String>,
    pub user_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub messengers: Value,
    #[serde(default)]
    pub answers: Value,
    pub ip_address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(skip)]
    pub blocked: bool,
    pub fingerprint: Option<String>,
    #[serde(skip)]
    pub equal_answer_id: Option<i64>,
}

/// A standing block-list rule matched against lead attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BlocklistEntry {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Entry kind: "blacklist" or "whitelist".
    pub entry_type: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fingerprint: Option<String>,
    pub ip_address: Option<String>,
    pub quiz_id: Option<i64>,
    pub user_id: Option<i64>,
    /// Free-text reason supplied by whoever created the entry.
    pub reason: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields a blacklist entry can be matched against.
///
/// A field set to `None` is left out of the match entirely.
#[derive(Debug, Clone, Default)]
pub struct BlockMatch {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fingerprint: Option<String>,
    pub ip_address: Option<String>,
    pub quiz_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl BlockMatch {
    /// True when no matchable field is present.
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.email.is_none()
            && self.fingerprint.is_none()
            && self.ip_address.is_none()
            && self.quiz_id.is_none()
            && self.user_id.is_none()
    }
}

/// Outcome of a phone verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
    Expired,
}

/// One phone verification attempt/result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PhoneVerification {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Phone number the attempt was made for.
    pub phone: String,
    /// Attempt status. Usable for gating only while `verified` and unexpired.
    pub status: VerificationStatus,
    /// When the provider confirmed the number.
    pub verified_at: Option<String>,
    /// Verification validity horizon. NULL means it never expires.
    pub expires_at: Option<String>,
    /// Raw provider response.
    pub provider_response: Option<Json<Value>>,
    /// Lead the verification was eventually attached to.
    pub lead_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
}

/// A user owning quizzes and leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A quiz leads are submitted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user, if any.
    pub user_id: Option<i64>,
    /// Quiz title.
    pub title: String,
    /// Blocked quizzes reject all new leads.
    pub blocked: bool,
    /// Creation timestamp.
    pub created_at: String,
}
