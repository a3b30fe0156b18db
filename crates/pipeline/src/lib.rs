//! Lead intake guard pipeline.
//!
//! An ordered sequence of checks and enrichments executed synchronously
//! before a lead row is written:
//!
//! 1. Fingerprint defaulting from the client header
//! 2. User/quiz reference validation (terminating)
//! 3. Phone verification gate (terminating)
//! 4. Global user rate limit (terminating)
//! 5. Client leads rate limit (terminating)
//! 6. Client quizzes rate limit (terminating)
//! 7. Test-lead rate limit (terminating)
//! 8. Duplicate detection (mutates `equal_answer_id`)
//! 9. Payment signal (mutates `paid`)
//! 10. Block list check (mutates `blocked`)
//! 11. Geo-enrichment (mutates `city`/`country`)
//!
//! The first terminating failure aborts the whole creation; no row is
//! written. The enrichment steps never terminate - their failures degrade
//! to neutral defaults so lead capture always wins over enrichment
//! completeness.

mod error;
mod limits;
mod payment;
mod pipeline;

pub use error::{IntakeError, RateLimitScope};
pub use limits::{RateLimitConfig, RateLimiters};
pub use payment::should_mark_paid;
pub use pipeline::IntakePipeline;
