//! Error types for the presence engine.

use thiserror::Error;

use crate::domain::{UserId, VenueId};
use crate::verify::FieldError;

/// Errors that can occur during presence verification.
#[derive(Error, Debug)]
pub enum PresenceError {
    /// Database error (retryable infrastructure failure)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Venue not found
    #[error("venue not found: {0}")]
    VenueNotFound(VenueId),

    /// Venue exists but is not accepting check-ins
    #[error("venue {venue_id} is not open for check-in (status: {status})")]
    VenueNotOpen { venue_id: VenueId, status: String },

    /// A passed record already exists for this (venue, user)
    #[error("user {user_id} already verified at venue {venue_id}")]
    AlreadyVerified { venue_id: VenueId, user_id: UserId },

    /// The rotating code matched but was already consumed in this window.
    /// Distinct from a failed verification: the code is stale, not wrong.
    #[error("rotating code already used at venue {venue_id}")]
    CodeAlreadyUsed { venue_id: VenueId },

    /// Input validation failed; carries field-level detail
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    /// No check-in record exists for this (venue, user)
    #[error("no check-in record for user {user_id} at venue {venue_id}")]
    CheckinNotFound { venue_id: VenueId, user_id: UserId },

    /// The venue has no rotating-code secret configured
    #[error("no rotating-code secret for venue {0}")]
    SecretNotConfigured(VenueId),

    /// Event publish failure. Callers treat this as non-fatal.
    #[error("event publish failed: {0}")]
    EventPublish(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl PresenceError {
    /// Whether the caller may retry and expect a definitive verdict.
    /// Only infrastructure failures qualify; verification outcomes and
    /// conflicts are final for their inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PresenceError::Database(_))
    }
}

/// Result type for presence-engine operations.
pub type Result<T> = std::result::Result<T, PresenceError>;
