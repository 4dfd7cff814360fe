//! Trait definitions for the presence engine's external collaborators.
//!
//! Venue records, secrets, and check-in state live in stores the engine
//! consumes through these interfaces. In-memory implementations back tests
//! and single-instance deployments; PostgreSQL implementations back
//! production. The orchestrator never sees which one it has.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{
    CheckinOutcome, CheckinRecord, UserId, Venue, VenueId, VenueSecret, VerificationPassed,
};

use super::Result;

/// Per-venue rotating-code secret lookup.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the rotating-code secret for a venue. `None` means the venue
    /// has no code program; an `Err` means the store is unavailable.
    async fn get_venue_secret(&self, venue_id: &VenueId) -> Result<Option<VenueSecret>>;
}

/// Venue directory lookup.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VenueDirectory: Send + Sync {
    /// Fetch a venue record. `None` means the venue does not exist.
    async fn get_venue(&self, venue_id: &VenueId) -> Result<Option<Venue>>;
}

/// Check-in record persistence.
///
/// `upsert` must be a single atomic conditional write keyed by
/// `(venue_id, user_id)`; application-level read-modify-write would let two
/// concurrent attempts from the same user both observe "no passed record"
/// and both win.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CheckinStore: Send + Sync {
    /// Create or update the record for `(outcome.venue_id, outcome.user_id)`.
    ///
    /// Guarantees at most one record per key. Once a record has
    /// `passed = true` it is immutable: further upserts return
    /// [`PresenceError::AlreadyVerified`](crate::infra::PresenceError::AlreadyVerified)
    /// rather than silently overwriting.
    async fn upsert(&self, outcome: CheckinOutcome) -> Result<CheckinRecord>;

    /// Fetch the record for a key, if any.
    async fn get(&self, venue_id: &VenueId, user_id: &UserId) -> Result<Option<CheckinRecord>>;
}

/// Downstream sink for `verification.passed` events.
///
/// Fire-and-forget: the orchestrator logs and swallows publish failures.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: VerificationPassed) -> Result<()>;
}
