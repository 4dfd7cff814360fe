//! In-memory store implementations.
//!
//! Suitable for tests and single-instance deployments. Each store holds its
//! state behind a single `tokio::sync::RwLock`, so the check-in upsert's
//! check and write happen under one write lock: the same atomicity the
//! PostgreSQL implementation gets from a conditional `ON CONFLICT` update.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    CheckinOutcome, CheckinRecord, UserId, Venue, VenueId, VenueSecret, VerificationPassed,
};
use crate::infra::{CheckinStore, EventSink, PresenceError, Result, SecretStore, VenueDirectory};

// ============================================================================
// Secret store
// ============================================================================

/// In-memory venue secret store.
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<VenueId, VenueSecret>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, venue_id: VenueId, secret: VenueSecret) {
        self.secrets.write().await.insert(venue_id, secret);
    }
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_venue_secret(&self, venue_id: &VenueId) -> Result<Option<VenueSecret>> {
        Ok(self.secrets.read().await.get(venue_id).cloned())
    }
}

// ============================================================================
// Venue directory
// ============================================================================

/// In-memory venue directory.
pub struct InMemoryVenueDirectory {
    venues: RwLock<HashMap<VenueId, Venue>>,
}

impl InMemoryVenueDirectory {
    pub fn new() -> Self {
        Self {
            venues: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, venue: Venue) {
        self.venues.write().await.insert(venue.venue_id, venue);
    }
}

impl Default for InMemoryVenueDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueDirectory for InMemoryVenueDirectory {
    async fn get_venue(&self, venue_id: &VenueId) -> Result<Option<Venue>> {
        Ok(self.venues.read().await.get(venue_id).cloned())
    }
}

// ============================================================================
// Check-in store
// ============================================================================

/// In-memory check-in record store with compare-and-set upsert semantics.
pub struct InMemoryCheckinStore {
    records: RwLock<HashMap<(VenueId, UserId), CheckinRecord>>,
}

impl InMemoryCheckinStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryCheckinStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckinStore for InMemoryCheckinStore {
    async fn upsert(&self, outcome: CheckinOutcome) -> Result<CheckinRecord> {
        let key = (outcome.venue_id, outcome.user_id);

        // One write lock spans the passed-check and the write, making the
        // upsert atomic with respect to concurrent attempts on the same key.
        let mut records = self.records.write().await;

        let attempts = match records.get(&key) {
            Some(existing) if existing.score.passed => {
                return Err(PresenceError::AlreadyVerified {
                    venue_id: outcome.venue_id,
                    user_id: outcome.user_id,
                });
            }
            Some(existing) => existing.attempts + 1,
            None => 1,
        };

        let record = CheckinRecord {
            venue_id: outcome.venue_id,
            user_id: outcome.user_id,
            score: outcome.score,
            distance_meters: outcome.distance_meters,
            accuracy_meters: outcome.accuracy_meters,
            coordinates: outcome.coordinates,
            code_matched: outcome.code_matched,
            risk: outcome.risk,
            attempts,
            verified_at: Utc::now(),
        };

        records.insert(key, record.clone());
        Ok(record)
    }

    async fn get(&self, venue_id: &VenueId, user_id: &UserId) -> Result<Option<CheckinRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(*venue_id, *user_id)).cloned())
    }
}

// ============================================================================
// Event sink
// ============================================================================

/// Event sink that drops everything. For tests and deployments without a
/// downstream reward pipeline.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, _event: VerificationPassed) -> Result<()> {
        Ok(())
    }
}

/// Event sink that records published events, for assertions in tests.
pub struct RecordingEventSink {
    pub events: RwLock<Vec<VerificationPassed>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }
}

impl Default for RecordingEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: VerificationPassed) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
