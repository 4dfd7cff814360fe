//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use presence_engine::crypto::generate_code;
use presence_engine::domain::{Coordinates, UserId, Venue, VenueId, VenueSecret, VenueStatus};
use presence_engine::infra::{
    InMemoryCheckinStore, InMemorySecretStore, InMemoryVenueDirectory, RecordingEventSink,
};
use presence_engine::verify::{CheckinAttempt, InMemoryReplayGuard, VerificationEngine};

/// Seoul City Hall, used as the reference venue location.
pub const VENUE_LAT: f64 = 37.5665;
pub const VENUE_LNG: f64 = 126.978;

pub struct TestHarness {
    pub engine: VerificationEngine,
    pub venues: Arc<InMemoryVenueDirectory>,
    pub secrets: Arc<InMemorySecretStore>,
    pub checkins: Arc<InMemoryCheckinStore>,
    pub events: Arc<RecordingEventSink>,
    pub venue_id: VenueId,
    pub secret: VenueSecret,
}

impl TestHarness {
    /// An open venue at the reference location with a 100 m radius and a
    /// rotating-code secret.
    pub async fn new() -> Self {
        let venues = Arc::new(InMemoryVenueDirectory::new());
        let secrets = Arc::new(InMemorySecretStore::new());
        let checkins = Arc::new(InMemoryCheckinStore::new());
        let events = Arc::new(RecordingEventSink::new());

        let venue_id = VenueId::new();
        let secret = VenueSecret::generate();

        venues
            .insert(Venue {
                venue_id,
                display_name: "City Hall Cafe".into(),
                status: VenueStatus::Open,
                coordinates: Some(Coordinates::new(VENUE_LAT, VENUE_LNG)),
                max_distance_meters: 100.0,
            })
            .await;
        secrets.insert(venue_id, secret.clone()).await;

        let engine = VerificationEngine::new(
            secrets.clone(),
            venues.clone(),
            checkins.clone(),
            Arc::new(InMemoryReplayGuard::new()),
            events.clone(),
        );

        Self {
            engine,
            venues,
            secrets,
            checkins,
            events,
            venue_id,
            secret,
        }
    }

    /// A currently valid rotating code for the harness venue.
    pub fn fresh_code(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        generate_code(&self.secret, now)
    }

    /// An attempt with coordinates exactly at the venue.
    pub fn at_venue_attempt(&self, user_id: UserId, code: Option<String>) -> CheckinAttempt {
        CheckinAttempt {
            venue_id: self.venue_id,
            user_id,
            latitude: Some(VENUE_LAT),
            longitude: Some(VENUE_LNG),
            accuracy_meters: Some(12.0),
            scanned_code: code,
        }
    }
}
