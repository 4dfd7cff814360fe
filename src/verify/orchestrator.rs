//! Verification orchestrator.
//!
//! Combines the rotating-code check, geolocation scoring, and spoofing
//! heuristics into one weighted verdict, then persists it exactly once.
//! The pipeline is strictly sequential within a request; the only shared
//! state is the replay guard and the per-`(venue, user)` check-in record,
//! both of which the stores make safe under concurrency.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::crypto::{
    generate_code, is_well_formed_code, seconds_remaining_in_window, verify_code, CODE_DIGITS,
};
use crate::domain::{
    CheckinOutcome, CheckinRecord, Coordinates, UserId, Venue, VenueId, VerificationPassed,
    VerificationScore,
};
use crate::infra::{
    publish_best_effort, CheckinStore, EventSink, PresenceError, Result, SecretStore,
    VenueDirectory,
};
use crate::verify::geo::{score_location, validate_coordinates, FieldError};
use crate::verify::policy::{CODE_SCORE_MAX, PASS_THRESHOLD};
use crate::verify::replay::{ReplayGuard, ReplayKey};
use crate::verify::risk::{assess, TimedFix};

/// A raw check-in submission, as received from the API layer. `user_id`
/// comes from the authenticated session, never from the request body.
#[derive(Debug, Clone)]
pub struct CheckinAttempt {
    pub venue_id: VenueId,
    pub user_id: UserId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub scanned_code: Option<String>,
}

/// A successful orchestration outcome: the persisted record plus the venue
/// it was scored against. "Successful" means the pipeline ran to completion;
/// the record itself may still carry `passed = false`.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub venue: Venue,
    pub record: CheckinRecord,
}

/// Current rotating code for a venue, for operator display hardware.
#[derive(Debug, Clone)]
pub struct CodePreview {
    pub code: String,
    pub seconds_remaining: u64,
}

/// The verification pipeline with its injected collaborators.
pub struct VerificationEngine {
    secrets: Arc<dyn SecretStore>,
    venues: Arc<dyn VenueDirectory>,
    checkins: Arc<dyn CheckinStore>,
    replay: Arc<dyn ReplayGuard>,
    events: Arc<dyn EventSink>,
}

impl VerificationEngine {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        venues: Arc<dyn VenueDirectory>,
        checkins: Arc<dyn CheckinStore>,
        replay: Arc<dyn ReplayGuard>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            secrets,
            venues,
            checkins,
            replay,
            events,
        }
    }

    /// Run the full verification pipeline for one check-in attempt.
    ///
    /// Short-circuits with [`PresenceError::AlreadyVerified`] when a passed
    /// record already exists, without re-running scoring or mutating state,
    /// and with [`PresenceError::CodeAlreadyUsed`] when the submitted code
    /// is cryptographically valid but was already consumed by this
    /// `(venue, user)` pair.
    #[instrument(skip(self, attempt), fields(venue_id = %attempt.venue_id, user_id = %attempt.user_id))]
    pub async fn verify(&self, attempt: CheckinAttempt) -> Result<Verdict> {
        let venue = self.load_open_venue(&attempt.venue_id).await?;

        // Idempotency short-circuit: a passed record is final.
        let existing = self
            .checkins
            .get(&attempt.venue_id, &attempt.user_id)
            .await?;
        if let Some(record) = &existing {
            if record.score.passed {
                return Err(PresenceError::AlreadyVerified {
                    venue_id: attempt.venue_id,
                    user_id: attempt.user_id,
                });
            }
        }

        let user_coords = validate_attempt(&attempt)?;
        let now_unix = unix_now();

        // Code path: up to 40 points, only when both the cryptographic
        // check and the freshness check pass.
        let mut code_score: u8 = 0;
        let mut code_matched = false;
        if let Some(candidate) = &attempt.scanned_code {
            if let Some(secret) = self.secrets.get_venue_secret(&attempt.venue_id).await? {
                let verification = verify_code(candidate, &secret, now_unix);
                if verification.valid {
                    code_matched = true;
                    let key =
                        ReplayKey::new(candidate.clone(), attempt.venue_id, attempt.user_id);
                    if !self.replay.check_and_mark(key).await? {
                        return Err(PresenceError::CodeAlreadyUsed {
                            venue_id: attempt.venue_id,
                        });
                    }
                    code_score = CODE_SCORE_MAX;
                    debug!(
                        window_offset = ?verification.window_offset,
                        "rotating code accepted"
                    );
                }
            } else {
                debug!("venue has no rotating-code secret; code contributes nothing");
            }
        }

        // Location path: up to 40 points when both sides have coordinates.
        let mut location_score: u8 = 0;
        let mut distance_meters = None;
        if let (Some(user), Some(venue_coords)) = (&user_coords, &venue.coordinates) {
            let scored = score_location(user, venue_coords, venue.max_distance_meters);
            location_score = scored.score;
            distance_meters = Some(scored.distance_meters);
        }

        // Receipt parsing is not implemented; the contribution is fixed at 0.
        let score = VerificationScore::new(code_score, location_score, 0, PASS_THRESHOLD);

        let risk = {
            let previous = existing.as_ref().and_then(|record| {
                record.coordinates.map(|coordinates| TimedFix {
                    coordinates,
                    observed_at: record.verified_at,
                })
            });
            let current = user_coords.map(|coordinates| TimedFix {
                coordinates,
                observed_at: Utc::now(),
            });
            assess(previous.as_ref(), current.as_ref(), attempt.accuracy_meters)
        };

        let outcome = CheckinOutcome {
            venue_id: attempt.venue_id,
            user_id: attempt.user_id,
            score,
            distance_meters,
            accuracy_meters: attempt.accuracy_meters,
            // Rounded before the store ever sees them.
            coordinates: user_coords.map(|c| c.rounded()),
            code_matched,
            risk,
        };

        let record = self.checkins.upsert(outcome).await?;

        if record.score.passed {
            info!(
                total = record.score.total,
                attempts = record.attempts,
                "verification passed"
            );
            publish_best_effort(
                self.events.as_ref(),
                VerificationPassed {
                    venue_id: record.venue_id,
                    user_id: record.user_id,
                    total_score: record.score.total,
                    verified_at: record.verified_at,
                },
            )
            .await;
        }

        Ok(Verdict { venue, record })
    }

    /// Fetch a venue, failing with [`PresenceError::VenueNotFound`].
    pub async fn venue(&self, venue_id: &VenueId) -> Result<Venue> {
        self.venues
            .get_venue(venue_id)
            .await?
            .ok_or(PresenceError::VenueNotFound(*venue_id))
    }

    /// The caller's existing check-in record for a venue, if any.
    pub async fn checkin_status(
        &self,
        venue_id: &VenueId,
        user_id: &UserId,
    ) -> Result<Option<CheckinRecord>> {
        // Surface venue-not-found rather than an empty record for a venue
        // that never existed.
        self.venue(venue_id).await?;
        self.checkins.get(venue_id, user_id).await
    }

    /// Current rotating code for a venue's display hardware.
    pub async fn current_code(&self, venue_id: &VenueId) -> Result<CodePreview> {
        self.venue(venue_id).await?;
        let secret = self
            .secrets
            .get_venue_secret(venue_id)
            .await?
            .ok_or(PresenceError::SecretNotConfigured(*venue_id))?;

        let now_unix = unix_now();
        Ok(CodePreview {
            code: generate_code(&secret, now_unix),
            seconds_remaining: seconds_remaining_in_window(now_unix),
        })
    }

    async fn load_open_venue(&self, venue_id: &VenueId) -> Result<Venue> {
        let venue = self.venue(venue_id).await?;
        if !venue.status.accepts_checkin() {
            return Err(PresenceError::VenueNotOpen {
                venue_id: *venue_id,
                status: venue.status.to_string(),
            });
        }
        Ok(venue)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Validate the attempt's raw inputs, returning the parsed coordinates.
///
/// Coordinates are all-or-nothing: supplying only one of latitude and
/// longitude is a validation error, not a partial location.
fn validate_attempt(attempt: &CheckinAttempt) -> Result<Option<Coordinates>> {
    let mut errors = Vec::new();

    let coords = match (attempt.latitude, attempt.longitude) {
        (Some(latitude), Some(longitude)) => {
            errors.extend(validate_coordinates(
                latitude,
                longitude,
                attempt.accuracy_meters,
            ));
            Some(Coordinates {
                latitude,
                longitude,
                accuracy_meters: attempt.accuracy_meters,
            })
        }
        (Some(_), None) => {
            errors.push(FieldError::new(
                "user_longitude",
                "longitude is required when latitude is supplied",
            ));
            None
        }
        (None, Some(_)) => {
            errors.push(FieldError::new(
                "user_latitude",
                "latitude is required when longitude is supplied",
            ));
            None
        }
        (None, None) => None,
    };

    if let Some(code) = &attempt.scanned_code {
        if !is_well_formed_code(code) {
            errors.push(FieldError::new(
                "scanned_code",
                format!("code must be exactly {CODE_DIGITS} digits"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(coords)
    } else {
        Err(PresenceError::Validation(errors))
    }
}
