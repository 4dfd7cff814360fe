//! Check-in records, scores, and location reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UserId, VenueId};

/// Number of decimal places coordinates are rounded to before persistence.
///
/// Four decimal places is roughly 11 meters at the equator, enough for
/// fraud review without storing a precise home/venue trail.
pub const STORED_COORDINATE_DECIMALS: u32 = 4;

/// A device-reported location fix. Ephemeral, supplied per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Reported horizontal accuracy in meters, [0, 10000]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
        }
    }

    pub fn with_accuracy(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: Some(accuracy_meters),
        }
    }

    /// Round to the persistence precision (~11 m). Applied before any store
    /// write so no implementation can leak raw device coordinates.
    pub fn rounded(&self) -> Self {
        let factor = 10f64.powi(STORED_COORDINATE_DECIMALS as i32);
        Self {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
            accuracy_meters: self.accuracy_meters,
        }
    }
}

/// Weighted verification score breakdown. Derived, never independently mutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationScore {
    /// Rotating-code contribution, 0..=40
    pub code: u8,
    /// Geolocation contribution, 0..=40
    pub location: u8,
    /// Receipt contribution, 0..=20 (fixed at 0 until receipt parsing lands)
    pub receipt: u8,
    /// Sum of the three sub-scores, 0..=100
    pub total: u8,
    /// Whether `total` met the pass threshold
    pub passed: bool,
}

impl VerificationScore {
    pub fn new(code: u8, location: u8, receipt: u8, threshold: u8) -> Self {
        let total = code + location + receipt;
        Self {
            code,
            location,
            receipt,
            total,
            passed: total >= threshold,
        }
    }
}

/// Advisory fraud-risk assessment. Never gates pass/fail by itself; attached
/// to the outcome for downstream policy and review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RiskAssessment {
    /// Implied travel speed between consecutive fixes exceeded the ceiling
    pub suspicious_speed: bool,
    /// Reported accuracy is implausible (real GPS never reports exactly 0 m)
    pub inconsistent_accuracy: bool,
    /// Accumulated risk contribution, capped at 100
    pub risk_score: u8,
}

impl RiskAssessment {
    pub fn is_flagged(&self) -> bool {
        self.suspicious_speed || self.inconsistent_accuracy
    }
}

/// Per-(venue, user) verification outcome.
///
/// Created on the first attempt and updated in place on retries until
/// `passed = true`, after which it is immutable. That immutability is the
/// single most important invariant of the subsystem: rewards must never be
/// granted twice for one presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub venue_id: VenueId,
    pub user_id: UserId,
    pub score: VerificationScore,
    /// Distance from the venue at verification time, if location was supplied
    pub distance_meters: Option<f64>,
    /// Reported accuracy at verification time
    pub accuracy_meters: Option<f64>,
    /// Coordinates rounded to [`STORED_COORDINATE_DECIMALS`] places
    pub coordinates: Option<Coordinates>,
    /// Whether the rotating code matched cryptographically
    pub code_matched: bool,
    pub risk: RiskAssessment,
    /// Number of verification attempts recorded against this key
    pub attempts: u32,
    pub verified_at: DateTime<Utc>,
}

/// The score bundle handed to the check-in store for an atomic upsert.
#[derive(Debug, Clone)]
pub struct CheckinOutcome {
    pub venue_id: VenueId,
    pub user_id: UserId,
    pub score: VerificationScore,
    pub distance_meters: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub code_matched: bool,
    pub risk: RiskAssessment,
}

/// Domain event emitted when a verification passes.
///
/// Fire-and-forget: downstream reward processing subscribes; a publish
/// failure must never fail the check-in response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationPassed {
    pub venue_id: VenueId,
    pub user_id: UserId,
    pub total_score: u8,
    pub verified_at: DateTime<Utc>,
}

impl VerificationPassed {
    pub const EVENT_TYPE: &'static str = "verification.passed";
}
