//! Request and response types for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RiskAssessment, Venue, VenueId, VenueStatus};
use crate::verify::policy::PASS_THRESHOLD;
use crate::verify::Verdict;

/// Check-in submission body. The user identity comes from the session, the
/// venue from the path; everything here is optional evidence.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CheckinRequest {
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
    pub user_accuracy_meters: Option<f64>,
    pub scanned_code: Option<String>,
}

/// Weighted score breakdown returned with every completed verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub code: u8,
    pub location: u8,
    pub receipt: u8,
    pub total: u8,
    pub threshold: u8,
}

/// Public venue summary embedded in check-in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSummary {
    pub id: VenueId,
    pub name: String,
}

/// Completed verification response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub passed: bool,
    pub scores: ScoreBreakdown,
    pub venue: VenueSummary,
    /// Advisory fraud signals; never the reason a check-in fails
    pub risk: RiskAssessment,
    pub attempts: u32,
    pub verified_at: DateTime<Utc>,
}

impl From<Verdict> for CheckinResponse {
    fn from(verdict: Verdict) -> Self {
        let record = verdict.record;
        Self {
            passed: record.score.passed,
            scores: ScoreBreakdown {
                code: record.score.code,
                location: record.score.location,
                receipt: record.score.receipt,
                total: record.score.total,
                threshold: PASS_THRESHOLD,
            },
            venue: VenueSummary {
                id: verdict.venue.venue_id,
                name: verdict.venue.display_name,
            },
            risk: record.risk,
            attempts: record.attempts,
            verified_at: record.verified_at,
        }
    }
}

/// Public venue lookup response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueResponse {
    pub id: VenueId,
    pub name: String,
    pub status: VenueStatus,
    pub open_for_checkin: bool,
    pub max_distance_meters: f64,
}

impl From<Venue> for VenueResponse {
    fn from(venue: Venue) -> Self {
        Self {
            id: venue.venue_id,
            name: venue.display_name,
            open_for_checkin: venue.status.accepts_checkin(),
            status: venue.status,
            max_distance_meters: venue.max_distance_meters,
        }
    }
}

/// Current rotating code, for venue display hardware (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodePreviewResponse {
    pub venue_id: VenueId,
    pub code: String,
    pub seconds_remaining: u64,
}

/// Existing check-in record for the calling user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinStatusResponse {
    pub venue_id: VenueId,
    pub passed: bool,
    pub scores: ScoreBreakdown,
    pub risk: RiskAssessment,
    pub attempts: u32,
    pub verified_at: DateTime<Utc>,
}
