//! Check-in endpoints.

use axum::extract::{Extension, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{CheckinRequest, CheckinResponse, CheckinStatusResponse, ScoreBreakdown};
use crate::auth::SessionContextExt;
use crate::domain::VenueId;
use crate::infra::PresenceError;
use crate::metrics::metric_names;
use crate::server::AppState;
use crate::verify::policy::PASS_THRESHOLD;
use crate::verify::CheckinAttempt;

/// `POST /api/v1/venues/:venue_id/checkin`
///
/// Runs the full verification pipeline. Returns the score breakdown for
/// both passed and not-yet-passed outcomes; replays and repeat attempts
/// after a pass surface as conflict errors.
pub async fn post_checkin(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    Extension(SessionContextExt(session)): Extension<SessionContextExt>,
    Json(body): Json<CheckinRequest>,
) -> Result<Json<CheckinResponse>, ApiError> {
    let attempt = CheckinAttempt {
        venue_id: VenueId::from_uuid(venue_id),
        user_id: session.user_id,
        latitude: body.user_latitude,
        longitude: body.user_longitude,
        accuracy_meters: body.user_accuracy_meters,
        scanned_code: body.scanned_code,
    };

    state
        .metrics
        .inc_counter(metric_names::CHECKINS_ATTEMPTED)
        .await;

    match state.engine.verify(attempt).await {
        Ok(verdict) => {
            let counter = if verdict.record.score.passed {
                metric_names::CHECKINS_PASSED
            } else {
                metric_names::CHECKINS_FAILED_SCORE
            };
            state.metrics.inc_counter(counter).await;

            if verdict.record.risk.is_flagged() {
                state.metrics.inc_counter(metric_names::RISK_FLAGGED).await;
            }

            Ok(Json(verdict.into()))
        }
        Err(err) => {
            let counter = match &err {
                PresenceError::CodeAlreadyUsed { .. } => Some(metric_names::CODES_REPLAYED),
                PresenceError::AlreadyVerified { .. } => {
                    Some(metric_names::CHECKINS_ALREADY_VERIFIED)
                }
                PresenceError::Validation(_) => Some(metric_names::VALIDATION_ERRORS),
                PresenceError::Database(_) => Some(metric_names::DATABASE_ERRORS),
                _ => None,
            };
            if let Some(counter) = counter {
                state.metrics.inc_counter(counter).await;
            }
            Err(err.into())
        }
    }
}

/// `GET /api/v1/venues/:venue_id/checkin`
///
/// The calling user's existing record for this venue.
pub async fn get_checkin_status(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    Extension(SessionContextExt(session)): Extension<SessionContextExt>,
) -> Result<Json<CheckinStatusResponse>, ApiError> {
    let venue_id = VenueId::from_uuid(venue_id);
    let record = state
        .engine
        .checkin_status(&venue_id, &session.user_id)
        .await?
        .ok_or(PresenceError::CheckinNotFound {
            venue_id,
            user_id: session.user_id,
        })?;

    Ok(Json(CheckinStatusResponse {
        venue_id: record.venue_id,
        passed: record.score.passed,
        scores: ScoreBreakdown {
            code: record.score.code,
            location: record.score.location,
            receipt: record.score.receipt,
            total: record.score.total,
            threshold: PASS_THRESHOLD,
        },
        risk: record.risk,
        attempts: record.attempts,
        verified_at: record.verified_at,
    }))
}
