//! Venue lookup and operator endpoints.

use axum::extract::{Extension, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::error::{admin_required, ApiError};
use crate::api::types::{CodePreviewResponse, VenueResponse};
use crate::auth::SessionContextExt;
use crate::domain::VenueId;
use crate::server::AppState;

/// `GET /api/v1/venues/:venue_id`
///
/// Public venue info so clients can pre-flight a check-in.
pub async fn get_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
) -> Result<Json<VenueResponse>, ApiError> {
    let venue = state.engine.venue(&VenueId::from_uuid(venue_id)).await?;
    Ok(Json(venue.into()))
}

/// `GET /api/v1/venues/:venue_id/code`
///
/// Current rotating code for the venue's on-site display. Admin only: the
/// code is exactly what a check-in accepts, so leaking it to regular
/// sessions would defeat the presence requirement.
pub async fn get_code_preview(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    Extension(SessionContextExt(session)): Extension<SessionContextExt>,
) -> Result<Json<CodePreviewResponse>, ApiError> {
    if !session.is_admin() {
        return Err(admin_required());
    }

    let venue_id = VenueId::from_uuid(venue_id);
    let preview = state.engine.current_code(&venue_id).await?;

    Ok(Json(CodePreviewResponse {
        venue_id,
        code: preview.code,
        seconds_remaining: preview.seconds_remaining,
    }))
}

/// `GET /api/v1/metrics` (admin)
pub async fn get_metrics(
    State(state): State<AppState>,
    Extension(SessionContextExt(session)): Extension<SessionContextExt>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !session.is_admin() {
        return Err(admin_required());
    }
    Ok(Json(state.metrics.to_json().await))
}
