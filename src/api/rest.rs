//! REST API endpoints for the presence engine.

use axum::routing::{get, post};
use axum::Router;

use crate::server::AppState;

use super::handlers;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/venues/:venue_id", get(handlers::get_venue))
        .route("/v1/venues/:venue_id/checkin", post(handlers::post_checkin))
        .route(
            "/v1/venues/:venue_id/checkin",
            get(handlers::get_checkin_status),
        )
        .route("/v1/venues/:venue_id/code", get(handlers::get_code_preview))
        .route("/v1/metrics", get(handlers::get_metrics))
}
