//! Geolocation validation and distance-derived scoring.

use serde::{Deserialize, Serialize};

use crate::domain::Coordinates;
use crate::verify::policy::{LOCATION_SCORE_MAX, MAX_ACCURACY_METERS};

/// Mean Earth radius in meters, for haversine distance.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A field-level validation error, surfaced to clients as part of a
/// 400-equivalent response. Never treated as a security incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Range-check a raw location report. Returns an empty list when valid.
///
/// NaN and infinite values are rejected explicitly; they otherwise slip
/// through `<`/`>` comparisons and poison every downstream computation.
pub fn validate_coordinates(
    latitude: f64,
    longitude: f64,
    accuracy_meters: Option<f64>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !latitude.is_finite() {
        errors.push(FieldError::new(
            "user_latitude",
            "latitude must be a finite number",
        ));
    } else if !(-90.0..=90.0).contains(&latitude) {
        errors.push(FieldError::new(
            "user_latitude",
            "latitude must be between -90 and 90 degrees",
        ));
    }

    if !longitude.is_finite() {
        errors.push(FieldError::new(
            "user_longitude",
            "longitude must be a finite number",
        ));
    } else if !(-180.0..=180.0).contains(&longitude) {
        errors.push(FieldError::new(
            "user_longitude",
            "longitude must be between -180 and 180 degrees",
        ));
    }

    if let Some(accuracy) = accuracy_meters {
        if !accuracy.is_finite() {
            errors.push(FieldError::new(
                "user_accuracy_meters",
                "accuracy must be a finite number",
            ));
        } else if !(0.0..=MAX_ACCURACY_METERS).contains(&accuracy) {
            errors.push(FieldError::new(
                "user_accuracy_meters",
                format!("accuracy must be between 0 and {MAX_ACCURACY_METERS} meters"),
            ));
        }
    }

    errors
}

/// Great-circle distance between two fixes, in meters.
pub fn haversine_distance_meters(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Distance-derived location score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationScore {
    /// 0..=40, linear decay from the venue outward
    pub score: u8,
    /// Computed distance from the venue, meters
    pub distance_meters: f64,
    /// Accuracy as reported by the device, passed through for the record
    pub accuracy_meters: Option<f64>,
}

/// Score a user fix against venue coordinates.
///
/// Full marks at the venue itself, decaying linearly to zero at
/// `max_distance_meters` and beyond. Deterministic and monotonically
/// non-increasing in distance.
pub fn score_location(
    user: &Coordinates,
    venue: &Coordinates,
    max_distance_meters: f64,
) -> LocationScore {
    let distance = haversine_distance_meters(user, venue);

    let score = if max_distance_meters <= 0.0 || distance >= max_distance_meters {
        0
    } else {
        let fraction = 1.0 - distance / max_distance_meters;
        (f64::from(LOCATION_SCORE_MAX) * fraction).floor() as u8
    };

    LocationScore {
        score,
        distance_meters: distance,
        accuracy_meters: user.accuracy_meters,
    }
}
