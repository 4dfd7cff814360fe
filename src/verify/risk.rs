//! Spoofing heuristics.
//!
//! Advisory intelligence for fraud review: flags GPS reports implying
//! impossible travel or suspiciously perfect hardware. Deliberately not a
//! verification gate; downstream policy decides what to do with the score,
//! and silently failing check-ins on heuristics alone would change
//! user-visible behavior without an explicit policy call.

use chrono::{DateTime, Utc};

use crate::domain::{Coordinates, RiskAssessment};
use crate::verify::geo::haversine_distance_meters;
use crate::verify::policy::{
    MAX_PLAUSIBLE_SPEED_KMH, RISK_INCONSISTENT_ACCURACY, RISK_SCORE_CAP, RISK_SUSPICIOUS_SPEED,
};

/// A location fix with the time it was observed, for speed computation.
#[derive(Debug, Clone, Copy)]
pub struct TimedFix {
    pub coordinates: Coordinates,
    pub observed_at: DateTime<Utc>,
}

/// Assess a location report against an optional previous fix.
///
/// - `suspicious_speed`: implied speed between the two fixes exceeds
///   [`MAX_PLAUSIBLE_SPEED_KMH`].
/// - `inconsistent_accuracy`: reported accuracy is exactly 0 m, which real
///   GPS hardware effectively never produces.
pub fn assess(
    previous: Option<&TimedFix>,
    current: Option<&TimedFix>,
    accuracy_meters: Option<f64>,
) -> RiskAssessment {
    let mut assessment = RiskAssessment::default();
    let mut risk: u16 = 0;

    if let (Some(prev), Some(cur)) = (previous, current) {
        if let Some(speed) = implied_speed_kmh(prev, cur) {
            if speed > MAX_PLAUSIBLE_SPEED_KMH {
                assessment.suspicious_speed = true;
                risk += u16::from(RISK_SUSPICIOUS_SPEED);
            }
        }
    }

    if let Some(accuracy) = accuracy_meters {
        if accuracy == 0.0 {
            assessment.inconsistent_accuracy = true;
            risk += u16::from(RISK_INCONSISTENT_ACCURACY);
        }
    }

    assessment.risk_score = risk.min(u16::from(RISK_SCORE_CAP)) as u8;
    assessment
}

/// Implied travel speed between two fixes in km/h, or `None` when the
/// elapsed time is zero or negative (reordered fixes carry no signal).
fn implied_speed_kmh(prev: &TimedFix, cur: &TimedFix) -> Option<f64> {
    let elapsed = (cur.observed_at - prev.observed_at).num_milliseconds();
    if elapsed <= 0 {
        return None;
    }
    let elapsed_hours = elapsed as f64 / 3_600_000.0;
    let distance_km = haversine_distance_meters(&prev.coordinates, &cur.coordinates) / 1_000.0;
    Some(distance_km / elapsed_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fix(lat: f64, lng: f64, at: DateTime<Utc>) -> TimedFix {
        TimedFix {
            coordinates: Coordinates::new(lat, lng),
            observed_at: at,
        }
    }

    #[test]
    fn test_no_signals_no_risk() {
        let assessment = assess(None, None, Some(15.0));
        assert_eq!(assessment, RiskAssessment::default());
    }

    #[test]
    fn test_plausible_travel_is_clean() {
        let now = Utc::now();
        // ~111 m in one minute: walking pace.
        let prev = fix(37.5665, 126.978, now - Duration::minutes(1));
        let cur = fix(37.5675, 126.978, now);
        let assessment = assess(Some(&prev), Some(&cur), Some(10.0));
        assert!(!assessment.suspicious_speed);
        assert_eq!(assessment.risk_score, 0);
    }

    #[test]
    fn test_impossible_travel_flagged() {
        let now = Utc::now();
        // Seoul to Busan (~325 km) in ten minutes: ~1950 km/h.
        let prev = fix(37.5665, 126.978, now - Duration::minutes(10));
        let cur = fix(35.1796, 129.0756, now);
        let assessment = assess(Some(&prev), Some(&cur), Some(10.0));
        assert!(assessment.suspicious_speed);
        assert_eq!(assessment.risk_score, RISK_SUSPICIOUS_SPEED);
    }

    #[test]
    fn test_perfect_accuracy_flagged() {
        let assessment = assess(None, None, Some(0.0));
        assert!(assessment.inconsistent_accuracy);
        assert_eq!(assessment.risk_score, RISK_INCONSISTENT_ACCURACY);
    }

    #[test]
    fn test_combined_flags_capped() {
        let now = Utc::now();
        let prev = fix(37.5665, 126.978, now - Duration::minutes(10));
        let cur = fix(35.1796, 129.0756, now);
        let assessment = assess(Some(&prev), Some(&cur), Some(0.0));
        assert!(assessment.suspicious_speed);
        assert!(assessment.inconsistent_accuracy);
        assert_eq!(assessment.risk_score, RISK_SCORE_CAP);
    }

    #[test]
    fn test_zero_elapsed_time_ignored() {
        let now = Utc::now();
        let prev = fix(37.5665, 126.978, now);
        let cur = fix(35.1796, 129.0756, now);
        let assessment = assess(Some(&prev), Some(&cur), Some(10.0));
        assert!(!assessment.suspicious_speed);
    }

    #[test]
    fn test_reordered_fixes_ignored() {
        let now = Utc::now();
        let prev = fix(37.5665, 126.978, now + Duration::minutes(5));
        let cur = fix(35.1796, 129.0756, now);
        let assessment = assess(Some(&prev), Some(&cur), None);
        assert!(!assessment.suspicious_speed);
        assert_eq!(assessment.risk_score, 0);
    }
}
