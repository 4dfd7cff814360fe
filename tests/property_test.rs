//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for any valid input.

use proptest::prelude::*;

use presence_engine::crypto::{
    constant_time_eq, generate_code, time_window, verify_code, CODE_DIGITS, CODE_WINDOW_SECS,
};
use presence_engine::domain::{Coordinates, VenueSecret};
use presence_engine::verify::{score_location, validate_coordinates};

// ============================================================================
// Custom Strategies
// ============================================================================

/// Generate a random venue secret (non-empty, up to 64 bytes)
fn arb_secret() -> impl Strategy<Value = VenueSecret> {
    prop::collection::vec(any::<u8>(), 1..64).prop_map(VenueSecret::new)
}

/// Generate a timestamp away from u64 edges
fn arb_timestamp() -> impl Strategy<Value = u64> {
    1_000_000_000u64..4_000_000_000u64
}

/// Generate a valid latitude
fn arb_latitude() -> impl Strategy<Value = f64> {
    -90.0f64..=90.0f64
}

/// Generate a valid longitude
fn arb_longitude() -> impl Strategy<Value = f64> {
    -180.0f64..=180.0f64
}

// ============================================================================
// Rotating Code Properties
// ============================================================================

proptest! {
    /// Property: code generation is deterministic
    #[test]
    fn generate_is_deterministic(secret in arb_secret(), ts in arb_timestamp()) {
        prop_assert_eq!(generate_code(&secret, ts), generate_code(&secret, ts));
    }

    /// Property: every code is exactly six ASCII digits
    #[test]
    fn code_shape_is_stable(secret in arb_secret(), ts in arb_timestamp()) {
        let code = generate_code(&secret, ts);
        prop_assert_eq!(code.len(), CODE_DIGITS);
        prop_assert!(code.bytes().all(|b| b.is_ascii_digit()));
    }

    /// Property: any timestamp within one window yields the same code
    #[test]
    fn code_constant_within_window(secret in arb_secret(), ts in arb_timestamp(), offset in 0u64..CODE_WINDOW_SECS) {
        let aligned = ts - ts % CODE_WINDOW_SECS;
        prop_assert_eq!(
            generate_code(&secret, aligned),
            generate_code(&secret, aligned + offset)
        );
    }

    /// Property: a generated code verifies in its own window and the next
    #[test]
    fn code_verifies_within_tolerance(secret in arb_secret(), ts in arb_timestamp(), drift in 0u64..CODE_WINDOW_SECS) {
        let code = generate_code(&secret, ts);

        // Same window.
        prop_assert!(verify_code(&code, &secret, ts).valid);

        // One window later it is still accepted at offset -1.
        let next_window_ts = (time_window(ts) + 1) * CODE_WINDOW_SECS + drift;
        let result = verify_code(&code, &secret, next_window_ts);
        prop_assert!(result.valid);

        // Two windows later it is rejected.
        let expired_ts = (time_window(ts) + 2) * CODE_WINDOW_SECS + drift;
        prop_assert!(!verify_code(&code, &secret, expired_ts).valid);
    }

    /// Property: verification never accepts a code derived from a different secret
    #[test]
    fn secrets_do_not_cross_verify(
        a in prop::collection::vec(any::<u8>(), 1..64),
        b in prop::collection::vec(any::<u8>(), 1..64),
        ts in arb_timestamp()
    ) {
        prop_assume!(a != b);
        let secret_a = VenueSecret::new(a);
        let secret_b = VenueSecret::new(b);

        let code = generate_code(&secret_a, ts);
        // Six-digit codes collide 1 in 10^6 times by construction, so skip
        // the rare case where both secrets derive the same code.
        prop_assume!(code != generate_code(&secret_b, ts));

        prop_assert!(!verify_code(&code, &secret_b, ts).valid);
    }
}

// ============================================================================
// Constant-Time Comparison Properties
// ============================================================================

proptest! {
    /// Property: equality matches the standard comparison
    #[test]
    fn ct_eq_matches_std_eq(a in prop::collection::vec(any::<u8>(), 0..64), b in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(constant_time_eq(&a, &b), a == b);
    }

    /// Property: reflexive for any input
    #[test]
    fn ct_eq_is_reflexive(a in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert!(constant_time_eq(&a, &a));
    }
}

// ============================================================================
// Geolocation Properties
// ============================================================================

proptest! {
    /// Property: valid coordinate ranges always validate cleanly
    #[test]
    fn valid_ranges_validate(lat in arb_latitude(), lng in arb_longitude(), accuracy in 0.0f64..=10_000.0) {
        prop_assert!(validate_coordinates(lat, lng, Some(accuracy)).is_empty());
    }

    /// Property: out-of-range latitude always fails validation
    #[test]
    fn out_of_range_latitude_fails(lat in 90.0001f64..1e6, lng in arb_longitude()) {
        let errors = validate_coordinates(lat, lng, None);
        prop_assert!(errors.iter().any(|e| e.field == "user_latitude"));
    }

    /// Property: location score is within bounds and zero beyond the radius
    #[test]
    fn location_score_bounded(
        user_lat in arb_latitude(),
        user_lng in arb_longitude(),
        venue_lat in arb_latitude(),
        venue_lng in arb_longitude(),
        max_distance in 1.0f64..10_000.0
    ) {
        let user = Coordinates::new(user_lat, user_lng);
        let venue = Coordinates::new(venue_lat, venue_lng);
        let result = score_location(&user, &venue, max_distance);

        prop_assert!(result.score <= 40);
        if result.distance_meters >= max_distance {
            prop_assert_eq!(result.score, 0);
        }
    }

    /// Property: score is monotonically non-increasing in distance along a meridian
    #[test]
    fn location_score_monotone(steps in 2usize..50, step_degrees in 0.00001f64..0.001) {
        let venue = Coordinates::new(0.0, 0.0);
        let mut previous = u8::MAX;

        for i in 0..steps {
            let user = Coordinates::new(step_degrees * i as f64, 0.0);
            let score = score_location(&user, &venue, 1_000.0).score;
            prop_assert!(score <= previous);
            previous = score;
        }
    }

    /// Property: the score at the venue itself is always full marks
    #[test]
    fn full_marks_at_zero_distance(lat in arb_latitude(), lng in arb_longitude(), max_distance in 1.0f64..10_000.0) {
        let venue = Coordinates::new(lat, lng);
        prop_assert_eq!(score_location(&venue, &venue, max_distance).score, 40);
    }
}
