//! Rotating on-site code derivation and verification.
//!
//! Codes are a deterministic function of `(venue secret, time window)` where
//! the window is `floor(unix_seconds / 30)`. Derivation is HMAC-SHA256 with a
//! domain prefix, reduced to 6 decimal digits via RFC 4226 dynamic
//! truncation. The keyed hash is what makes codes unforgeable without the
//! secret; a plain hash of concatenated strings would not be.
//!
//! Verification accepts the current window and the immediately preceding one
//! (offset `-1`), tolerating up to ~60 s of clock drift plus network latency
//! while rejecting anything older.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::crypto::constant_time_eq;
use crate::domain::VenueSecret;

type HmacSha256 = Hmac<Sha256>;

/// Domain prefix for rotating-code derivation.
const DOMAIN_ROTATING_CODE: &[u8] = b"PRESENCE_ROTATING_CODE_V1";

/// Width of a window in seconds.
pub const CODE_WINDOW_SECS: u64 = 30;

/// Number of digits in a rotating code.
pub const CODE_DIGITS: usize = 6;

const CODE_MODULUS: u32 = 1_000_000;

/// Window offsets accepted during verification. `0` is the current window,
/// `-1` absorbs the handoff across a window boundary.
const ACCEPTED_OFFSETS: [i64; 2] = [0, -1];

/// Result of verifying a candidate code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeVerification {
    pub valid: bool,
    /// Which accepted window matched (`0` current, `-1` previous).
    pub window_offset: Option<i64>,
}

impl CodeVerification {
    fn rejected() -> Self {
        Self {
            valid: false,
            window_offset: None,
        }
    }
}

/// The time window a unix timestamp falls in.
pub fn time_window(unix_seconds: u64) -> u64 {
    unix_seconds / CODE_WINDOW_SECS
}

/// Seconds until the window containing `unix_seconds` rolls over.
pub fn seconds_remaining_in_window(unix_seconds: u64) -> u64 {
    CODE_WINDOW_SECS - (unix_seconds % CODE_WINDOW_SECS)
}

/// Generate the 6-digit code for the window containing `unix_seconds`.
///
/// Deterministic: the same secret and window always produce the same code,
/// which is what lets venue display hardware and the verifier agree without
/// coordination.
pub fn generate_code(secret: &VenueSecret, unix_seconds: u64) -> String {
    code_for_window(secret, time_window(unix_seconds))
}

fn code_for_window(secret: &VenueSecret, window: u64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(DOMAIN_ROTATING_CODE);
    mac.update(&window.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // RFC 4226 dynamic truncation: low nibble of the last byte selects a
    // 4-byte slice, masked to 31 bits, reduced mod 10^6.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    format!("{:0width$}", binary % CODE_MODULUS, width = CODE_DIGITS)
}

/// Check whether `candidate` is well-formed: exactly 6 ASCII digits.
pub fn is_well_formed_code(candidate: &str) -> bool {
    candidate.len() == CODE_DIGITS && candidate.bytes().all(|b| b.is_ascii_digit())
}

/// Verify a candidate against the current and previous windows.
///
/// Comparison is constant-time per window; both accepted windows are always
/// checked so a match in the first does not shorten execution relative to a
/// match in the second.
pub fn verify_code(candidate: &str, secret: &VenueSecret, unix_seconds: u64) -> CodeVerification {
    if !is_well_formed_code(candidate) {
        return CodeVerification::rejected();
    }

    let current = time_window(unix_seconds);
    let mut matched: Option<i64> = None;

    for offset in ACCEPTED_OFFSETS {
        let Some(window) = current.checked_add_signed(offset) else {
            continue;
        };
        let expected = code_for_window(secret, window);
        if constant_time_eq(candidate.as_bytes(), expected.as_bytes()) && matched.is_none() {
            matched = Some(offset);
        }
    }

    CodeVerification {
        valid: matched.is_some(),
        window_offset: matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> VenueSecret {
        VenueSecret::new(b"test-venue-secret-0001".to_vec())
    }

    /// Timestamp aligned to the start of a window, away from u64 edges.
    const T0: u64 = 1_700_000_010; // 1_700_000_010 / 30 = 56_666_667 exactly

    #[test]
    fn test_window_alignment() {
        assert_eq!(T0 % CODE_WINDOW_SECS, 0);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate_code(&secret(), T0);
        let b = generate_code(&secret(), T0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_code_is_six_digits() {
        let code = generate_code(&secret(), T0);
        assert_eq!(code.len(), CODE_DIGITS);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_same_window_same_code() {
        // Any timestamp within one 30 s window yields the same code.
        let a = generate_code(&secret(), T0);
        let b = generate_code(&secret(), T0 + 29);
        assert_eq!(a, b);
    }

    #[test]
    fn test_adjacent_windows_differ() {
        let a = generate_code(&secret(), T0);
        let b = generate_code(&secret(), T0 + CODE_WINDOW_SECS);
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_secrets_differ() {
        let other = VenueSecret::new(b"test-venue-secret-0002".to_vec());
        assert_ne!(generate_code(&secret(), T0), generate_code(&other, T0));
    }

    #[test]
    fn test_verify_current_window() {
        let code = generate_code(&secret(), T0);
        let result = verify_code(&code, &secret(), T0);
        assert!(result.valid);
        assert_eq!(result.window_offset, Some(0));
    }

    #[test]
    fn test_verify_previous_window_tolerance() {
        let code = generate_code(&secret(), T0);
        // 59 s after generation at a window start: one window behind.
        let result = verify_code(&code, &secret(), T0 + 59);
        assert!(result.valid);
        assert_eq!(result.window_offset, Some(-1));
    }

    #[test]
    fn test_verify_rejects_expired_code() {
        let code = generate_code(&secret(), T0);
        // 61 s later the code is two windows old.
        let result = verify_code(&code, &secret(), T0 + 61);
        assert!(!result.valid);
        assert_eq!(result.window_offset, None);
    }

    #[test]
    fn test_verify_rejects_future_code() {
        // A code from the next window must not verify yet.
        let future = generate_code(&secret(), T0 + CODE_WINDOW_SECS);
        assert!(!verify_code(&future, &secret(), T0).valid);
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert!(!verify_code("12345", &secret(), T0).valid);
        assert!(!verify_code("1234567", &secret(), T0).valid);
        assert!(!verify_code("12345a", &secret(), T0).valid);
        assert!(!verify_code("", &secret(), T0).valid);
    }

    #[test]
    fn test_verify_rejects_wrong_code() {
        let code = generate_code(&secret(), T0);
        // Flip one digit.
        let mut wrong = code.into_bytes();
        wrong[0] = if wrong[0] == b'9' { b'0' } else { wrong[0] + 1 };
        let wrong = String::from_utf8(wrong).unwrap();
        assert!(!verify_code(&wrong, &secret(), T0).valid);
    }

    #[test]
    fn test_seconds_remaining() {
        assert_eq!(seconds_remaining_in_window(T0), 30);
        assert_eq!(seconds_remaining_in_window(T0 + 29), 1);
    }
}
