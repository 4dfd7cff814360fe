//! Constant-time equality for codes, tokens, and secrets.
//!
//! A standard `==` on strings returns at the first differing byte, which
//! leaks the mismatch position through timing. Every comparison of a
//! secret-derived value in this crate goes through [`constant_time_eq`].

use subtle::ConstantTimeEq;

/// Compare two byte slices in constant time.
///
/// A length mismatch returns `false` immediately; length is considered
/// public (rotating codes are always 6 digits, token hashes are fixed
/// width), so only the content comparison needs to be equal-cost. When
/// lengths match, every byte is examined regardless of where the first
/// difference occurs.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Convenience wrapper for string comparison.
pub fn constant_time_eq_str(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_inputs() {
        assert!(constant_time_eq(b"482913", b"482913"));
        assert!(constant_time_eq_str("", ""));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!constant_time_eq(b"482913", b"48291"));
        assert!(!constant_time_eq(b"", b"0"));
    }

    #[test]
    fn test_single_byte_mismatch_any_position() {
        let reference = b"482913";
        for i in 0..reference.len() {
            let mut altered = *reference;
            altered[i] = altered[i].wrapping_add(1);
            assert!(!constant_time_eq(reference, &altered), "position {i}");
        }
    }

    /// Spot-check that comparison cost does not visibly depend on the
    /// mismatch position. Not a strict enforcement (timers are noisy in
    /// CI); it exists to catch a regression to short-circuit comparison.
    #[test]
    fn test_timing_spot_check() {
        use std::time::Instant;

        let reference = vec![0x41u8; 4096];
        let mut early = reference.clone();
        early[0] ^= 0xff;
        let mut late = reference.clone();
        *late.last_mut().unwrap() ^= 0xff;

        let mut early_total = std::time::Duration::ZERO;
        let mut late_total = std::time::Duration::ZERO;
        for _ in 0..1000 {
            let t = Instant::now();
            std::hint::black_box(constant_time_eq(&reference, &early));
            early_total += t.elapsed();

            let t = Instant::now();
            std::hint::black_box(constant_time_eq(&reference, &late));
            late_total += t.elapsed();
        }

        // Allow a generous 10x band; a short-circuit comparison would show
        // orders of magnitude difference on a 4 KiB input.
        let ratio = late_total.as_nanos() as f64 / early_total.as_nanos().max(1) as f64;
        assert!(ratio < 10.0 && ratio > 0.1, "timing ratio {ratio}");
    }
}
