//! Scoring and freshness policy constants.
//!
//! Every weight, threshold, and window lives here so no component repeats a
//! literal. Changing pass policy is a one-line edit with a blast radius the
//! compiler can show.

/// Maximum contribution of a valid, fresh rotating code.
pub const CODE_SCORE_MAX: u8 = 40;

/// Maximum contribution of an in-radius location fix.
pub const LOCATION_SCORE_MAX: u8 = 40;

/// Maximum contribution of a verified receipt. Receipt parsing is stubbed;
/// the contribution is currently always 0 but the weight is reserved.
pub const RECEIPT_SCORE_MAX: u8 = 20;

/// Minimum total score for a check-in to pass.
pub const PASS_THRESHOLD: u8 = 60;

/// How long a consumed `(code, venue, user)` marker stays "used".
///
/// Must cover the full verify tolerance (current + previous window, 60 s)
/// with margin, so a captured code cannot be replayed at the tail of its
/// validity.
pub const REPLAY_RETENTION_SECS: u64 = 90;

/// Implied travel speed above which a pair of fixes is flagged.
/// Generous ceiling: faster than any train, slower than a commercial jet's
/// cruise, so legitimate travel between check-ins rarely trips it.
pub const MAX_PLAUSIBLE_SPEED_KMH: f64 = 300.0;

/// Risk contribution of an impossible-travel flag.
pub const RISK_SUSPICIOUS_SPEED: u8 = 60;

/// Risk contribution of an implausible-accuracy flag.
pub const RISK_INCONSISTENT_ACCURACY: u8 = 40;

/// Upper bound for the accumulated risk score.
pub const RISK_SCORE_CAP: u8 = 100;

/// Largest accepted reported GPS accuracy, in meters.
pub const MAX_ACCURACY_METERS: f64 = 10_000.0;
