//! Cryptographic utilities for the presence engine.
//!
//! Provides:
//! - Rotating code derivation and verification (HMAC-SHA256, 30 s windows)
//! - Constant-time comparison for codes and tokens

mod compare;
mod rotating_code;

pub use compare::*;
pub use rotating_code::*;
