//! Session authentication for the presence engine.
//!
//! Every check-in request must carry an authenticated user identity before
//! the verification pipeline runs; the engine never trusts a self-reported
//! user id. Tokens are opaque bearer strings, SHA-256 hashed before lookup
//! and compared in constant time.
//!
//! # Configuration
//!
//! - `AUTH_MODE`: `required` (default) or `disabled` for development
//! - `BOOTSTRAP_SESSION_TOKEN`: pre-provisioned admin session for setup
//! - `SESSION_TTL_SECS`: session lifetime (default 24 h)
//! - `RATE_LIMIT_PER_MINUTE`: per-user request ceiling (0 disables)

mod middleware;
mod session;

pub use middleware::*;
pub use session::*;

use crate::domain::UserId;

/// Authenticated caller identity attached to each request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The user on whose behalf the request runs
    pub user_id: UserId,

    /// Operator/administrative session (code preview, metrics)
    pub admin: bool,
}

impl SessionContext {
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("invalid session token")]
    InvalidToken,

    #[error("session expired")]
    SessionExpired,

    #[error("admin session required")]
    AdminRequired,

    #[error("rate limit exceeded")]
    RateLimited,
}
