//! Session token validation.
//!
//! Tokens are formatted as `pv_<random>` and are never stored in plaintext:
//! the store keys on the SHA-256 hash of the full token. Lookup by hash
//! already defeats positional timing leaks, and the final hash comparison
//! goes through the constant-time comparator anyway.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use super::{AuthError, SessionContext};
use crate::crypto::constant_time_eq_str;
use crate::domain::UserId;

/// Session token prefix
pub const SESSION_TOKEN_PREFIX: &str = "pv_";

/// Default session lifetime. Bootstrap admin sessions are re-registered on
/// every server start, so they age out with everything else.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Session metadata stored against a token hash.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// SHA-256 hex of the token (never the plaintext)
    pub token_hash: String,

    /// Authenticated user
    pub user_id: UserId,

    /// Operator/administrative session
    pub admin: bool,

    /// When the session was issued, for TTL checks
    pub issued_at: Instant,

    /// Whether the session is still active
    pub active: bool,
}

/// Session token validator backed by an in-memory record store.
///
/// A production deployment would hydrate this from the platform's identity
/// service; the validator's contract does not change.
pub struct SessionValidator {
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionValidator {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a new session token for a user.
    ///
    /// Returns (plaintext_token, token_hash); the plaintext exists only in
    /// the return value.
    pub fn issue(&self, user_id: UserId, admin: bool) -> (String, String) {
        use rand::Rng;
        let random_bytes: [u8; 24] = rand::thread_rng().gen();
        let random_part = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            random_bytes,
        );

        let plaintext = format!("{SESSION_TOKEN_PREFIX}{random_part}");
        let token_hash = Self::hash_token(&plaintext);

        self.register(SessionRecord {
            token_hash: token_hash.clone(),
            user_id,
            admin,
            issued_at: Instant::now(),
            active: true,
        });

        (plaintext, token_hash)
    }

    /// Hash a token for storage/lookup.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Register an externally issued session (bootstrap token from config).
    pub fn register(&self, record: SessionRecord) {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(record.token_hash.clone(), record);
    }

    /// Validate a bearer token and return the session context.
    pub fn validate(&self, token: &str) -> Result<SessionContext, AuthError> {
        if !token.starts_with(SESSION_TOKEN_PREFIX) {
            return Err(AuthError::InvalidToken);
        }

        let token_hash = Self::hash_token(token);

        let sessions = self.sessions.read().unwrap();
        let record = sessions.get(&token_hash).ok_or(AuthError::InvalidToken)?;

        if !constant_time_eq_str(&record.token_hash, &token_hash) {
            return Err(AuthError::InvalidToken);
        }
        if !record.active {
            return Err(AuthError::SessionExpired);
        }
        if record.issued_at.elapsed() >= self.ttl {
            return Err(AuthError::SessionExpired);
        }

        Ok(SessionContext {
            user_id: record.user_id,
            admin: record.admin,
        })
    }

    /// Revoke a session by token hash.
    pub fn revoke(&self, token_hash: &str) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(record) = sessions.get_mut(token_hash) {
            record.active = false;
        }
    }
}

impl Default for SessionValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let validator = SessionValidator::new();
        let user_id = UserId::new();

        let (token, hash) = validator.issue(user_id, false);
        assert!(token.starts_with(SESSION_TOKEN_PREFIX));
        assert_eq!(hash.len(), 64); // SHA-256 hex

        let context = validator.validate(&token).unwrap();
        assert_eq!(context.user_id, user_id);
        assert!(!context.is_admin());
    }

    #[test]
    fn test_admin_session() {
        let validator = SessionValidator::new();
        let (token, _) = validator.issue(UserId::new(), true);
        assert!(validator.validate(&token).unwrap().is_admin());
    }

    #[test]
    fn test_invalid_token() {
        let validator = SessionValidator::new();
        assert!(matches!(
            validator.validate("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            validator.validate("pv_unknown"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_revoked_session() {
        let validator = SessionValidator::new();
        let (token, hash) = validator.issue(UserId::new(), false);

        assert!(validator.validate(&token).is_ok());

        validator.revoke(&hash);
        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::SessionExpired)
        ));
    }

    #[test]
    fn test_session_expires_after_ttl() {
        let validator = SessionValidator::with_ttl(Duration::ZERO);
        let (token, _) = validator.issue(UserId::new(), false);
        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::SessionExpired)
        ));
    }

    #[test]
    fn test_fresh_session_within_ttl() {
        let validator = SessionValidator::with_ttl(Duration::from_secs(3600));
        let (token, _) = validator.issue(UserId::new(), false);
        assert!(validator.validate(&token).is_ok());
    }

    #[test]
    fn test_tokens_are_unique() {
        let validator = SessionValidator::new();
        let (a, _) = validator.issue(UserId::new(), false);
        let (b, _) = validator.issue(UserId::new(), false);
        assert_ne!(a, b);
    }
}
