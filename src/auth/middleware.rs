//! Authentication middleware for Axum.
//!
//! Resolves the bearer session token to a [`SessionContext`] and attaches
//! it to the request before any handler runs. Authentication failures are
//! rejected here, so no scoring logic ever executes for an unauthenticated
//! request.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{AuthError, SessionContext, SessionValidator};
use crate::domain::UserId;

/// Session context extension for request
#[derive(Clone)]
pub struct SessionContextExt(pub SessionContext);

/// Authentication middleware configuration/state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub validator: Arc<SessionValidator>,
    /// If false, requests are treated as an anonymous admin (dev mode).
    pub require_auth: bool,
    /// Optional per-user rate limiter.
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let context = match token {
        Some(token) => match state.validator.validate(token) {
            Ok(context) => context,
            Err(e) if state.require_auth => return auth_error_response(e),
            Err(_) => anonymous_context(),
        },
        None if state.require_auth => return auth_error_response(AuthError::MissingAuth),
        None => anonymous_context(),
    };

    let mut rate_remaining = None;
    if let Some(ref limiter) = state.rate_limiter {
        let key = format!("user:{}", context.user_id);
        if let Err(e) = limiter.check(&key) {
            return auth_error_response(e);
        }
        rate_remaining = Some(limiter.remaining(&key));
    }

    request.extensions_mut().insert(SessionContextExt(context));
    let mut response = next.run(request).await;

    if let Some(remaining) = rate_remaining {
        if let Ok(value) = axum::http::HeaderValue::from_str(&remaining.to_string()) {
            response.headers_mut().insert(
                axum::http::HeaderName::from_static("x-ratelimit-remaining"),
                value,
            );
        }
    }

    response
}

/// Dev-mode stand-in identity when AUTH_MODE=disabled.
fn anonymous_context() -> SessionContext {
    SessionContext {
        user_id: UserId::from_uuid(Uuid::nil()),
        admin: true,
    }
}

/// Convert auth error to HTTP response
fn auth_error_response(error: AuthError) -> Response {
    let (status, message) = match error {
        AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Missing authentication"),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid session token"),
        AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
        AuthError::AdminRequired => (StatusCode::FORBIDDEN, "Admin session required"),
        AuthError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
    };

    (
        status,
        axum::Json(serde_json::json!({
            "error": message,
            "code": format!("{:?}", error).to_lowercase()
        })),
    )
        .into_response()
}

/// Rate limiter for API requests
pub struct RateLimiter {
    /// Requests per minute per key
    requests_per_minute: u32,
    /// In-memory request counts; check-in traffic is human-timescale so a
    /// fixed-window counter per key is enough.
    counts: std::sync::RwLock<std::collections::HashMap<String, (u32, std::time::Instant)>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            counts: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Check if request is allowed
    pub fn check(&self, key: &str) -> Result<(), AuthError> {
        let mut counts = self.counts.write().unwrap();
        let now = std::time::Instant::now();

        let entry = counts.entry(key.to_string()).or_insert((0, now));

        // Reset counter if minute has passed
        if now.duration_since(entry.1).as_secs() >= 60 {
            *entry = (0, now);
        }

        if entry.0 >= self.requests_per_minute {
            return Err(AuthError::RateLimited);
        }

        entry.0 += 1;
        Ok(())
    }

    /// Get remaining requests for a key
    pub fn remaining(&self, key: &str) -> u32 {
        let counts = self.counts.read().unwrap();
        let now = std::time::Instant::now();

        match counts.get(key) {
            Some((count, started)) => {
                if now.duration_since(*started).as_secs() >= 60 {
                    self.requests_per_minute
                } else {
                    self.requests_per_minute.saturating_sub(*count)
                }
            }
            None => self.requests_per_minute,
        }
    }
}
