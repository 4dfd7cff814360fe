//! Structured API error responses with error codes
//!
//! This module provides consistent error handling across all API endpoints
//! with machine-readable error codes and human-readable messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// No authentication credentials provided
    AuthRequired,
    /// Invalid or unknown session token
    InvalidSessionToken,
    /// Session has expired or was revoked
    SessionExpired,
    /// Operation requires an admin session
    AdminRequired,

    // Rate limiting errors (2xxx)
    /// Too many requests, rate limit exceeded
    RateLimitExceeded,

    // Validation errors (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// Required field is missing
    MissingRequiredField,
    /// Field value is invalid
    InvalidFieldValue,

    // Resource errors (4xxx)
    /// Venue not found
    VenueNotFound,
    /// Check-in record not found
    CheckinNotFound,

    // Conflict/state errors (5xxx)
    /// Venue exists but is not open for check-in
    VenueNotOpen,
    /// A passed verification already exists for this user at this venue
    AlreadyVerified,
    /// Rotating code already consumed in its validity window
    CodeAlreadyUsed,

    // Infrastructure errors (8xxx)
    /// Database operation failed
    DatabaseError,
    /// External service unavailable
    ServiceUnavailable,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            // Auth (1xxx)
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidSessionToken => 1002,
            ErrorCode::SessionExpired => 1003,
            ErrorCode::AdminRequired => 1004,

            // Rate limiting (2xxx)
            ErrorCode::RateLimitExceeded => 2001,

            // Validation (3xxx)
            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::MissingRequiredField => 3002,
            ErrorCode::InvalidFieldValue => 3003,

            // Resource (4xxx)
            ErrorCode::VenueNotFound => 4001,
            ErrorCode::CheckinNotFound => 4002,

            // Conflict/state (5xxx)
            ErrorCode::VenueNotOpen => 5001,
            ErrorCode::AlreadyVerified => 5002,
            ErrorCode::CodeAlreadyUsed => 5003,

            // Infrastructure (8xxx)
            ErrorCode::DatabaseError => 8001,
            ErrorCode::ServiceUnavailable => 8002,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Auth errors -> 401/403
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidSessionToken => StatusCode::UNAUTHORIZED,
            ErrorCode::SessionExpired => StatusCode::UNAUTHORIZED,
            ErrorCode::AdminRequired => StatusCode::FORBIDDEN,

            // Rate limiting -> 429
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,

            // Validation -> 400
            ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::MissingRequiredField => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,

            // Resource -> 404
            ErrorCode::VenueNotFound => StatusCode::NOT_FOUND,
            ErrorCode::CheckinNotFound => StatusCode::NOT_FOUND,

            // Conflict/state -> 400/409
            ErrorCode::VenueNotOpen => StatusCode::BAD_REQUEST,
            ErrorCode::AlreadyVerified => StatusCode::CONFLICT,
            ErrorCode::CodeAlreadyUsed => StatusCode::CONFLICT,

            // Infrastructure -> 500/503
            ErrorCode::DatabaseError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidSessionToken => "INVALID_SESSION_TOKEN",
            ErrorCode::SessionExpired => "SESSION_EXPIRED",
            ErrorCode::AdminRequired => "ADMIN_REQUIRED",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::VenueNotFound => "VENUE_NOT_FOUND",
            ErrorCode::CheckinNotFound => "CHECKIN_NOT_FOUND",
            ErrorCode::VenueNotOpen => "VENUE_NOT_OPEN",
            ErrorCode::AlreadyVerified => "ALREADY_VERIFIED",
            ErrorCode::CodeAlreadyUsed => "CODE_ALREADY_USED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Additional error details (field-level validation errors, ids)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Retry information for rate limiting and infrastructure failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    /// Related resource ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
                retry_after: None,
                resource_id: None,
            },
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Set retry-after seconds
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.error.retry_after = Some(seconds);
        self
    }

    /// Set related resource ID
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.error.resource_id = Some(id.into());
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

// ============================================================================
// Conversion from PresenceError
// ============================================================================

/// Suggested client backoff for retryable infrastructure failures.
const RETRY_AFTER_SECS: u64 = 5;

impl From<crate::infra::PresenceError> for ApiError {
    fn from(err: crate::infra::PresenceError) -> Self {
        use crate::infra::PresenceError;

        let retryable = err.is_retryable();
        let api = match err {
            PresenceError::Database(e) => {
                ApiError::new(ErrorCode::DatabaseError, format!("Database error: {}", e))
            }
            PresenceError::VenueNotFound(id) => {
                ApiError::new(ErrorCode::VenueNotFound, format!("Venue not found: {}", id))
                    .with_resource_id(id.to_string())
            }
            PresenceError::VenueNotOpen { venue_id, status } => ApiError::new(
                ErrorCode::VenueNotOpen,
                format!("Venue {} is not open for check-in", venue_id),
            )
            .with_resource_id(venue_id.to_string())
            .with_details(serde_json::json!({ "status": status })),
            PresenceError::AlreadyVerified { venue_id, user_id } => ApiError::new(
                ErrorCode::AlreadyVerified,
                "A passed verification already exists for this venue",
            )
            .with_resource_id(venue_id.to_string())
            .with_details(serde_json::json!({
                "venue_id": venue_id,
                "user_id": user_id
            })),
            PresenceError::CodeAlreadyUsed { venue_id } => ApiError::new(
                ErrorCode::CodeAlreadyUsed,
                "Rotating code was already used; wait for the next code",
            )
            .with_resource_id(venue_id.to_string()),
            PresenceError::Validation(errors) => ApiError::new(
                ErrorCode::InvalidFieldValue,
                "Request validation failed",
            )
            .with_details(serde_json::json!({ "fields": errors })),
            PresenceError::CheckinNotFound { venue_id, user_id } => ApiError::new(
                ErrorCode::CheckinNotFound,
                format!("No check-in record for user {} at venue {}", user_id, venue_id),
            )
            .with_resource_id(venue_id.to_string()),
            PresenceError::SecretNotConfigured(id) => ApiError::new(
                ErrorCode::VenueNotFound,
                format!("Venue {} has no rotating-code program", id),
            )
            .with_resource_id(id.to_string()),
            PresenceError::EventPublish(msg) => {
                ApiError::new(ErrorCode::InternalError, format!("Event publish failed: {}", msg))
            }
            PresenceError::Configuration(msg) => {
                ApiError::new(ErrorCode::InternalError, format!("Configuration error: {}", msg))
            }
            PresenceError::Internal(msg) => ApiError::new(ErrorCode::InternalError, msg),
        };

        if retryable {
            api.with_retry_after(RETRY_AFTER_SECS)
        } else {
            api
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a forbidden error for non-admin sessions
pub fn admin_required() -> ApiError {
    ApiError::new(ErrorCode::AdminRequired, "Admin session required")
}

/// Create a validation error with field details
pub fn validation_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidFieldValue, message.into())
        .with_details(serde_json::json!({ "field": field }))
}

// ============================================================================
// Tests
// ============================================================================
