//! Presence Engine Library
//!
//! Venue presence verification service: decides whether a user is physically,
//! verifiably present at a venue before a reward or booking unlock is granted.
//! Combines a rotating on-site code, device geolocation, and (optionally) a
//! receipt into a single pass/fail verdict while resisting replay and
//! spoofing attacks.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (venues, coordinates, scores, check-in records)
//! - [`crypto`] - Rotating code derivation and constant-time comparison
//! - [`verify`] - Replay guard, geolocation scoring, spoofing heuristics, orchestrator
//! - [`infra`] - Storage traits, in-memory and PostgreSQL implementations, event bus
//! - [`auth`] - Session-token authentication middleware
//! - [`metrics`] - In-process counters and gauges
//! - [`api`] - REST API routes

pub mod api;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod metrics;
pub mod migrations;
pub mod server;
pub mod verify;

// Re-export commonly used types
pub use domain::{
    CheckinRecord, Coordinates, RiskAssessment, UserId, Venue, VenueId, VenueSecret, VenueStatus,
    VerificationScore,
};

pub use infra::{CheckinStore, EventSink, PresenceError, Result, SecretStore, VenueDirectory};

pub use verify::{ReplayGuard, Verdict, VerificationEngine};
