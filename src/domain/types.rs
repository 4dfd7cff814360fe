//! Venue and identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(pub uuid::Uuid);

impl VenueId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl Default for VenueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier (supplied by the session provider, never self-reported)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque per-venue secret used to derive rotating codes.
///
/// Immutable once issued; rotation is an out-of-band administrative action.
/// Deliberately excludes the secret bytes from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct VenueSecret(Vec<u8>);

impl VenueSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a fresh random 32-byte secret.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VenueSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VenueSecret([redacted; {} bytes])", self.0.len())
    }
}

/// Venue lifecycle status. Check-in is only permitted while `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueStatus {
    /// Open for check-in
    Open,
    /// Temporarily closed (outside business hours, private event)
    Closed,
    /// Listed but not yet accepting check-ins
    Pending,
    /// Removed from the platform
    Archived,
}

impl VenueStatus {
    pub fn accepts_checkin(&self) -> bool {
        matches!(self, VenueStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VenueStatus::Open => "open",
            VenueStatus::Closed => "closed",
            VenueStatus::Pending => "pending",
            VenueStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for VenueStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(VenueStatus::Open),
            "closed" => Ok(VenueStatus::Closed),
            "pending" => Ok(VenueStatus::Pending),
            "archived" => Ok(VenueStatus::Archived),
            other => Err(format!("unknown venue status: {other}")),
        }
    }
}

impl fmt::Display for VenueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Venue directory record as consumed by the verification engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub venue_id: VenueId,
    pub display_name: String,
    pub status: VenueStatus,
    /// Known venue coordinates; absent for venues without a fixed location.
    pub coordinates: Option<super::Coordinates>,
    /// Geofence radius beyond which the location score is zero.
    pub max_distance_meters: f64,
}
