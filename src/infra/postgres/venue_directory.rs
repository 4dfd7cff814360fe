//! PostgreSQL venue directory and secret store.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{Coordinates, Venue, VenueId, VenueSecret, VenueStatus};
use crate::infra::{PresenceError, Result, SecretStore, VenueDirectory};

/// PostgreSQL-backed venue directory.
pub struct PgVenueDirectory {
    pool: PgPool,
}

impl PgVenueDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct VenueRow {
    venue_id: Uuid,
    display_name: String,
    status: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    max_distance_meters: f64,
}

impl TryFrom<VenueRow> for Venue {
    type Error = PresenceError;

    fn try_from(row: VenueRow) -> Result<Self> {
        let status: VenueStatus = row
            .status
            .parse()
            .map_err(|e: String| PresenceError::Internal(e))?;

        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        };

        Ok(Venue {
            venue_id: VenueId::from_uuid(row.venue_id),
            display_name: row.display_name,
            status,
            coordinates,
            max_distance_meters: row.max_distance_meters,
        })
    }
}

#[async_trait]
impl VenueDirectory for PgVenueDirectory {
    #[instrument(skip(self))]
    async fn get_venue(&self, venue_id: &VenueId) -> Result<Option<Venue>> {
        let row: Option<VenueRow> = sqlx::query_as(
            r#"
            SELECT venue_id, display_name, status, latitude, longitude, max_distance_meters
            FROM venues
            WHERE venue_id = $1
            "#,
        )
        .bind(venue_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Venue::try_from).transpose()
    }
}

/// PostgreSQL-backed venue secret store.
pub struct PgSecretStore {
    pool: PgPool,
}

impl PgSecretStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretStore for PgSecretStore {
    #[instrument(skip(self))]
    async fn get_venue_secret(&self, venue_id: &VenueId) -> Result<Option<VenueSecret>> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT secret FROM venue_secrets WHERE venue_id = $1")
                .bind(venue_id.0)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(bytes,)| VenueSecret::new(bytes)))
    }
}
