//! PostgreSQL check-in record store.
//!
//! # Atomicity
//!
//! The upsert is one conditional `INSERT ... ON CONFLICT` statement:
//!
//! ```sql
//! INSERT INTO checkin_records (...) VALUES (...)
//! ON CONFLICT (venue_id, user_id) DO UPDATE SET ...
//! WHERE checkin_records.passed = FALSE
//! RETURNING *;
//! ```
//!
//! The `WHERE passed = FALSE` guard on the update arm means a row that has
//! already passed is never touched; the statement then returns no row and
//! the store surfaces `AlreadyVerified`. Two concurrent attempts from the
//! same user (double-tap, retried request) serialize inside PostgreSQL on
//! the primary key, so at most one can set `passed = TRUE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    CheckinOutcome, CheckinRecord, Coordinates, RiskAssessment, UserId, VenueId, VerificationScore,
};
use crate::infra::{CheckinStore, PresenceError, Result};

/// PostgreSQL-backed check-in store.
pub struct PgCheckinStore {
    pool: PgPool,
}

impl PgCheckinStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CheckinRow {
    venue_id: Uuid,
    user_id: Uuid,
    code_score: i16,
    location_score: i16,
    receipt_score: i16,
    total_score: i16,
    passed: bool,
    distance_meters: Option<f64>,
    accuracy_meters: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    code_matched: bool,
    suspicious_speed: bool,
    inconsistent_accuracy: bool,
    risk_score: i16,
    attempts: i32,
    verified_at: DateTime<Utc>,
}

impl From<CheckinRow> for CheckinRecord {
    fn from(row: CheckinRow) -> Self {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
                accuracy_meters: row.accuracy_meters,
            }),
            _ => None,
        };

        CheckinRecord {
            venue_id: VenueId::from_uuid(row.venue_id),
            user_id: UserId::from_uuid(row.user_id),
            score: VerificationScore {
                code: row.code_score as u8,
                location: row.location_score as u8,
                receipt: row.receipt_score as u8,
                total: row.total_score as u8,
                passed: row.passed,
            },
            distance_meters: row.distance_meters,
            accuracy_meters: row.accuracy_meters,
            coordinates,
            code_matched: row.code_matched,
            risk: RiskAssessment {
                suspicious_speed: row.suspicious_speed,
                inconsistent_accuracy: row.inconsistent_accuracy,
                risk_score: row.risk_score as u8,
            },
            attempts: row.attempts as u32,
            verified_at: row.verified_at,
        }
    }
}

#[async_trait]
impl CheckinStore for PgCheckinStore {
    #[instrument(skip(self, outcome), fields(venue_id = %outcome.venue_id, user_id = %outcome.user_id))]
    async fn upsert(&self, outcome: CheckinOutcome) -> Result<CheckinRecord> {
        let (latitude, longitude) = match outcome.coordinates {
            Some(c) => (Some(c.latitude), Some(c.longitude)),
            None => (None, None),
        };

        let row: Option<CheckinRow> = sqlx::query_as(
            r#"
            INSERT INTO checkin_records (
                venue_id, user_id,
                code_score, location_score, receipt_score, total_score, passed,
                distance_meters, accuracy_meters, latitude, longitude,
                code_matched, suspicious_speed, inconsistent_accuracy, risk_score,
                attempts, verified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 1, NOW())
            ON CONFLICT (venue_id, user_id) DO UPDATE SET
                code_score = EXCLUDED.code_score,
                location_score = EXCLUDED.location_score,
                receipt_score = EXCLUDED.receipt_score,
                total_score = EXCLUDED.total_score,
                passed = EXCLUDED.passed,
                distance_meters = EXCLUDED.distance_meters,
                accuracy_meters = EXCLUDED.accuracy_meters,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                code_matched = EXCLUDED.code_matched,
                suspicious_speed = EXCLUDED.suspicious_speed,
                inconsistent_accuracy = EXCLUDED.inconsistent_accuracy,
                risk_score = EXCLUDED.risk_score,
                attempts = checkin_records.attempts + 1,
                verified_at = NOW()
            WHERE checkin_records.passed = FALSE
            RETURNING
                venue_id, user_id,
                code_score, location_score, receipt_score, total_score, passed,
                distance_meters, accuracy_meters, latitude, longitude,
                code_matched, suspicious_speed, inconsistent_accuracy, risk_score,
                attempts, verified_at
            "#,
        )
        .bind(outcome.venue_id.0)
        .bind(outcome.user_id.0)
        .bind(i16::from(outcome.score.code))
        .bind(i16::from(outcome.score.location))
        .bind(i16::from(outcome.score.receipt))
        .bind(i16::from(outcome.score.total))
        .bind(outcome.score.passed)
        .bind(outcome.distance_meters)
        .bind(outcome.accuracy_meters)
        .bind(latitude)
        .bind(longitude)
        .bind(outcome.code_matched)
        .bind(outcome.risk.suspicious_speed)
        .bind(outcome.risk.inconsistent_accuracy)
        .bind(i16::from(outcome.risk.risk_score))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            // The conflict arm was suppressed by the passed-guard: a passed
            // record already owns this key.
            None => Err(PresenceError::AlreadyVerified {
                venue_id: outcome.venue_id,
                user_id: outcome.user_id,
            }),
        }
    }

    #[instrument(skip(self))]
    async fn get(&self, venue_id: &VenueId, user_id: &UserId) -> Result<Option<CheckinRecord>> {
        let row: Option<CheckinRow> = sqlx::query_as(
            r#"
            SELECT
                venue_id, user_id,
                code_score, location_score, receipt_score, total_score, passed,
                distance_meters, accuracy_meters, latitude, longitude,
                code_matched, suspicious_speed, inconsistent_accuracy, risk_score,
                attempts, verified_at
            FROM checkin_records
            WHERE venue_id = $1 AND user_id = $2
            "#,
        )
        .bind(venue_id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
