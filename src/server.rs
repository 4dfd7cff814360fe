//! HTTP server bootstrap for the presence engine.
//!
//! This module wires together:
//! - configuration
//! - database connection pool
//! - core services (stores, replay guard, event bus, verification engine)
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::auth::{
    AuthMiddlewareState, RateLimiter, SessionRecord, SessionValidator,
};
use crate::domain::{UserId, VenueId, VerificationPassed};
use crate::infra::{EventBus, PgCheckinStore, PgSecretStore, PgVenueDirectory, PresenceError};
use crate::metrics::MetricsRegistry;
use crate::verify::{InMemoryReplayGuard, VerificationEngine};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> crate::infra::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/presence_engine".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr = parse_listen_addr(&host, port)?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
        })
    }
}

fn parse_listen_addr(host: &str, port: u16) -> crate::infra::Result<SocketAddr> {
    format!("{host}:{port}").parse().map_err(|_| {
        PresenceError::Configuration(format!("invalid listen address {host}:{port}"))
    })
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    pub metrics: Arc<MetricsRegistry>,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting presence engine v{}", env!("CARGO_PKG_VERSION"));

    // Auth configuration
    let auth_mode = std::env::var("AUTH_MODE").unwrap_or_else(|_| "required".to_string());
    let require_auth = auth_mode != "disabled";

    let validator = Arc::new(
        match std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            Some(secs) => SessionValidator::with_ttl(std::time::Duration::from_secs(secs)),
            None => SessionValidator::new(),
        },
    );
    let mut any_auth_configured = false;

    if let Ok(bootstrap_token) = std::env::var("BOOTSTRAP_SESSION_TOKEN") {
        let token_hash = SessionValidator::hash_token(&bootstrap_token);
        validator.register(SessionRecord {
            token_hash,
            user_id: UserId::from_uuid(Uuid::nil()),
            admin: true,
            issued_at: std::time::Instant::now(),
            active: true,
        });
        any_auth_configured = true;
        info!("Bootstrap admin session token is configured");
    }

    if require_auth && !any_auth_configured {
        anyhow::bail!(
            "AUTH_MODE=required but no auth is configured; set BOOTSTRAP_SESSION_TOKEN (or set AUTH_MODE=disabled for local dev)"
        );
    }

    let rate_limiter = std::env::var("RATE_LIMIT_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .map(|rpm| Arc::new(RateLimiter::new(rpm)));

    let auth_state = AuthMiddlewareState {
        validator,
        require_auth,
        rate_limiter,
    };

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);

    // Connect to PostgreSQL
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to PostgreSQL");

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Running database migrations...");
        crate::migrations::run_postgres(&pool).await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    // Initialize stores and the event bus
    let secrets = Arc::new(PgSecretStore::new(pool.clone()));
    let venues = Arc::new(PgVenueDirectory::new(pool.clone()));
    let checkins = Arc::new(PgCheckinStore::new(pool.clone()));
    let replay = Arc::new(InMemoryReplayGuard::new());

    let (event_bus, event_rx) = EventBus::new();
    spawn_event_consumer(event_rx);

    let engine = Arc::new(VerificationEngine::new(
        secrets,
        venues,
        checkins,
        replay,
        Arc::new(event_bus),
    ));

    let metrics = Arc::new(MetricsRegistry::new());
    metrics
        .set_gauge(
            crate::metrics::metric_names::DB_POOL_SIZE,
            u64::from(config.max_connections),
        )
        .await;

    let state = AppState { engine, metrics };

    // Build router
    let app = build_router(auth_state)?.with_state(state);

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Presence engine is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drain the verification.passed channel. A real deployment forwards these
/// to the reward pipeline; standalone, the log line is the integration.
fn spawn_event_consumer(mut rx: tokio::sync::mpsc::Receiver<VerificationPassed>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(
                venue_id = %event.venue_id,
                user_id = %event.user_id,
                total = event.total_score,
                event_type = VerificationPassed::EVENT_TYPE,
                "verification passed"
            );
        }
    });
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

fn build_router(auth_state: AuthMiddlewareState) -> anyhow::Result<Router<AppState>> {
    let api = crate::api::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        crate::auth::auth_middleware,
    ));

    let mut router = Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "presence-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    // Probe database connectivity with a venue lookup; not-found still
    // proves the store answered.
    match state
        .engine
        .venue(&VenueId::from_uuid(Uuid::nil()))
        .await
    {
        Ok(_) | Err(PresenceError::VenueNotFound(_)) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Database unavailable: {}", e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_addr_accepts_host_port() {
        let addr = parse_listen_addr("127.0.0.1", 8080).unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_parse_listen_addr_rejects_bad_host() {
        let err = parse_listen_addr("not a host", 8080).unwrap_err();
        assert!(matches!(err, PresenceError::Configuration(_)));
    }
}
