//! HTTP server bootstrap for Game Group.
//!
//! This module wires together:
//! - configuration
//! - database connection pool
//! - core services (token store, sessions, magic links, mailer)
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{Authenticator, MagicLinkService, SessionTokens};
use crate::infra::{GameStore, PgGameStore, PgTokenStore, PgUserStore, TokenStore, UserStore};
use crate::notify::{HttpMailer, LogMailer, Mailer};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// Public base URL for login links.
    pub base_url: String,
    /// Validity window for login links.
    pub link_expiry: Duration,
    /// Validity window for session JWTs.
    pub session_expiry: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/gamegroup".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {e}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));
        let base_url = base_url.trim_end_matches('/').to_string();

        let link_expiry_minutes: i64 = std::env::var("LINK_EXPIRY_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        let session_expiry_hours: i64 = std::env::var("SESSION_EXPIRY_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            base_url,
            link_expiry: Duration::minutes(link_expiry_minutes),
            session_expiry: Duration::hours(session_expiry_hours),
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub token_store: Arc<dyn TokenStore>,
    pub user_store: Arc<dyn UserStore>,
    pub game_store: Arc<dyn GameStore>,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: Arc<SessionTokens>,
    pub magic_links: Arc<MagicLinkService>,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Game Group server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Base URL: {}", config.base_url);
    info!("  Link expiry: {} minutes", config.link_expiry.num_minutes());
    info!(
        "  Session expiry: {} hours",
        config.session_expiry.num_hours()
    );

    let jwt_secret = std::env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set; refusing to start without it"))?;

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

    // Initialize stores
    let token_store: Arc<dyn TokenStore> = Arc::new(PgTokenStore::new(pool.clone()));
    let user_store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let game_store: Arc<dyn GameStore> = Arc::new(PgGameStore::new(pool.clone()));

    seed_admin_from_env(user_store.as_ref()).await?;

    // Auth services
    let sessions = Arc::new(SessionTokens::new(
        jwt_secret.as_bytes(),
        config.session_expiry,
        user_store.clone(),
    )?);
    let magic_links = Arc::new(MagicLinkService::new(
        token_store.clone(),
        sessions.clone(),
        config.base_url.clone(),
        config.link_expiry,
    ));
    let authenticator = Arc::new(Authenticator::new(sessions.clone()));

    // Outbound mail (optional - logs links when not configured)
    let mailer: Arc<dyn Mailer> = match (
        std::env::var("MAIL_API_URL"),
        std::env::var("MAIL_API_KEY"),
    ) {
        (Ok(api_url), Ok(api_key)) => {
            let from = std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "gamegroup@localhost".to_string());
            info!("Mail delivery configured via HTTP API");
            Arc::new(HttpMailer::new(api_url, api_key, from))
        }
        _ => {
            warn!("MAIL_API_URL/MAIL_API_KEY not set; login links will be logged, not emailed");
            Arc::new(LogMailer)
        }
    };

    let state = AppState {
        token_store,
        user_store,
        game_store,
        mailer,
        sessions,
        magic_links,
    };

    let app = build_router(authenticator)?.with_state(state);

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Game Group server is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Upsert the bootstrap admin account if `SEED_ADMIN_EMAIL` is set.
async fn seed_admin_from_env(user_store: &dyn UserStore) -> anyhow::Result<()> {
    let email = match std::env::var("SEED_ADMIN_EMAIL") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_lowercase(),
        _ => return Ok(()),
    };

    let username = std::env::var("SEED_ADMIN_USERNAME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| {
            email
                .split('@')
                .next()
                .unwrap_or("admin")
                .to_string()
        });

    user_store
        .upsert(
            &username,
            &email,
            Some("is_viewer,is_contributor,is_admin"),
        )
        .await?;
    info!(email, "seed admin account ensured");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Assemble the full router. Public routes and health probes sit outside the
/// auth middleware; everything else requires a session credential.
pub fn build_router(authenticator: Arc<Authenticator>) -> anyhow::Result<Router<AppState>> {
    let protected = crate::api::protected_router().layer(axum::middleware::from_fn_with_state(
        authenticator,
        crate::auth::auth_middleware,
    ));

    let mut router = Router::new()
        .merge(crate::api::public_router())
        .merge(protected)
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
            .allow_methods([Method::GET, Method::POST, Method::PUT])
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
        "service": "gamegroup-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    // A cheap store read proves database connectivity.
    match state.user_store.get_by_email("readiness@probe.invalid").await {
        Ok(_) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Database unavailable: {}", e),
        )),
    }
}
