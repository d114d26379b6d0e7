//! # userdesk: a small user directory service
//!
//! `userdesk` exposes a JSON HTTP API for creating, listing, reading, partially updating and
//! deleting users stored in PostgreSQL.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum); persistence goes through
//! [sqlx](https://github.com/launchbadge/sqlx) against PostgreSQL.
//!
//! The **API layer** ([`api`]) validates requests, turns them into repository criteria or change
//! sets, and maps results to responses. Errors are converted to HTTP responses by
//! [`errors::Error`].
//!
//! The **database layer** ([`db`]) has two parts. A [`SessionManager`](db::session::SessionManager)
//! owns the connection pool and hands out short-lived sessions, each of which lazily opens at
//! most one transaction. A generic [`Repository`](db::handlers::Repository) implements the CRUD
//! operations for any [`Entity`](db::models::entity::Entity); each write commits the session it
//! runs in.
//!
//! Every request handler runs its database work inside exactly one session:
//!
//! ```text
//! handler ── session_with_commit ──▶ Session ──▶ Repository<User> ──▶ PgPool
//!                                       │
//!                     commit on success, rollback on error or cancellation
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use userdesk::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = userdesk::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     userdesk::telemetry::init_telemetry(config.enable_otel_export, config.log_file.as_ref())?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and, unless `run_migrations` is disabled, applied on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! userdesk::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
mod test_utils;

use crate::config::CorsOrigin;
use crate::db::{handlers::Users, session::SessionManager};
use axum::{
    Router,
    http::{self, HeaderValue, Method},
    routing::get,
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa_rapidoc::RapiDoc;

pub use types::UserId;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `sessions`: Owner of the connection pool; handlers open one session per request
/// - `users`: Repository for the `users` table
/// - `config`: Application configuration loaded from file/environment
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .sessions(Arc::new(SessionManager::with_pool(pool)))
///     .users(Users::new()?)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub users: Users,
    pub config: Config,
}

/// Get the userdesk database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = &config.cors.allowed_origins;

    // A wildcard cannot be mixed into an explicit origin list
    let allow_origin = if origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut values = Vec::with_capacity(origins.len());
        for origin in origins {
            if let CorsOrigin::Url(url) = origin {
                values.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(values)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `/` and `/healthz` status endpoints
/// - User CRUD under `/api_v1`
/// - RapiDoc at `/docs`, the OpenAPI document at `/api-docs/openapi.json`
/// - CORS from configuration
/// - Request tracing
///
/// # Errors
///
/// Returns an error if the CORS configuration holds an origin that is not a valid header value.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route(
            "/users",
            get(api::handlers::users::list_users).post(api::handlers::users::create_user),
        )
        .route(
            "/users/{user_id}",
            get(api::handlers::users::get_user)
                .patch(api::handlers::users::update_user)
                .delete(api::handlers::users::delete_user),
        );

    let router = Router::new()
        .route("/", get(api::handlers::common::root))
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api_v1", api_routes)
        .with_state(state.clone())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", openapi::api_doc(&state.config.app)).path("/docs"));

    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router and the session manager.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] initializes the session manager, runs migrations and
///    builds the repositories and router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish, then the pool
///    is closed and telemetry flushed
pub struct Application {
    router: Router,
    sessions: Arc<SessionManager>,
    config: Config,
}

impl Application {
    /// Create a new application instance, connecting to the configured database.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(host = %config.host, port = config.port, app = %config.app.title, "Starting userdesk");

        let sessions = SessionManager::new();
        sessions.init(&config.database.connection_url()?, &config.database.pool)?;

        Self::with_sessions(config, Arc::new(sessions)).await
    }

    /// Create an application around an existing pool (used by tests and embedders).
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        Self::with_sessions(config, Arc::new(SessionManager::with_pool(pool))).await
    }

    async fn with_sessions(config: Config, sessions: Arc<SessionManager>) -> anyhow::Result<Self> {
        if config.run_migrations {
            info!("Running database migrations...");
            migrator().run(&sessions.pool()?).await?;
        }

        let state = AppState::builder()
            .sessions(sessions.clone())
            .users(Users::new()?)
            .config(config.clone())
            .build();
        let router = build_router(&state)?;

        Ok(Self { router, sessions, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "userdesk listening on http://{}, docs at http://localhost:{}/docs",
            bind_addr,
            listener.local_addr()?.port()
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.sessions.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::CorsConfig;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[sqlx::test]
    #[test_log::test]
    async fn test_application_with_migrations_enabled(pool: PgPool) {
        // Migrations were already applied by sqlx::test; running them again must be a no-op
        let mut config = create_test_config();
        config.run_migrations = true;
        let server = Application::new_with_pool(config, pool)
            .await
            .expect("Failed to create application")
            .into_test_server();

        let response = server
            .post("/api_v1/users")
            .json(&json!({"name": "ivan", "full_name": "Ivan I."}))
            .await;

        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_application_new_rejects_bad_database_url() {
        let mut config = create_test_config();
        config.database.url = Some("not a url".to_string());

        let result = Application::new(config).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_openapi_document_uses_configured_info() {
        let server = create_test_server();

        let response = server.get("/api-docs/openapi.json").await;

        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert_eq!(doc["info"]["title"], "userdesk-test");
        assert_eq!(doc["info"]["version"], "0.0.1-test");
        assert!(doc["paths"]["/api_v1/users"].is_object());
    }

    #[tokio::test]
    async fn test_docs_are_served() {
        let server = create_test_server();

        server.get("/docs").await.assert_status_ok();
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = create_test_config();
        config.cors = CorsConfig {
            allowed_origins: vec![
                CorsOrigin::Url("https://app.example.com".parse().unwrap()),
                CorsOrigin::Url("http://localhost:3000".parse().unwrap()),
            ],
            max_age: Some(600),
        };
        assert!(create_cors_layer(&config).is_ok());

        config.cors.allowed_origins.push(CorsOrigin::Wildcard);
        config.cors.max_age = None;
        assert!(create_cors_layer(&config).is_ok());
    }

    #[tokio::test]
    async fn test_cors_preflight_reports_max_age() {
        let mut config = create_test_config();
        config.cors.max_age = Some(120);
        let server = create_test_server_with_config(config);

        let response = server
            .method(Method::OPTIONS, "/api_v1/users")
            .add_header("origin", "https://app.example.com")
            .add_header("access-control-request-method", "POST")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-max-age"), "120");
        assert_eq!(response.header("access-control-allow-origin"), "*");
    }
}
