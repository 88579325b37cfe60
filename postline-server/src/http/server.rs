//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use postline_core::PostlineConfig;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rate_limit::RateLimiter;
use super::routes;
use crate::auth::TokenService;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
        }
    }
}

impl From<&PostlineConfig> for ServerConfig {
    fn from(config: &PostlineConfig) -> Self {
        Self {
            bind_addr: config.server.bind,
            cors_permissive: config.server.cors_permissive,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenService,
    pub limiter: RateLimiter,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(pool: PgPool, config: &PostlineConfig) -> Self {
        Self {
            pool,
            tokens: TokenService::new(&config.auth),
            limiter: RateLimiter::new(
                Duration::from_secs(config.rate_limit.window_secs),
                config.rate_limit.requests,
            ),
            bcrypt_cost: config.auth.bcrypt_cost,
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let cors = if cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        // Localhost only
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:8000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:8000"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::posts::router(state.clone()));

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn run_server(pool: PgPool, config: &PostlineConfig) -> Result<(), ServerError> {
    let server = ServerConfig::from(config);
    let state = Arc::new(AppState::new(pool, config));

    tracing::info!(
        requests = config.rate_limit.requests,
        window_secs = config.rate_limit.window_secs,
        "rate limiting public reads"
    );
    let sweeper = tokio::spawn(sweep_limiter(state.limiter.clone()));

    let app = build_router(state, server.cors_permissive);

    let listener = TcpListener::bind(server.bind_addr).await?;
    tracing::info!("Server listening on {}", server.bind_addr);

    // Run with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop idle rate-limit buckets.
async fn sweep_limiter(limiter: RateLimiter) {
    let mut ticker = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
    loop {
        ticker.tick().await;
        let dropped = limiter.sweep();
        if dropped > 0 {
            tracing::debug!(dropped, "swept idle rate-limit buckets");
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn config_from_postline_config() {
        let mut config = PostlineConfig::default();
        config.server.cors_permissive = true;
        config.server.bind = SocketAddr::from(([0, 0, 0, 0], 9999));

        let server = ServerConfig::from(&config);
        assert_eq!(server.bind_addr.port(), 9999);
        assert!(server.cors_permissive);
    }
}
