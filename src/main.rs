//! Chatgate Server
//!
//! Serves password signup/login, issues session tokens, and gates the
//! real-time channel on those tokens.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use chatgate_server::auth::{AuthService, PasswordHasher, PgUserStore, TokenIssuer};
use chatgate_server::config::Config;
use chatgate_server::routes::{self, CHANNEL_PATH};
use chatgate_server::state::AppState;
use chatgate_server::websocket::ChannelRegistry;
use chatgate_server::middleware;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        "Starting chatgate server"
    );

    let store = PgUserStore::connect(&config)
        .await
        .context("Failed to connect to the credential store")?;
    store
        .migrate()
        .await
        .context("Failed to migrate the credential store")?;

    let auth_service = Arc::new(AuthService::new(
        Arc::new(store),
        PasswordHasher::new(config.bcrypt_rounds),
        TokenIssuer::new(config.auth_token_bytes),
    ));

    let app_state = AppState::new(auth_service, ChannelRegistry::new());

    let mut app = routes::api_router(app_state)
        .fallback_service(ServeDir::new(&config.assets_dir))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let ip = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("HOST must be an IP address, got '{}'", config.host))?;
    let addr = SocketAddr::new(ip, config.port);

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Channel available at ws://{}{}", addr, CHANNEL_PATH);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
