//! Vitrine Kernel
//!
//! HTTP server for the image gallery and translation editor.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use vitrine_kernel::session::{self, SessionSettings};
use vitrine_kernel::{AppState, Config, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Vitrine kernel");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, "Configuration loaded");

    // Object store, templates, and translations are ready before we listen.
    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!(
        languages = state.translations().loaded_count(),
        "Translations loaded"
    );

    let settings = SessionSettings::new(&config.session_secret, config.cookie_secure);
    let app = routes::app(state);

    // Middleware layers (last added = first executed in request flow):
    // TraceLayer → session → routes
    let app = match &config.redis_url {
        Some(redis_url) => session::with_redis_sessions(app, redis_url, &settings)
            .await
            .context("failed to create session layer")?,
        None => session::with_memory_sessions(app, &settings),
    };
    let app = app.layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,aws=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
