//! # Feedtrack API Server
//!
//! Role-based feedback tracking: managers give structured feedback and build
//! custom forms for their team; employees read and acknowledge feedback.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/feedtrack \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p feedtrack-api
//! ```

use anyhow::Context;
use feedtrack_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use feedtrack_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "feedtrack_api=debug,feedtrack_shared=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    tracing::info!("Feedtrack API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    migrations::ensure_database_exists(&config.database.url)
        .await
        .context("Failed to create database")?;

    let db = pool::create_pool(pool::DatabaseConfig {
        max_connections: config.database.max_connections,
        ..pool::DatabaseConfig::new(config.database.url.clone())
    })
    .await
    .context("Failed to connect to database")?;

    migrations::run_migrations(&db)
        .await
        .context("Failed to run migrations")?;

    let status = migrations::get_migration_status(&db).await?;
    tracing::info!(
        applied = status.applied_migrations,
        latest = ?status.latest_version,
        up_to_date = status.is_up_to_date,
        "Database schema ready"
    );

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool::close_pool(db).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Waits for `signal`; a listener that fails to install never resolves, so
/// the other listener stays in charge of shutdown
async fn listen<E: std::fmt::Display>(
    signal: impl std::future::Future<Output = Result<(), E>>,
    name: &str,
) {
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for {}", name);
        std::future::pending::<()>().await;
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = listen(tokio::signal::ctrl_c(), "Ctrl-C");

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
