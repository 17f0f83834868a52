//! Server entry point
//!
//! - Loads environment configuration
//! - Opens the rule database
//! - Serves the HTTP API with graceful shutdown support

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rulehub::config::Config;
use rulehub::database::AppState;
use rulehub::repository::Catalog;
use rulehub::route::create_app;

/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
/// - `RUST_LOG` - Log filter (default: "rulehub=debug,tower_http=debug")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rulehub=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let catalog = Catalog::open(&config.database_url)
        .with_context(|| format!("failed to open database at {}", config.database_url))?;
    let state = AppState { catalog };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(port = config.port, database = %config.database_url, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM
///
/// In-flight requests finish and the database handle is dropped before the
/// process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    info!("shutdown signal received, stopping server");
}
