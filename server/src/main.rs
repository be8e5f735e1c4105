//! ocrbatch server
//!
//! Serves the upload form, runs OCR batches and hands out exports plus the
//! admin audit log.

use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;

use ocrbatch::Database;
use ocrbatch_server::error::StartupError;
use ocrbatch_server::settings;
use ocrbatch_server::state::AppState;

const DEFAULT_FILTER: &str = "ocrbatch=info,ocrbatch_server=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let config = settings::load_from_env()?;

    tracing::info!("Starting ocrbatch server v{}", env!("CARGO_PKG_VERSION"));

    for dir in [
        &config.storage.upload_dir,
        &config.storage.processed_dir,
        &config.storage.static_dir,
    ] {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::create_dir_all(config.storage.preview_root())?;

    let db = Database::open(&config.storage.database_path)?;
    tracing::info!(
        "Audit database at {}",
        ocrbatch::sanitize::redact_path(&config.storage.database_path)
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let app = ocrbatch_server::app(AppState::with_defaults(config, db.clone()));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = db.close() {
        tracing::warn!("Database not closed cleanly: {}", e);
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the fmt subscriber and routes `log` records into it.
fn init_tracing() -> Result<(), StartupError> {
    tracing_log::LogTracer::init().map_err(|e| StartupError::Logger(e.to_string()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| StartupError::Logger(e.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
