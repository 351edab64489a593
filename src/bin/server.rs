//! Cafebook Server
//!
//! Serves the cafe document over HTTP so several tills (or the CLI with
//! `server_url` set) can share one store.
//!
//! # Configuration
//!
//! Read the same way as the CLI: environment variables override the config
//! file, which overrides defaults.
//!
//! - `CAFEBOOK_PORT`: Port to listen on (default: 9002)
//! - `CAFEBOOK_STORAGE`: `json` or `sqlite` (default: json)
//! - `CAFEBOOK_DATA_PATH`: Document location (default: ~/.local/share/cafebook/db.json)
//! - `CAFEBOOK_CONFIG`: Path to config file (default: ~/.config/cafebook/config.yaml)
//!
//! See [`cafebook::api`] for the endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cafebook::api;
use cafebook::config::Config;
use cafebook::repo::{open_repository, Repository};
use cafebook::service::CafeService;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cafebook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }
    tracing::info!(
        "Storage: {} at {}",
        config.storage.value,
        config.data_path.value.display()
    );

    let repo = match open_repository(config.storage.value, config.data_path.value.clone()).await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    // Refuse to start on a corrupt document
    if let Err(e) = repo.read().await {
        tracing::error!("Failed to read document: {}", e);
        std::process::exit(1);
    }

    let service = Arc::new(CafeService::new(repo));
    let app = api::router(service);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
