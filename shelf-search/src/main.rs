//! shelf-search - OpenLibrary author search with local synchronization
//!
//! Serves `GET /api/v1/authors/search` and `GET /health`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shelf_common::config::{
    load_toml_config, resolve_config_path, Config, ConfigOverrides, ConfigSource,
};
use shelf_common::db::init_database;
use shelf_common::logging::init_tracing;
use shelf_search::db::SqliteAuthorStore;
use shelf_search::services::{AuthorSearchService, OpenLibraryClient};
use shelf_search::{build_router, AppState, MODULE_NAME};
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for shelf-search
#[derive(Parser, Debug)]
#[command(name = "shelf-search")]
#[command(about = "Author search service with local OpenLibrary sync")]
#[command(version)]
struct Args {
    /// Bootstrap TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SHELF_DATABASE")]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SHELF_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SHELF_PORT")]
    port: Option<u16>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "SHELF_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Source is logged after init_tracing
    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let config_source = ConfigSource::of(config_path.as_deref());
    let toml_config = load_toml_config(config_path.as_deref())
        .context("Failed to load configuration")?;
    let config = Config::resolve(
        toml_config,
        ConfigOverrides {
            database_path: args.database,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        },
    );

    init_tracing(&config.log_level);

    info!(
        "Starting shelf-search v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    info!("Database path: {}", config.database_path.display());
    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let client = OpenLibraryClient::new(&config.openlibrary)
        .context("Failed to create OpenLibrary client")?;
    info!(
        "OpenLibrary endpoint: {} (timeout {} ms)",
        config.openlibrary.base_url, config.openlibrary.timeout_ms
    );
    info!(
        "Sync policy: version={:?}, on failure={:?}",
        config.sync.version_policy, config.sync.failure_policy
    );

    let search = AuthorSearchService::new(
        Arc::new(client),
        Arc::new(SqliteAuthorStore::new(pool)),
        &config.sync,
    );
    let app = build_router(AppState::new(search));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
