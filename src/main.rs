//! OxiBin - Recycle bin service
//!
//! Soft-delete subsystem for heterogeneous business documents: a delete
//! moves the document into the bin, from where it can be restored to its
//! original identity until the retention window closes and the expiry
//! scheduler purges it for good.
//!
//! The architecture follows the Clean/Hexagonal Architecture pattern with:
//!
//! - Domain Layer: entries, snapshots and repository interfaces (domain/*)
//! - Application Layer: BinManager, collection adapters and ports (application/*)
//! - Infrastructure Layer: JSON/PostgreSQL stores, JWT gate, scheduler (infrastructure/*)
//! - Interface Layer: API endpoints (interfaces/*)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oxibin::common::config::AppConfig;
use oxibin::common::db::create_database_pool;
use oxibin::common::di::{AppServiceFactory, AppState};
use oxibin::interfaces::create_api_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = AppConfig::from_env();

    // Set up storage directory
    let storage_path = config.storage_path.clone();
    if !storage_path.exists() {
        std::fs::create_dir_all(&storage_path)?;
    }

    // Initialize database if the PostgreSQL store is enabled
    let db_pool = if config.features.enable_postgres {
        let pool = create_database_pool(&config).await?;
        tracing::info!("PostgreSQL database pool initialized successfully");
        Some(Arc::new(pool))
    } else {
        None
    };

    let factory = AppServiceFactory::new(config.clone());
    let repos = factory.create_repository_services(db_pool);
    let services = factory.create_bin_services(&repos)?;

    tracing::info!(
        "Papelera configurada: retención de {} días, purga cada {:?}",
        config.bin.retention_days,
        config.bin.cleanup_interval()
    );
    services.scheduler.start();

    let app = Router::new()
        .nest("/api", create_api_routes(AppState::new(&services)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Starting OxiBin server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    services.scheduler.shutdown().await;
    tracing::info!("Server shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
