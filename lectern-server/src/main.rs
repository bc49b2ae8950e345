use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_pipeline::events::{EventPublisher, NullPublisher};
use lectern_pipeline::lifecycle::ResourceLifecycle;
use lectern_pipeline::orchestrator::PipelineOrchestrator;
use lectern_pipeline::registry::RunRegistry;

pub mod api;
pub mod config;
pub mod db;
pub mod events;
pub mod providers;
pub mod repository;
pub mod service;
pub mod store;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lectern server...");

    let config = config::Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    tracing::info!("Connecting to database...");

    // Create database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Database connection pool created");

    // Run migrations
    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Wire the pipeline engine: Postgres store, HTTP providers, event bus
    let store = Arc::new(store::PgStore::new(pool.clone()));
    let client = reqwest::Client::new();
    let provider_registry = providers::build_registry(&client, &config.ai_service_url);

    let publisher: Arc<dyn EventPublisher> = match &config.event_bus_url {
        Some(url) => Arc::new(events::HttpEventPublisher::new(client.clone(), url)),
        None => {
            tracing::warn!("EVENT_BUS_URL not set, lifecycle events will be dropped");
            Arc::new(NullPublisher)
        }
    };

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        store.clone(),
        publisher,
        provider_registry,
    ));
    let registry = Arc::new(RunRegistry::with_timeout(
        store,
        orchestrator,
        config.run_timeout,
    ));

    // Shutdown path: cancel outstanding runs, then release the pool
    let lifecycle = Arc::new(ResourceLifecycle::new(registry.clone()));
    lifecycle.register(Arc::new(db::PgPoolHandle::new(pool.clone())));

    // Build router with all API endpoints
    let app = api::create_router(api::AppState {
        pool,
        registry,
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(lifecycle))
        .await
        .expect("Failed to start server");
}

/// Resolves on SIGINT/SIGTERM after the resource lifecycle has torn down
async fn shutdown_signal(lifecycle: Arc<ResourceLifecycle>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
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

    tracing::info!("Shutdown signal received, releasing resources");
    lifecycle.shutdown().await;
}
