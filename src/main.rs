//! ParkHub server: parking reservations, gate entry/exit and live
//! occupancy notifications.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use parkhub_api::{AppState, build_app};
use parkhub_core::config::{AppConfig, DatabaseConfig, StorageBackend};
use parkhub_core::error::AppError;
use parkhub_core::traits::{EventPublisher, SystemClock};
use parkhub_database::{DatabasePool, MemoryStore, Repositories};
use parkhub_realtime::NotificationHub;
use parkhub_service::{ReservationService, ServiceContext};
use parkhub_worker::ReconciliationScheduler;

/// ParkHub server.
#[derive(Debug, Parser)]
#[command(name = "parkhub-server", version, about = "ParkHub parking occupancy server")]
struct Cli {
    /// Configuration overlay to load from `config/{env}.toml`.
    /// Falls back to `PARKHUB_ENV`, then `development`.
    #[arg(long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP and WebSocket API (default).
    Serve,
    /// Run one cancellation and activation pass, then exit.
    Reconcile,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env = cli
        .env
        .or_else(|| std::env::var("PARKHUB_ENV").ok())
        .unwrap_or_else(|| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Reconcile => reconcile(config).await,
    };

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Repositories plus the pool behind them, if any.
struct Storage {
    repos: Repositories,
    pool: Option<DatabasePool>,
}

impl Storage {
    async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        match config.backend {
            StorageBackend::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                Ok(Self {
                    repos: Repositories::postgres(pool.pool().clone()),
                    pool: Some(pool),
                })
            }
            StorageBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                let spots = store.seed_spots(config.memory_spots).await;
                tracing::warn!(
                    spots = spots.len(),
                    "Using in-memory storage; nothing survives a restart"
                );
                Ok(Self {
                    repos: Repositories::memory(store),
                    pool: None,
                })
            }
        }
    }

    async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}

fn service_context(
    config: &AppConfig,
    repos: Repositories,
    publisher: Option<Arc<dyn EventPublisher>>,
) -> ServiceContext {
    ServiceContext::new(
        repos,
        Arc::new(SystemClock),
        publisher,
        config.allocation.clone(),
        config.scheduler.clone(),
    )
}

/// Main server run function
async fn serve(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ParkHub v{}", env!("CARGO_PKG_VERSION"));

    let storage = Storage::open(&config.database).await?;
    let hub = NotificationHub::start(&config.realtime);
    let ctx = service_context(&config, storage.repos.clone(), Some(Arc::new(hub.clone())));

    let scheduler =
        ReconciliationScheduler::new(ReservationService::new(ctx.clone()), &config.scheduler);
    if config.scheduler.enabled {
        scheduler.start().await;
    } else {
        tracing::info!("Reconciliation scheduler disabled");
    }

    let state = AppState::new(Arc::new(config.clone()), hub.clone(), ctx);
    let app = build_app(state, &config.server.cors);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("ParkHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Shutting down");
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, scheduler.stop()).await.is_err() {
        tracing::warn!(
            grace_secs = grace.as_secs(),
            "Reconciliation passes still running at shutdown"
        );
    }
    hub.shutdown();
    storage.close().await;

    Ok(())
}

/// One reconciliation pass without the HTTP server.
async fn reconcile(config: AppConfig) -> Result<(), AppError> {
    let storage = Storage::open(&config.database).await?;
    let ctx = service_context(&config, storage.repos.clone(), None);
    let scheduler = ReconciliationScheduler::new(ReservationService::new(ctx), &config.scheduler);

    for report in scheduler.run_once().await {
        tracing::info!(
            job = report.job,
            examined = report.examined,
            changed = report.changed,
            "Reconciliation pass finished"
        );
    }

    storage.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
