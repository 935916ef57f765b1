//! Rehydrate demo entry point.

use std::process::ExitCode;
use std::sync::Arc;

use rehydrate_catalog::application::store::CatalogStore;
use rehydrate_core::clock::SystemClock;
use rehydrate_core::log::EventLog;
use rehydrate_event_store::in_memory_event_log::InMemoryEventLog;
use rehydrate_event_store::pg_event_log::PgEventLog;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::DemoConfig;
use crate::error::AppError;

mod config;
mod error;
mod scenario;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "demo failed");
            err.exit_code()
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = DemoConfig::from_env()?;
    tracing::info!(
        durable = config.database_url.is_some(),
        max_commit_attempts = config.max_commit_attempts,
        race_writers = config.race_writers,
        "Starting Rehydrate demo"
    );

    let log = open_log(&config).await?;
    let store = Arc::new(CatalogStore::new(log).with_max_attempts(config.max_commit_attempts));

    // Ctrl-C cancels whatever log call is in flight.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let (view, summary) =
        scenario::run(store, Arc::new(SystemClock), config.race_writers, &cancel).await?;

    tracing::info!(
        committed = summary.committed,
        conflicted = summary.conflicted,
        ?view,
        "demo finished"
    );
    Ok(())
}

async fn open_log(config: &DemoConfig) -> Result<Arc<dyn EventLog>, AppError> {
    let Some(database_url) = &config.database_url else {
        tracing::info!("DATABASE_URL not set, using the in-memory event log");
        return Ok(Arc::new(InMemoryEventLog::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.pg_max_connections)
        .connect(database_url)
        .await?;
    let log = PgEventLog::new(pool);
    log.ensure_schema().await?;
    tracing::info!("using the PostgreSQL event log");
    Ok(Arc::new(log))
}
