// Single-run ingestion worker.
//
// Launches the renderer, crawls the configured catalog once, stores the
// listings in SQLite and prints the run report as JSON. Ctrl-C cancels the
// crawl between pages; the renderer is shut down on every exit path.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use realty_ingest::{
    BrowserSessionManager, ChromiumLauncher, IngestConfig, IngestError, IngestOrchestrator,
    LogProgress, SqliteListingStore,
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config =
        IngestConfig::from_env().map_err(|e| IngestError::Config(format!("{e:#}")))?;
    info!(
        "Ingesting {} into {}",
        config.base_url(),
        config.database_path().display()
    );

    let store = SqliteListingStore::open(config.database_path())
        .await
        .map_err(|e| IngestError::Storage(format!("{e:#}")))?;
    let store = Arc::new(store);
    let sessions = Arc::new(BrowserSessionManager::new(ChromiumLauncher::from_config(
        &config,
    )));
    let orchestrator = IngestOrchestrator::new(config, Arc::clone(&sessions), Arc::clone(&store));

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling after the current page");
                cancel.cancel();
            }
        })
    };

    let result = orchestrator.run_once_with(&LogProgress, cancel).await;

    ctrl_c.abort();
    sessions.shutdown_process().await;
    store.close().await;

    match result {
        Ok(report) => {
            let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            error!("Ingest run failed: {e}");
            Err(e.into())
        }
    }
}
