//! Renderer lifecycle manager
//!
//! Owns one renderer process per worker, launched lazily on the first run
//! and shared by every run after that. Runs never touch the process
//! directly; each one leases an isolated [`CrawlContext`].
//!
//! # Lifecycle
//! - Process NOT launched on manager creation (lazy initialization)
//! - First `init_process()` launches; concurrent first callers wait on the
//!   same mutex, so exactly one of them performs the launch
//! - A process that fails its liveness check is torn down and relaunched
//! - `shutdown_process()` terminates it; safe when nothing is running

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::context::CrawlContext;
use super::sweep::sweep_by_signature;
use super::traits::{RendererLauncher, RendererProcess};
use crate::crawl_engine::IngestError;

pub struct BrowserSessionManager<L: RendererLauncher> {
    launcher: L,
    process: Mutex<Option<Arc<L::Process>>>,
    launches: AtomicU64,
}

impl<L: RendererLauncher> BrowserSessionManager<L> {
    /// Create a manager. The renderer is NOT launched yet.
    #[must_use]
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            process: Mutex::new(None),
            launches: AtomicU64::new(0),
        }
    }

    /// Return the shared process, launching it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Launch`] if the renderer cannot be started.
    pub async fn init_process(&self) -> Result<Arc<L::Process>, IngestError> {
        let mut guard = self.process.lock().await;

        if let Some(process) = guard.as_ref() {
            if process.is_alive().await {
                debug!("Renderer health check passed, reusing existing process");
                return Ok(Arc::clone(process));
            }

            warn!("Renderer health check failed, relaunching");
            if let Some(dead) = guard.take() {
                terminate(dead.as_ref()).await;
            }
        }

        info!("Launching renderer process");
        let process = self
            .launcher
            .launch()
            .await
            .map_err(|e| IngestError::Launch(format!("{e:#}")))?;

        let launches = self.launches.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Renderer process ready (launch #{launches})");

        let process = Arc::new(process);
        *guard = Some(Arc::clone(&process));
        Ok(process)
    }

    /// Lease a fresh isolated context with a single page.
    ///
    /// If the page cannot be opened, the half-created context is closed
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// [`IngestError::Launch`] when the process cannot be started,
    /// [`IngestError::Context`] when the context or page cannot be created.
    pub async fn create_context(&self) -> Result<CrawlContext<L::Process>, IngestError> {
        let process = self.init_process().await?;

        let context_id = process
            .open_context()
            .await
            .map_err(|e| IngestError::Context(format!("{e:#}")))?;

        match process.open_page(&context_id).await {
            Ok(page) => {
                debug!("Opened browsing context {context_id:?}");
                Ok(CrawlContext::new(process, context_id, page))
            }
            Err(e) => {
                if let Err(close_err) = process.close_context(&context_id).await {
                    warn!("Failed to close context after page error: {close_err:#}");
                }
                Err(IngestError::Context(format!("{e:#}")))
            }
        }
    }

    /// Release a leased context. Never fails; already-closed contexts are a no-op.
    pub async fn close_context(&self, context: &mut CrawlContext<L::Process>) {
        context.close().await;
    }

    /// Terminate the shared process if one is running.
    ///
    /// Termination goes through the process handle first. Only if that fails
    /// are leftover processes swept by their command-line signature.
    pub async fn shutdown_process(&self) {
        let mut guard = self.process.lock().await;
        match guard.take() {
            Some(process) => {
                info!("Shutting down renderer process");
                terminate(process.as_ref()).await;
            }
            None => debug!("Shutdown requested with no renderer running"),
        }
    }

    /// Whether a process has been launched and not shut down.
    pub async fn is_running(&self) -> bool {
        self.process.lock().await.is_some()
    }

    /// Number of launches performed over the manager's lifetime.
    #[must_use]
    pub fn launch_count(&self) -> u64 {
        self.launches.load(Ordering::SeqCst)
    }
}

async fn terminate<P: RendererProcess>(process: &P) {
    let Err(e) = process.terminate().await else {
        return;
    };

    warn!("Renderer did not terminate cleanly: {e:#}");
    let Some(signature) = process.signature() else {
        return;
    };

    match tokio::task::spawn_blocking(move || sweep_by_signature(&signature)).await {
        Ok(Ok(killed)) if killed > 0 => info!("Signature sweep killed {killed} processes"),
        Ok(Ok(_)) => debug!("Signature sweep found nothing to kill"),
        Ok(Err(e)) => warn!("Signature sweep failed: {e:#}"),
        Err(e) => warn!("Signature sweep task failed: {e}"),
    }
}
