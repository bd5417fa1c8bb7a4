//! Scoped browsing context leased to one crawl run.

use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{CatalogPage, RendererProcess};

/// An isolated browsing context plus its single page.
///
/// Release with [`CrawlContext::close`]. Closing is idempotent. A context
/// dropped while still open is released on a spawned task, so an abandoned
/// run never leaks its context.
pub struct CrawlContext<R: RendererProcess> {
    process: Arc<R>,
    context_id: Option<R::ContextId>,
    page: Option<R::Page>,
}

impl<R: RendererProcess> CrawlContext<R> {
    pub(crate) fn new(process: Arc<R>, context_id: R::ContextId, page: R::Page) -> Self {
        Self {
            process,
            context_id: Some(context_id),
            page: Some(page),
        }
    }

    /// The context's page, or `None` once the context has been closed.
    #[must_use]
    pub fn page(&self) -> Option<&R::Page> {
        self.page.as_ref()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.context_id.is_some()
    }

    /// Close the page, clear cookies and dispose of the context.
    ///
    /// Every step is best-effort; failures are logged and never surface.
    pub async fn close(&mut self) {
        let page = self.page.take();
        let context_id = self.context_id.take();
        release(self.process.as_ref(), page, context_id).await;
    }
}

impl<R: RendererProcess> Drop for CrawlContext<R> {
    fn drop(&mut self) {
        if self.context_id.is_none() && self.page.is_none() {
            return;
        }

        let page = self.page.take();
        let context_id = self.context_id.take();
        let process = Arc::clone(&self.process);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("Browsing context dropped while open; releasing in background");
                handle.spawn(async move {
                    release(process.as_ref(), page, context_id).await;
                });
            }
            Err(_) => {
                warn!("Browsing context dropped outside a runtime; it stays open until shutdown");
            }
        }
    }
}

async fn release<R: RendererProcess>(
    process: &R,
    page: Option<R::Page>,
    context_id: Option<R::ContextId>,
) {
    if let Some(page) = page
        && let Err(e) = page.close().await
    {
        debug!("Page close failed (context disposal will reclaim it): {e:#}");
    }

    let Some(context_id) = context_id else {
        return;
    };

    if let Err(e) = process.clear_cookies(&context_id).await {
        debug!("Failed to clear cookies for context {context_id:?}: {e:#}");
    }

    match process.close_context(&context_id).await {
        Ok(()) => debug!("Closed browsing context {context_id:?}"),
        Err(e) => warn!("Failed to close browsing context {context_id:?}: {e:#}"),
    }
}
