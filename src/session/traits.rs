//! Seams between the session manager and a concrete renderer.
//!
//! The chromiumoxide-backed implementation lives in [`super::chromium`];
//! tests drive the same lifecycle with scripted in-memory renderers.

use anyhow::Result;
use std::fmt::Debug;
use std::future::Future;

/// A page inside an isolated browsing context.
pub trait CatalogPage: Send + Sync + 'static {
    /// Navigate to `url` and wait for the load to finish.
    ///
    /// No timeout is applied here; callers bound it.
    fn goto(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// Serialized DOM of the current document.
    fn content(&self) -> impl Future<Output = Result<String>> + Send;

    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// A running renderer process able to host isolated browsing contexts.
pub trait RendererProcess: Send + Sync + 'static {
    type ContextId: Clone + Debug + Send + Sync + 'static;
    type Page: CatalogPage;

    /// Create a fresh context with its own cookies and storage.
    fn open_context(&self) -> impl Future<Output = Result<Self::ContextId>> + Send;

    /// Open a page in `context` with the heavy-subresource filter installed.
    fn open_page(&self, context: &Self::ContextId)
    -> impl Future<Output = Result<Self::Page>> + Send;

    fn clear_cookies(&self, context: &Self::ContextId) -> impl Future<Output = Result<()>> + Send;

    fn close_context(&self, context: &Self::ContextId) -> impl Future<Output = Result<()>> + Send;

    /// Cheap liveness check.
    fn is_alive(&self) -> impl Future<Output = bool> + Send;

    /// Terminate the process through its handle.
    fn terminate(&self) -> impl Future<Output = Result<()>> + Send;

    /// Command-line fragment unique to this process and its helpers, if any.
    fn signature(&self) -> Option<String>;
}

/// Starts renderer processes.
pub trait RendererLauncher: Send + Sync + 'static {
    type Process: RendererProcess;

    fn launch(&self) -> impl Future<Output = Result<Self::Process>> + Send;
}
