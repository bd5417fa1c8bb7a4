//! chromiumoxide-backed renderer
//!
//! One Chromium process per worker. Each crawl run gets a CDP browser
//! context (`Target.createBrowserContext`), which isolates cookies and
//! storage without paying for a new process.

use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::storage::ClearCookiesParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use parking_lot::Mutex;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::traits::{CatalogPage, RendererLauncher, RendererProcess};
use crate::browser_profile::{create_unique_profile_with_prefix, remove_profile_dir};
use crate::browser_setup::{LaunchOptions, launch_browser};
use crate::config::{BlockedResource, IngestConfig};
use crate::utils::constants::{PROFILE_PREFIX, WINDOW_HEIGHT, WINDOW_WIDTH};

fn resource_type(resource: BlockedResource) -> ResourceType {
    match resource {
        BlockedResource::Image => ResourceType::Image,
        BlockedResource::Media => ResourceType::Media,
        BlockedResource::Font => ResourceType::Font,
        BlockedResource::Stylesheet => ResourceType::Stylesheet,
    }
}

/// Launches Chromium with a fresh profile directory.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    chrome_executable: Option<PathBuf>,
    blocked: Vec<BlockedResource>,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            headless: config.headless(),
            chrome_executable: config.chrome_executable().cloned(),
            blocked: config.blocked_resources().to_vec(),
        }
    }
}

impl RendererLauncher for ChromiumLauncher {
    type Process = ChromiumRenderer;

    async fn launch(&self) -> Result<ChromiumRenderer> {
        let profile = create_unique_profile_with_prefix(PROFILE_PREFIX)?;
        let options = LaunchOptions {
            headless: self.headless,
            chrome_executable: self.chrome_executable.clone(),
            user_data_dir: profile.path().to_path_buf(),
        };

        // On failure `profile` drops here and removes the directory
        let (browser, handler) = launch_browser(&options).await?;

        Ok(ChromiumRenderer {
            browser: RwLock::new(browser),
            handler: Mutex::new(Some(handler)),
            profile_dir: profile.into_path(),
            blocked: self.blocked.iter().copied().map(resource_type).collect(),
        })
    }
}

/// A running Chromium process and the task driving its CDP connection.
pub struct ChromiumRenderer {
    browser: RwLock<Browser>,
    handler: Mutex<Option<JoinHandle<()>>>,
    profile_dir: PathBuf,
    blocked: Vec<ResourceType>,
}

impl RendererProcess for ChromiumRenderer {
    type ContextId = BrowserContextId;
    type Page = ChromiumPage;

    async fn open_context(&self) -> Result<BrowserContextId> {
        let browser = self.browser.read().await;
        let response = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browser context")?;
        Ok(response.result.browser_context_id)
    }

    async fn open_page(&self, context: &BrowserContextId) -> Result<ChromiumPage> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(anyhow::Error::msg)?;

        let page = {
            let browser = self.browser.read().await;
            browser
                .new_page(params)
                .await
                .context("Failed to open page in browser context")?
        };

        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(WINDOW_WIDTH))
                .height(i64::from(WINDOW_HEIGHT))
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(anyhow::Error::msg)?,
        )
        .await
        .context("Failed to set viewport")?;

        // A page without the filter still renders correctly, only slower
        let filter = match install_resource_filter(&page, &self.blocked).await {
            Ok(task) => task,
            Err(e) => {
                warn!("Resource filter not installed, continuing without it: {e:#}");
                None
            }
        };

        Ok(ChromiumPage {
            page,
            filter: Mutex::new(filter),
        })
    }

    async fn clear_cookies(&self, context: &BrowserContextId) -> Result<()> {
        let browser = self.browser.read().await;
        browser
            .execute(
                ClearCookiesParams::builder()
                    .browser_context_id(context.clone())
                    .build(),
            )
            .await
            .context("Failed to clear cookies")?;
        Ok(())
    }

    async fn close_context(&self, context: &BrowserContextId) -> Result<()> {
        let browser = self.browser.read().await;
        browser
            .execute(DisposeBrowserContextParams::new(context.clone()))
            .await
            .context("Failed to dispose browser context")?;
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.browser.read().await.version().await.is_ok()
    }

    async fn terminate(&self) -> Result<()> {
        let mut errors = Vec::new();
        {
            let mut browser = self.browser.write().await;

            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {e}");
                match browser.kill().await {
                    Some(Err(kill_err)) => errors.push(format!("close: {e}; kill: {kill_err}")),
                    Some(Ok(())) => info!("Browser process killed after failed close"),
                    None => errors.push(format!("close: {e}; no child process handle")),
                }
            }

            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {e}");
            }
        }

        if let Some(handler) = self.handler.lock().take() {
            handler.abort();
        }

        if let Err(e) = remove_profile_dir(&self.profile_dir) {
            warn!("{e:#}");
        }

        if errors.is_empty() {
            debug!("Browser terminated");
            Ok(())
        } else {
            Err(anyhow!(errors.join("; ")))
        }
    }

    fn signature(&self) -> Option<String> {
        Some(self.profile_dir.to_string_lossy().into_owned())
    }
}

/// Pause requests for blocked resource types and fail them on the spot.
///
/// Returns the task answering paused requests, or `None` when nothing is blocked.
async fn install_resource_filter(
    page: &Page,
    blocked: &[ResourceType],
) -> Result<Option<JoinHandle<()>>> {
    if blocked.is_empty() {
        return Ok(None);
    }

    let patterns: Vec<RequestPattern> = blocked
        .iter()
        .map(|resource| {
            RequestPattern::builder()
                .url_pattern("*")
                .resource_type(resource.clone())
                .request_stage(RequestStage::Request)
                .build()
        })
        .collect();

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to subscribe to paused requests")?;

    page.execute(EnableParams::builder().patterns(patterns).build())
        .await
        .context("Failed to enable request interception")?;

    let page = page.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(e) = page.execute(fail).await {
                // The page may be closing; nothing left to block
                trace!("Failed to abort blocked request: {e}");
            }
        }
    });

    Ok(Some(task))
}

/// A page inside one browser context.
pub struct ChromiumPage {
    page: Page,
    filter: Mutex<Option<JoinHandle<()>>>,
}

impl CatalogPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read page content")
    }

    async fn close(&self) -> Result<()> {
        if let Some(filter) = self.filter.lock().take() {
            filter.abort();
        }
        self.page
            .clone()
            .close()
            .await
            .context("Failed to close page")
    }
}
