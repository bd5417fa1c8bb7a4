//! Test utilities for the realty_ingest test suite
//!
//! A scripted in-memory renderer that implements the session traits, plus
//! builders for catalog page HTML in the site's card layout.

#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use realty_ingest::crawl_engine::page_url;
use realty_ingest::{CatalogPage, IngestConfig, RendererLauncher, RendererProcess};

pub const BASE_URL: &str = "https://catalog.test/sale/almaty/?sort_by=price-asc";

// =============================================================================
// HTML fixtures
// =============================================================================

/// One listing card; `None` omits the element entirely.
#[derive(Debug, Clone, Default)]
pub struct Card {
    pub title: Option<String>,
    pub price: Option<String>,
    pub subtitle: Option<String>,
    pub views: Option<String>,
    pub owner: Option<String>,
}

impl Card {
    pub fn new(title: &str, price: &str, subtitle: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            price: Some(price.to_string()),
            subtitle: Some(subtitle.to_string()),
            views: None,
            owner: None,
        }
    }

    pub fn views(mut self, views: &str) -> Self {
        self.views = Some(views.to_string());
        self
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn without_price(mut self) -> Self {
        self.price = None;
        self
    }

    fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="a-card a-storage-live"><div class="a-card__inc">"#);
        if let Some(title) = &self.title {
            html.push_str(&format!(
                r#"<div class="a-card__header"><a class="a-card__title" href="/a/show/1">{title}</a></div>"#
            ));
        }
        if let Some(price) = &self.price {
            html.push_str(&format!(r#"<div class="a-card__price">{price}</div>"#));
        }
        if let Some(subtitle) = &self.subtitle {
            html.push_str(&format!(r#"<div class="a-card__subtitle">{subtitle}</div>"#));
        }
        if let Some(owner) = &self.owner {
            html.push_str(&format!(r#"<div class="a-card__owner-label">{owner}</div>"#));
        }
        if let Some(views) = &self.views {
            html.push_str(&format!(
                r#"<div class="a-card__stats"><span class="a-view-count status-item">{views}</span></div>"#
            ));
        }
        html.push_str("</div></div>");
        html
    }
}

/// A catalog page with the given cards and a paginator advertising `max_page`.
pub fn catalog_page(cards: &[Card], max_page: u32) -> String {
    let cards: String = cards.iter().map(Card::to_html).collect();
    let paginator: String = if max_page > 1 {
        let buttons: String = (1..=max_page)
            .map(|n| format!(r#"<a class="paginator__btn" data-page="{n}">{n}</a>"#))
            .chain(std::iter::once(
                r#"<a class="paginator__btn paginator__btn--next">Дальше</a>"#.to_string(),
            ))
            .collect();
        format!(r#"<nav class="paginator">{buttons}</nav>"#)
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head><meta charset="UTF-8"><title>Продажа квартир</title></head>
<body>
<main>
  <section class="a-search-container main-cols-container">
    <div>
      <section class="a-list a-search-list a-list-with-favs">{cards}</section>
      {paginator}
    </div>
  </section>
</main>
</body>
</html>"#
    )
}

/// A page whose results container has been renamed.
pub fn page_without_container() -> String {
    r#"<html><body><main><section class="results-v2"><div class="a-card">
        <div class="a-card__title">2-комнатная · 54 м²</div>
    </div></section></main></body></html>"#
        .to_string()
}

// =============================================================================
// Scripted renderer
// =============================================================================

/// URL → HTML mapping plus scripted misbehavior.
#[derive(Default)]
pub struct CatalogScript {
    pages: HashMap<String, String>,
    hang: HashSet<String>,
    failures: Mutex<HashMap<String, u32>>,
}

impl CatalogScript {
    /// Script a catalog at `base`: the base URL itself serves page 1, and
    /// `page_url(base, n)` serves page n.
    pub fn catalog(base: &str, pages: Vec<String>) -> Self {
        let mut script = Self::default();
        for (i, html) in pages.into_iter().enumerate() {
            let number = u32::try_from(i + 1).expect("page count fits u32");
            if number == 1 {
                script.pages.insert(base.to_string(), html.clone());
            }
            script.pages.insert(page_url(base, "page", number), html);
        }
        script
    }

    /// Navigation to page `n` never completes.
    pub fn hang_on_page(mut self, base: &str, n: u32) -> Self {
        self.hang.insert(page_url(base, "page", n));
        self
    }

    /// Navigation to page `n` fails `times` times before succeeding.
    pub fn fail_page(self, base: &str, n: u32, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(page_url(base, "page", n), times);
        self
    }

    fn take_failure(&self, url: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(url) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Counters shared by a launcher and everything it creates.
#[derive(Default)]
pub struct RendererLog {
    pub launches: AtomicUsize,
    pub contexts_opened: AtomicUsize,
    pub contexts_closed: AtomicUsize,
    pub cookies_cleared: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub terminations: AtomicUsize,
    pub alive: AtomicBool,
    pub visited: Mutex<Vec<String>>,
}

impl RendererLog {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn contexts_opened(&self) -> usize {
        self.contexts_opened.load(Ordering::SeqCst)
    }

    pub fn contexts_closed(&self) -> usize {
        self.contexts_closed.load(Ordering::SeqCst)
    }

    pub fn cookies_cleared(&self) -> usize {
        self.cookies_cleared.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Simulate the renderer crashing behind the manager's back.
    pub fn crash(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    pub script: Arc<CatalogScript>,
    pub log: Arc<RendererLog>,
    pub fail_launch: bool,
    pub fail_open_page: bool,
    pub launch_delay: Duration,
}

impl FakeLauncher {
    pub fn new(script: CatalogScript) -> Self {
        Self {
            script: Arc::new(script),
            log: Arc::new(RendererLog::default()),
            fail_launch: false,
            fail_open_page: false,
            launch_delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(CatalogScript::default())
        }
    }
}

impl RendererLauncher for FakeLauncher {
    type Process = FakeRenderer;

    async fn launch(&self) -> Result<FakeRenderer> {
        if !self.launch_delay.is_zero() {
            tokio::time::sleep(self.launch_delay).await;
        }
        if self.fail_launch {
            bail!("Chrome/Chromium executable not found");
        }
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        self.log.alive.store(true, Ordering::SeqCst);
        Ok(FakeRenderer {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
            fail_open_page: self.fail_open_page,
            next_context: AtomicU64::new(1),
        })
    }
}

pub struct FakeRenderer {
    script: Arc<CatalogScript>,
    log: Arc<RendererLog>,
    fail_open_page: bool,
    next_context: AtomicU64,
}

impl RendererProcess for FakeRenderer {
    type ContextId = u64;
    type Page = FakePage;

    async fn open_context(&self) -> Result<u64> {
        self.log.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_context.fetch_add(1, Ordering::SeqCst))
    }

    async fn open_page(&self, _context: &u64) -> Result<FakePage> {
        if self.fail_open_page {
            bail!("Target.createTarget failed");
        }
        Ok(FakePage {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
            current: Mutex::new(None),
        })
    }

    async fn clear_cookies(&self, _context: &u64) -> Result<()> {
        self.log.cookies_cleared.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close_context(&self, _context: &u64) -> Result<()> {
        self.log.contexts_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.log.is_alive()
    }

    async fn terminate(&self) -> Result<()> {
        self.log.terminations.fetch_add(1, Ordering::SeqCst);
        self.log.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn signature(&self) -> Option<String> {
        None
    }
}

pub struct FakePage {
    script: Arc<CatalogScript>,
    log: Arc<RendererLog>,
    current: Mutex<Option<String>>,
}

impl CatalogPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.log.visited.lock().unwrap().push(url.to_string());

        if self.script.hang.contains(url) {
            std::future::pending::<()>().await;
        }
        if self.script.take_failure(url) {
            bail!("net::ERR_CONNECTION_RESET at {url}");
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let url = self
            .current
            .lock()
            .unwrap()
            .clone()
            .context("no document loaded")?;
        self.script
            .pages
            .get(&url)
            .cloned()
            .with_context(|| format!("no page scripted for {url}"))
    }

    async fn close(&self) -> Result<()> {
        self.log.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Config
// =============================================================================

/// Config pointing at `BASE_URL` with no settle or pacing delays.
pub fn fast_config() -> IngestConfig {
    IngestConfig::builder()
        .settle_delay(Duration::ZERO)
        .page_delay(Duration::ZERO)
        .database_path("unused.sqlite")
        .base_url(BASE_URL)
        .build()
        .expect("valid test config")
}

/// Config pointing at `BASE_URL` with the production delays and timeout.
pub fn default_timing_config() -> IngestConfig {
    IngestConfig::builder()
        .database_path("unused.sqlite")
        .base_url(BASE_URL)
        .build()
        .expect("valid test config")
}

/// The two-page catalog used by end-to-end tests.
///
/// Page 1: a two-room flat and a studio. Page 2: an unpriced listing, a card
/// without a title, and a listing whose title lacks the separator.
pub fn two_page_catalog() -> Vec<String> {
    vec![
        catalog_page(
            &[
                Card::new("2-комнатная · 54 м²", "от 25 000 000 ₸", "Алматы, Бостандыкский р-н")
                    .views("1 204")
                    .owner("Хозяин"),
                Card::new("студия · 30 м²", "18\u{a0}500\u{a0}000\u{a0}₸", "Алматы, Алмалинский р-н"),
            ],
            2,
        ),
        catalog_page(
            &[
                Card::new("1-комнатная · 38.5 м²", "Договорная", "Алматы, Ауэзовский р-н")
                    .owner("Специалист"),
                Card::new("3-комнатная · 80 м²", "40 000 000 ₸", "Алматы").without_title(),
                Card::new("Квартира у парка", "31 000 000 ₸", "Алматы, Медеуский р-н"),
            ],
            2,
        ),
    ]
}
