//! End-to-end runs against a scripted renderer

mod common;

use common::{
    BASE_URL, Card, CatalogScript, FakeLauncher, catalog_page, fast_config, two_page_catalog,
};
use realty_ingest::listing_extractor::CardFailureReason;
use realty_ingest::utils::UNSPECIFIED_SOURCE;
use realty_ingest::{
    BrowserSessionManager, IngestConfig, IngestError, IngestOrchestrator, MemoryListingSink,
    PartialResultPolicy, ProgressReporter, RunStatus, SqliteListingStore,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Progress reporter that records event names in order.
#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report_session_acquired(&self) {
        self.push("session".to_string());
    }

    fn report_page_count(&self, max_page: u32) {
        self.push(format!("count:{max_page}"));
    }

    fn report_page_started(&self, page: u32, _url: &str) {
        self.push(format!("start:{page}"));
    }

    fn report_page_extracted(&self, page: u32, records: usize, failures: usize) {
        self.push(format!("extracted:{page}:{records}:{failures}"));
    }

    fn report_cleanup_started(&self) {
        self.push("cleanup".to_string());
    }

    fn report_completed(&self, stored: usize) {
        self.push(format!("completed:{stored}"));
    }

    fn report_error(&self, _error: &str) {
        self.push("error".to_string());
    }
}

fn three_page_catalog() -> Vec<String> {
    (1..=3)
        .map(|n| {
            catalog_page(
                &[Card::new(
                    &format!("{n}-комнатная · {} м²", 40 + n),
                    &format!("{} 000 000 ₸", 20 + n),
                    "Алматы",
                )],
                3,
            )
        })
        .collect()
}

fn keep_partial_config() -> IngestConfig {
    IngestConfig::builder()
        .settle_delay(Duration::ZERO)
        .page_delay(Duration::ZERO)
        .partial_results(PartialResultPolicy::Keep)
        .database_path("unused.sqlite")
        .base_url(BASE_URL)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_two_page_run_ingests_normalized_listings() {
    let launcher = FakeLauncher::new(CatalogScript::catalog(BASE_URL, two_page_catalog()));
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator = IngestOrchestrator::new(fast_config(), sessions, Arc::clone(&sink));

    let report = orchestrator.run_once().await.expect("run should succeed");

    assert!(report.is_complete());
    assert_eq!(report.max_page, 2);
    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.updated, 0);
    assert!(report.store_failures.is_empty());

    let flat = &report.records[0];
    assert_eq!(flat.rooms, Some(2));
    assert_eq!(flat.area, Some(54.0));
    assert_eq!(flat.price, Some(25_000_000.0));
    assert_eq!(flat.price_per_area, Some(462_962.96));
    assert_eq!(flat.region, "Алматы");
    assert_eq!(flat.views.as_deref(), Some("1 204"));
    assert_eq!(flat.listing_source, "Хозяин");

    let studio = &report.records[1];
    assert_eq!(studio.rooms, Some(0));
    assert_eq!(studio.price, Some(18_500_000.0));
    assert_eq!(studio.price_per_area, Some(616_666.67));
    assert_eq!(studio.listing_source, UNSPECIFIED_SOURCE);

    let unpriced = &report.records[2];
    assert_eq!(unpriced.rooms, Some(1));
    assert_eq!(unpriced.area, Some(38.5));
    assert_eq!(unpriced.price, None);
    assert_eq!(unpriced.price_per_area, None);
    assert_eq!(unpriced.listing_source, "Специалист");

    let untitled = &report.records[3];
    assert_eq!(untitled.rooms, None);
    assert_eq!(untitled.area, None);
    assert_eq!(untitled.price, Some(31_000_000.0));

    assert_eq!(report.card_failures.len(), 1);
    assert_eq!(report.card_failures[0].page, 2);
    assert_eq!(report.card_failures[0].index, 1);
    assert_eq!(report.card_failures[0].reason, CardFailureReason::MissingTitle);

    assert_eq!(sink.len(), 4);
    assert_eq!(sink.records(), report.records);

    assert_eq!(log.contexts_opened(), 1);
    assert_eq!(log.contexts_closed(), 1);
    assert!(log.is_alive(), "renderer outlives the run");
}

#[tokio::test]
async fn test_rerun_updates_instead_of_duplicating() {
    let launcher = FakeLauncher::new(CatalogScript::catalog(BASE_URL, two_page_catalog()));
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator = IngestOrchestrator::new(fast_config(), sessions, Arc::clone(&sink));

    let first = orchestrator.run_once().await.unwrap();
    let second = orchestrator.run_once().await.unwrap();

    assert_eq!(first.inserted, 4);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 4);
    assert_eq!(sink.len(), 4);
    assert_ne!(first.run_id, second.run_id);

    // One renderer, one fresh context per run
    assert_eq!(log.launches(), 1);
    assert_eq!(orchestrator.sessions().launch_count(), 1);
    assert_eq!(log.contexts_opened(), 2);
    assert_eq!(log.contexts_closed(), 2);
}

#[tokio::test]
async fn test_rerun_into_sqlite_keeps_one_row_per_listing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteListingStore::open(&dir.path().join("listings.sqlite"))
            .await
            .unwrap(),
    );
    let launcher = FakeLauncher::new(CatalogScript::catalog(BASE_URL, two_page_catalog()));
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let orchestrator = IngestOrchestrator::new(fast_config(), sessions, Arc::clone(&store));

    orchestrator.run_once().await.unwrap();
    let second = orchestrator.run_once().await.unwrap();

    assert_eq!(second.updated, 4);
    assert_eq!(store.count().await.unwrap(), 4);
    let rows = store.fetch_all().await.unwrap();
    assert!(rows.iter().all(|row| row.revision == 2));

    store.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_timeout_mid_crawl_discards_and_releases_context() {
    let script = CatalogScript::catalog(BASE_URL, three_page_catalog()).hang_on_page(BASE_URL, 2);
    let launcher = FakeLauncher::new(script);
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator =
        IngestOrchestrator::new(fast_config(), Arc::clone(&sessions), Arc::clone(&sink));
    let progress = RecordingProgress::default();

    let err = orchestrator
        .run_once_with(&progress, CancellationToken::new())
        .await
        .expect_err("page 2 never loads");

    assert!(matches!(err, IngestError::Navigation { page: 2, .. }));
    assert!(sink.is_empty(), "partial results are discarded by default");

    assert_eq!(log.contexts_opened(), 1);
    assert_eq!(log.contexts_closed(), 1);
    assert_eq!(log.terminations(), 0);
    assert!(log.is_alive());
    assert!(sessions.is_running().await);

    let events = progress.events();
    assert_eq!(events.first().map(String::as_str), Some("session"));
    assert!(events.contains(&"extracted:1:1:0".to_string()));
    assert_eq!(
        &events[events.len() - 2..],
        &["cleanup".to_string(), "error".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_keep_policy_stores_completed_pages() {
    let script = CatalogScript::catalog(BASE_URL, three_page_catalog()).hang_on_page(BASE_URL, 2);
    let launcher = FakeLauncher::new(script);
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator = IngestOrchestrator::new(keep_partial_config(), sessions, Arc::clone(&sink));

    let report = orchestrator.run_once().await.expect("partial run is reported");

    assert!(!report.is_complete());
    match &report.status {
        RunStatus::Partial { reason } => assert!(reason.contains("page 2")),
        RunStatus::Complete => panic!("expected a partial run"),
    }
    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.records()[0].rooms, Some(1));
    assert_eq!(log.contexts_closed(), 1);
}

#[tokio::test]
async fn test_cancelled_run_releases_context() {
    let launcher = FakeLauncher::new(CatalogScript::catalog(BASE_URL, two_page_catalog()));
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator = IngestOrchestrator::new(fast_config(), sessions, Arc::clone(&sink));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = orchestrator
        .run_once_with(&RecordingProgress::default(), cancel)
        .await
        .unwrap_err();

    assert_eq!(err, IngestError::Cancelled { pages_completed: 0 });
    assert!(sink.is_empty());
    assert_eq!(log.contexts_closed(), 1);
}

#[tokio::test]
async fn test_launch_failure_surfaces_without_touching_sink() {
    let sessions = Arc::new(BrowserSessionManager::new(FakeLauncher::failing()));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator = IngestOrchestrator::new(fast_config(), sessions, Arc::clone(&sink));
    let progress = RecordingProgress::default();

    let err = orchestrator
        .run_once_with(&progress, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Launch(_)));
    assert!(sink.is_empty());
    assert_eq!(progress.events(), vec!["error".to_string()]);
}

#[tokio::test]
async fn test_renderer_crash_between_runs_is_recovered() {
    let launcher = FakeLauncher::new(CatalogScript::catalog(BASE_URL, two_page_catalog()));
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let sink = Arc::new(MemoryListingSink::new());
    let orchestrator = IngestOrchestrator::new(fast_config(), sessions, Arc::clone(&sink));

    orchestrator.run_once().await.unwrap();
    log.crash();
    let report = orchestrator.run_once().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(log.launches(), 2);
    assert_eq!(sink.len(), 4);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let launcher = FakeLauncher::new(CatalogScript::catalog(BASE_URL, two_page_catalog()));
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let orchestrator =
        IngestOrchestrator::new(fast_config(), sessions, Arc::new(MemoryListingSink::new()));

    let report = orchestrator.run_once().await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "complete");
    assert_eq!(json["pages_crawled"], 2);
    assert_eq!(json["records"].as_array().unwrap().len(), 4);
    assert_eq!(json["records"][2]["price"], serde_json::Value::Null);
    assert_eq!(json["card_failures"][0]["reason"], "missing_title");

    let decoded: realty_ingest::IngestReport = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.run_id, report.run_id);
    assert_eq!(decoded.status, RunStatus::Complete);
    assert_eq!(decoded.card_failures, report.card_failures);
}

#[tokio::test]
async fn test_templated_base_url_with_unreadable_studio_price() {
    const TEMPLATED: &str = "https://catalog.test/sale?page={n}";
    let pages = vec![
        catalog_page(
            &[
                Card::new("2-комнатная · 54 м²", "от 25 000 000 ₸", "Алматы, Бостандыкский р-н"),
                Card::new("студия · 30 м²", "Цена не указана", "Алматы, Алмалинский р-н"),
            ],
            2,
        ),
        catalog_page(&[Card::new("3-комнатная · 75 м²", "40 000 000 ₸", "Алматы")], 2),
    ];
    let launcher = FakeLauncher::new(CatalogScript::catalog(TEMPLATED, pages));
    let log = Arc::clone(&launcher.log);
    let sessions = Arc::new(BrowserSessionManager::new(launcher));
    let config = IngestConfig::builder()
        .settle_delay(Duration::ZERO)
        .page_delay(Duration::ZERO)
        .database_path("unused.sqlite")
        .base_url(TEMPLATED)
        .build()
        .unwrap();
    let orchestrator =
        IngestOrchestrator::new(config, sessions, Arc::new(MemoryListingSink::new()));

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(
        log.visited(),
        vec![
            "https://catalog.test/sale?page=1".to_string(),
            "https://catalog.test/sale?page=1".to_string(),
            "https://catalog.test/sale?page=2".to_string(),
        ]
    );

    let page_one = &report.records[..2];
    assert_eq!(page_one[0].rooms, Some(2));
    assert_eq!(page_one[0].area, Some(54.0));
    assert_eq!(page_one[0].price, Some(25_000_000.0));
    assert_eq!(page_one[0].price_per_area, Some(462_962.96));
    assert_eq!(page_one[0].region, "Алматы");

    assert_eq!(page_one[1].rooms, Some(0));
    assert_eq!(page_one[1].area, Some(30.0));
    assert_eq!(page_one[1].price, None);
    assert_eq!(page_one[1].price_per_area, None);
    assert_eq!(page_one[1].region, "Алматы");

    assert_eq!(report.records.len(), 3);
}
