//! Integration tests for the batch auditor
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! per-URL pipeline end-to-end: fetch, extraction, asset sizes, link checks
//! and resumable persistence.

use content_audit::config::{load_config, AssetsConfig, AuditConfig, Config, HttpConfig, OutputConfig};
use content_audit::storage::SqliteStorage;
use content_audit::{
    Auditor, BatchStatus, ContentRow, FileSize, LinkStatus, MappingLoader,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HERO_MAPPING: &str = r#"[
    {"name": "hero", "selector": ".hero", "components": {"Title": "h1", "CTA Link": "a.cta"}}
]"#;

/// Creates a test configuration; only link checks and sizes vary
fn create_test_config(check_links: bool, fetch_sizes: bool) -> Config {
    Config {
        audit: AuditConfig {
            mapping_path: "mapping.json".to_string(),
            collect_assets: true,
            extract_blocks: true,
            check_links,
            fetch_sizes,
            link_check_concurrency: 4,
            size_lookup_concurrency: 2,
        },
        http: HttpConfig {
            page_timeout_secs: 5,
            check_timeout_secs: 1,
            user_agent: "content-audit-tests".to_string(),
        },
        assets: AssetsConfig::default(),
        output: OutputConfig {
            database_path: "audit.db".to_string(),
            summary_path: "summary.md".to_string(),
            export_path: "export.json".to_string(),
        },
    }
}

fn hero_page(title: &str, cta: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
            <div class="hero"><h1>{title}</h1><a class="cta" href="{cta}">Go</a></div>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

fn auditor(config: &Config) -> Auditor {
    let mapping = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
    Auditor::new(config, mapping).unwrap()
}

/// Content rows in a canonical order, for multiset comparison
fn sorted_content(rows: &[ContentRow]) -> Vec<ContentRow> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| {
        (&a.url, &a.instance_id, &a.component_name).cmp(&(&b.url, &b.instance_id, &b.component_name))
    });
    rows
}

#[tokio::test]
async fn test_hero_page_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/", hero_page("Welcome", "/shop")).await;

    let mut auditor = auditor(&create_test_config(false, false));
    let report = auditor
        .run(&[format!("{}/", base_url)], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);

    let rows = &auditor.state().content_rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].instance_id, "hero-1");
    assert_eq!(rows[0].component_name, "Title");
    assert_eq!(rows[0].value, "Welcome");
    assert_eq!(rows[1].component_name, "CTA Link");
    assert_eq!(rows[1].value, format!("{}/shop", base_url));

    let pages = &auditor.state().page_rows;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title.as_deref(), Some("Welcome"));
    assert_eq!(pages[0].screenshot_url, None);
}

#[tokio::test]
async fn test_link_rows_only_for_unhealthy_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let html = r#"<html><body>
        <div class="hero"><h1>Links</h1><a class="cta" href="/missing">Broken CTA</a></div>
        <a href="/ok">Fine</a>
        <a href="/slow">Slow</a>
    </body></html>"#;
    mount_page(&mock_server, "/", html.to_string()).await;

    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;
    // /missing has no mock, so wiremock answers 404

    let mut auditor = auditor(&create_test_config(true, false));
    let report = auditor
        .run(&[format!("{}/", base_url)], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);

    let rows = &auditor.state().link_rows;
    assert_eq!(rows.len(), 2, "only /missing and /slow should be reported");

    let missing = rows
        .iter()
        .find(|row| row.linked_url == format!("{}/missing", base_url))
        .expect("404 link should be reported");
    assert_eq!(missing.status, LinkStatus::Http(404));
    assert_eq!(missing.block_name.as_deref(), Some("hero"));
    assert_eq!(missing.component_name.as_deref(), Some("CTA Link"));

    let slow = rows
        .iter()
        .find(|row| row.linked_url == format!("{}/slow", base_url))
        .expect("timed-out link should be reported");
    assert_eq!(slow.status, LinkStatus::Timeout);
    assert_eq!(slow.block_name, None);

    assert!(!rows
        .iter()
        .any(|row| row.linked_url == format!("{}/ok", base_url)));
}

#[tokio::test]
async fn test_asset_sizes_from_content_length() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let html = r#"<html><body>
        <a href="/files/report.pdf">Annual report</a>
        <a href="/files/gone.pdf">Old report</a>
    </body></html>"#;
    mount_page(&mock_server, "/", html.to_string()).await;

    Mock::given(method("HEAD"))
        .and(path("/files/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-length", "2048")
                .set_body_bytes(vec![0u8; 2048]),
        )
        .mount(&mock_server)
        .await;

    let mut auditor = auditor(&create_test_config(false, true));
    auditor
        .run(&[format!("{}/", base_url)], &CancellationToken::new())
        .await
        .unwrap();

    let assets = &auditor.state().asset_rows;
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].asset_url, format!("{}/files/report.pdf", base_url));
    assert_eq!(assets[0].file_size, FileSize::Kilobytes(2.0));
    assert_eq!(assets[1].asset_url, format!("{}/files/gone.pdf", base_url));
    assert_eq!(assets[1].file_size, FileSize::Unavailable);
}

#[tokio::test]
async fn test_failed_url_does_not_abort_and_clears_on_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/a", hero_page("A", "/a-shop")).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/b", hero_page("B", "/b-shop")).await;
    mount_page(&mock_server, "/c", hero_page("C", "/c-shop")).await;

    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let mut auditor = auditor(&create_test_config(false, false))
        .with_storage(Box::new(storage))
        .unwrap();

    let first = auditor.run(&urls, &CancellationToken::new()).await.unwrap();
    assert_eq!(first.status, BatchStatus::PartiallyCompleted);
    assert_eq!(first.processed, vec![urls[0].clone(), urls[2].clone()]);
    assert_eq!(first.failed.len(), 1);
    assert_eq!(first.failed[0].url, urls[1]);
    assert!(first.failed[0].error.contains("503"));

    let second = auditor.run(&urls, &CancellationToken::new()).await.unwrap();
    assert_eq!(second.status, BatchStatus::Completed);
    assert_eq!(second.processed, vec![urls[1].clone()]);
    assert_eq!(second.skipped.len(), 2);
    assert!(auditor.state().failures.is_empty());
    assert_eq!(auditor.state().content_rows.len(), 6);
}

#[tokio::test]
async fn test_resumed_batch_matches_uninterrupted_batch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for name in ["a", "b", "c"] {
        mount_page(
            &mock_server,
            &format!("/{}", name),
            hero_page(&name.to_uppercase(), &format!("/{}-shop", name)),
        )
        .await;
    }
    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    let config = create_test_config(false, false);
    let dir = tempfile::tempdir().unwrap();

    // Uninterrupted reference run
    let mut reference = auditor(&config);
    reference.run(&urls, &CancellationToken::new()).await.unwrap();

    // Interrupted after the first URL, then a fresh process resumes
    let db_path = dir.path().join("resume.db");
    {
        let storage = SqliteStorage::new(&db_path).unwrap();
        let mut interrupted = auditor(&config).with_storage(Box::new(storage)).unwrap();
        interrupted
            .run(&urls[..1], &CancellationToken::new())
            .await
            .unwrap();
    }

    let storage = SqliteStorage::new(&db_path).unwrap();
    let mut resumed = auditor(&config).with_storage(Box::new(storage)).unwrap();
    assert!(resumed.state().is_processed(&urls[0]));

    let report = resumed.run(&urls, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.skipped, vec![urls[0].clone()]);
    assert_eq!(report.processed.len(), 2);

    assert_eq!(
        sorted_content(&resumed.state().content_rows),
        sorted_content(&reference.state().content_rows)
    );
    assert_eq!(
        resumed.state().processed_urls,
        reference.state().processed_urls
    );

    let run = resumed.latest_run().unwrap().unwrap();
    assert_eq!(run.status, BatchStatus::Completed);
    assert_eq!(run.processed_count, 2);
}

#[tokio::test]
async fn test_cancelled_batch_commits_nothing() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", hero_page("Home", "/shop")).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut auditor = auditor(&create_test_config(false, false));
    let report = auditor
        .run(&[format!("{}/", mock_server.uri())], &cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.processed.is_empty());
    assert!(auditor.state().is_empty());
}

#[tokio::test]
async fn test_config_and_mapping_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let mapping_path = dir.path().join("mapping.json");
    std::fs::write(&mapping_path, HERO_MAPPING).unwrap();

    let config_path = dir.path().join("audit.toml");
    std::fs::write(
        &config_path,
        r#"
[audit]
mapping-path = "mapping.json"
check-links = true

[output]
database-path = "audit.db"
summary-path = "summary.md"
export-path = "export.json"
"#,
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    assert!(config.audit.check_links);
    assert!(config.audit.collect_assets);
    assert_eq!(config.audit.link_check_concurrency, 10);

    let mapping = MappingLoader::from_path(&mapping_path).unwrap();
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.rules()[0].name, "hero");

    let missing = MappingLoader::from_path(&dir.path().join("nope.json"));
    assert!(missing.is_err());
}
