//! End-to-end tests: crawl, render, write and dead-letter

use crate::{fast_fetcher, nav_page};
use nav_mapper::config::OutputConfig;
use nav_mapper::crawler::Navigator;
use nav_mapper::output::DeadLetterEntry;
use nav_mapper::task::RunSummary;
use nav_mapper::{website_name, ConcurrencyManager, TaskResult, TaskWorker};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn output_config(dir: &Path) -> OutputConfig {
    OutputConfig {
        output_dir: dir.join("output_maps"),
        dead_letter_path: dir.join("dlq.log"),
        ..OutputConfig::default()
    }
}

async fn mount_html(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_and_dead_letter_in_one_run() {
    let dir = TempDir::new().unwrap();
    let good = MockServer::start().await;
    let bad = MockServer::start().await;

    mount_html(&good, "/", nav_page(&[("/docs", "Docs")])).await;
    mount_html(&good, "/docs", nav_page(&[])).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&bad)
        .await;

    let config = output_config(dir.path());
    let worker = TaskWorker::new(
        Navigator::new(fast_fetcher(Duration::from_millis(200), 1)),
        &config,
    );
    let mut manager = ConcurrencyManager::new(worker, 2);

    let good_url = format!("{}/", good.uri());
    let bad_url = format!("{}/", bad.uri());
    let mut results = manager
        .run_all(vec![(good_url.clone(), "#menu"), (bad_url.clone(), "#menu")])
        .await;
    results.extend(manager.shutdown(true).await);

    assert_eq!(results.len(), 2);
    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.dead_lettered, 1);

    let success = results.iter().find(|r| r.target() == good_url).unwrap();
    let TaskResult::Success { output_path, .. } = success else {
        panic!("expected success, got {:?}", success);
    };
    assert_eq!(
        output_path,
        &config
            .output_dir
            .join(format!("{}_nav_map.md", website_name(&good_url)))
    );
    let content = fs::read_to_string(output_path).unwrap();
    assert_eq!(content.lines().next(), Some(good_url.as_str()));
    assert!(content.contains(&format!("└── {}/docs", good.uri())));

    let dead = fs::read_to_string(&config.dead_letter_path).unwrap();
    let entries: Vec<DeadLetterEntry> = dead
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, bad_url);
    assert_eq!(entries[0].css_selector, "#menu");

    // No locks or staging files are left behind
    let leftovers: Vec<_> = fs::read_dir(&config.output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".lock") || name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
}

#[tokio::test]
async fn test_only_same_site_links_become_children() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        nav_page(&[
            ("/one", "One"),
            ("https://elsewhere.invalid/x", "External"),
            ("/two", "Two"),
        ]),
    )
    .await;
    mount_html(&server, "/one", nav_page(&[])).await;
    mount_html(&server, "/two", nav_page(&[])).await;

    let config = output_config(dir.path());
    let worker = TaskWorker::new(
        Navigator::new(fast_fetcher(Duration::from_secs(5), 0)),
        &config,
    );

    let start = format!("{}/", base);
    let result = worker.run_task(&start, "#menu").await;
    assert!(result.is_success(), "{:?}", result);

    let TaskResult::Success { output_path, .. } = result else {
        unreachable!()
    };
    let content = fs::read_to_string(output_path).unwrap();
    assert_eq!(
        content,
        format!("{b}/\n├── {b}/one\n└── {b}/two", b = base)
    );
    assert!(!config.dead_letter_path.exists());
}

#[tokio::test]
async fn test_rerun_replaces_previous_map() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    mount_html(&server, "/", nav_page(&[])).await;

    let config = output_config(dir.path());
    let worker = TaskWorker::new(
        Navigator::new(fast_fetcher(Duration::from_secs(5), 0)),
        &config,
    );
    let start = format!("{}/", server.uri());
    let target_path = worker.output_path(&start);

    fs::create_dir_all(&config.output_dir).unwrap();
    fs::write(&target_path, "stale map from an earlier run").unwrap();

    let result = worker.run_task(&start, "#menu").await;

    assert!(result.is_success());
    assert_eq!(fs::read_to_string(&target_path).unwrap(), start);
}
