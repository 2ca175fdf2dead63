//! Crawl tests against mock HTTP servers

use crate::{fast_fetcher, nav_page};
use nav_mapper::crawler::{CrawlError, FetchError, Navigator, NodeId, PageFetcher};
use nav_mapper::render_tree;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        nav_page(&[("/about", "About"), ("/services", "Services"), ("/contact", "Contact")]),
    )
    .await;
    mount_page(
        &server,
        "/about",
        nav_page(&[("/about", "About"), ("/about/team", "Team")]),
    )
    .await;
    mount_page(
        &server,
        "/services",
        nav_page(&[("/services/web", "Web"), ("/about/team", "Team again")]),
    )
    .await;
    mount_page(&server, "/contact", nav_page(&[])).await;
    mount_page(&server, "/about/team", nav_page(&[("/", "Home")])).await;
    mount_page(&server, "/services/web", nav_page(&[])).await;

    let navigator = Navigator::new(fast_fetcher(Duration::from_secs(5), 0));
    let start = format!("{}/", base);
    let tree = navigator.crawl(&start, "#menu").await.unwrap();

    assert_eq!(tree.len(), 6);
    assert!(!tree.contains(&format!("{}/privacy", base)));
    assert_eq!(tree.depth_of(&format!("{}/about/team", base)), Some(2));

    let about = tree.find(&format!("{}/about", base)).unwrap();
    let team = tree.find(&format!("{}/about/team", base)).unwrap();
    assert_eq!(tree.children(about), &[team]);

    let expected = format!(
        "{b}/
├── {b}/about
│   └── {b}/about/team
├── {b}/services
│   └── {b}/services/web
└── {b}/contact",
        b = base
    );
    assert_eq!(render_tree(Some(&tree)), expected);
}

#[tokio::test]
async fn test_off_site_links_are_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(nav_page(&[])))
        .expect(0)
        .mount(&other)
        .await;

    let external = format!("{}/elsewhere", other.uri());
    mount_page(
        &server,
        "/",
        nav_page(&[(external.as_str(), "Elsewhere"), ("/local", "Local")]),
    )
    .await;
    mount_page(&server, "/local", nav_page(&[])).await;

    let navigator = Navigator::new(fast_fetcher(Duration::from_secs(5), 0));
    let tree = navigator
        .crawl(&format!("{}/", server.uri()), "#menu")
        .await
        .unwrap();

    assert_eq!(tree.descendant_count(), 1);
    assert!(!tree.contains(&external));
}

#[tokio::test]
async fn test_non_html_and_error_pages_are_leaves() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        nav_page(&[("/missing", "Missing"), ("/report.pdf", "Report"), ("/broken", "Broken")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("%PDF-1.4")
                .insert_header("content-type", "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let navigator = Navigator::new(fast_fetcher(Duration::from_secs(5), 3));
    let tree = navigator
        .crawl(&format!("{}/", server.uri()), "#menu")
        .await
        .unwrap();

    assert_eq!(tree.len(), 4);
    for (id, _) in tree.iter().filter(|(id, _)| *id != NodeId::ROOT) {
        assert!(tree.children(id).is_empty());
    }
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", nav_page(&[("/a", "A")])).await;

    let fetcher = fast_fetcher(Duration::from_secs(5), 0);
    let body = fetcher
        .fetch(&format!("{}/old", server.uri()))
        .await
        .unwrap();
    assert!(body.is_some_and(|b| b.contains(r#"href="/a""#)));
}

#[tokio::test]
async fn test_timeouts_are_retried_then_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(nav_page(&[])).set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(Duration::from_millis(100), 2);
    let result = fetcher.fetch(&format!("{}/slow", server.uri())).await;

    match result {
        Err(FetchError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected exhausted fetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_root_aborts_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(nav_page(&[])).set_delay(Duration::from_secs(2)))
        .expect(2)
        .mount(&server)
        .await;

    let navigator = Navigator::new(fast_fetcher(Duration::from_millis(100), 1));
    let result = navigator
        .crawl(&format!("{}/", server.uri()), "#menu")
        .await;

    assert!(matches!(result, Err(CrawlError::RootFetch { .. })));
}

#[tokio::test]
async fn test_root_404_yields_root_only_tree() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let navigator = Navigator::new(fast_fetcher(Duration::from_secs(5), 3));
    let start = format!("{}/", server.uri());
    let tree = navigator.crawl(&start, "#menu").await.unwrap();

    assert_eq!(render_tree(Some(&tree)), start);
}
