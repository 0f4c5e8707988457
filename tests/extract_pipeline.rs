//! End-to-end pipeline tests against a mock origin.
//!
//! A wiremock server plays the site: it serves a Next.js-flavored page and
//! its bundle assets (one of them broken). The full agent session runs
//! against it and the saved ZIP is inspected entry by entry.

use bundlesnap::agent::{Message, Reply, Session, SessionEvent};
use bundlesnap::detect::{Framework, RouterInfo};
use bundlesnap::http::HttpClient;
use bundlesnap::snapshot::PageSnapshot;
use std::io::Read;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_HTML: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <link rel="preload" as="script" href="/_next/static/chunks/pages/_app-11aa.js">
  <script id="__NEXT_DATA__" type="application/json">{"buildId":"test-build","page":"/index","pages":["/index","/about"]}</script>
</head>
<body>
  <div id="__next"></div>
  <script src="/_next/static/chunks/main-22bb.js"></script>
  <script src="/_next/static/chunks/broken-33cc.js"></script>
  <script>__loadChunk("/_next/static/chunks/lazy-44dd.js")</script>
</body>
</html>"#;

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_HTML))
        .mount(&server)
        .await;

    for (route, body) in [
        ("/_next/static/chunks/pages/_app-11aa.js", "app code"),
        ("/_next/static/chunks/main-22bb.js", "main code"),
        ("/_next/static/chunks/lazy-44dd.js", "lazy code"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/_next/static/chunks/broken-33cc.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

async fn capture(server: &MockServer) -> PageSnapshot {
    let client = HttpClient::new(5_000);
    PageSnapshot::capture(&client, &format!("{}/", server.uri()), 5_000, None)
        .await
        .expect("page capture")
}

#[tokio::test]
async fn extraction_produces_archive_despite_one_broken_asset() {
    let server = mock_site().await;
    let snapshot = capture(&server).await;
    let out = tempfile::tempdir().unwrap();

    let session = Session::spawn(snapshot, HttpClient::new(5_000), out.path(), 5_000, 42);
    let mut events = session.subscribe_events();

    let reply = session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: false,
        })
        .await
        .unwrap();
    assert!(matches!(reply, Reply::Ack));

    let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("session result in time")
        .unwrap();

    let (file_name, saved_to) = match event {
        SessionEvent::Complete {
            file_name,
            saved_to,
        } => (file_name, saved_to),
        SessionEvent::Failure { message } => panic!("extraction failed: {message}"),
    };

    assert!(file_name.starts_with("127.0.0.1-nextjs-source-"));
    assert!(file_name.ends_with(".zip"));

    let file = std::fs::File::open(&saved_to).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();

    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.iter().all(|n| !n.starts_with('/')));
    assert!(names.contains(&"_next/static/chunks/pages/_app-11aa.js".to_string()));
    assert!(names.contains(&"_next/static/chunks/main-22bb.js".to_string()));
    assert!(names.contains(&"_next/static/chunks/lazy-44dd.js".to_string()));
    // The broken asset was dropped, not fatal.
    assert_eq!(names.len(), 3);

    let mut body = String::new();
    archive
        .by_name("_next/static/chunks/main-22bb.js")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "main code");
}

#[tokio::test]
async fn progress_streams_monotonically_to_completion() {
    let server = mock_site().await;
    let snapshot = capture(&server).await;
    let out = tempfile::tempdir().unwrap();

    let session = Session::spawn(snapshot, HttpClient::new(5_000), out.path(), 5_000, 1);
    let mut events = session.subscribe_events();
    let mut progress = session.subscribe_progress();

    session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: false,
        })
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("completion in time")
        .unwrap();

    let mut updates = Vec::new();
    while let Ok(update) = progress.try_recv() {
        updates.push(update);
    }
    assert!(!updates.is_empty());
    assert_eq!(updates[0].percent, 5);
    assert!(updates.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(updates.last().unwrap().percent, 80);
    // One download event per attempted item, including the broken one.
    assert_eq!(
        updates
            .iter()
            .filter(|u| u.status.starts_with("Downloading:"))
            .count(),
        4
    );
}

#[tokio::test]
async fn detection_runs_in_session_and_is_cached_per_tab() {
    let server = mock_site().await;
    let snapshot = capture(&server).await;
    let out = tempfile::tempdir().unwrap();

    let session = Session::spawn(snapshot, HttpClient::new(5_000), out.path(), 5_000, 7);

    let reply = session
        .page
        .request(Message::DetectFramework { tab: 7 })
        .await
        .unwrap();
    match reply {
        Reply::Detection { result } => {
            assert_eq!(result.framework, Framework::NextJs);
            match result.router {
                Some(RouterInfo::NextJs {
                    build_id,
                    current_page,
                    pages,
                }) => {
                    assert_eq!(build_id, "test-build");
                    assert_eq!(current_page, "/index");
                    assert_eq!(pages, vec!["/index", "/about"]);
                }
                other => panic!("expected Next.js router info, got {other:?}"),
            }
        }
        other => panic!("unexpected reply {other:?}"),
    }

    // The privileged agent now serves the cached result for that tab.
    let reply = session
        .privileged
        .request(Message::DetectFramework { tab: 7 })
        .await
        .unwrap();
    match reply {
        Reply::Detection { result } => assert_eq!(result.framework, Framework::NextJs),
        other => panic!("unexpected reply {other:?}"),
    }

    // Another tab is a cache miss.
    let reply = session
        .privileged
        .request(Message::DetectFramework { tab: 8 })
        .await
        .unwrap();
    match reply {
        Reply::Detection { result } => assert_eq!(result.framework, Framework::None),
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn sourcemap_option_fetches_companions() {
    let server = mock_site().await;
    // Serve a companion for exactly one asset; the rest 404.
    Mock::given(method("GET"))
        .and(path("/_next/static/chunks/main-22bb.js.map"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"version\":3}"))
        .mount(&server)
        .await;

    let snapshot = capture(&server).await;
    let out = tempfile::tempdir().unwrap();

    let session = Session::spawn(snapshot, HttpClient::new(5_000), out.path(), 5_000, 1);
    let mut events = session.subscribe_events();

    session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: true,
        })
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("completion in time")
        .unwrap();
    let saved_to = match event {
        SessionEvent::Complete { saved_to, .. } => saved_to,
        SessionEvent::Failure { message } => panic!("extraction failed: {message}"),
    };

    let file = std::fs::File::open(&saved_to).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.contains(&"_next/static/chunks/main-22bb.js.map".to_string()));
    // Companions that 404'd are simply absent.
    assert!(!names.contains(&"_next/static/chunks/lazy-44dd.js.map".to_string()));
}

#[tokio::test]
async fn page_without_bundles_fails_without_an_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>nothing here</p></body></html>"),
        )
        .mount(&server)
        .await;

    let snapshot = capture(&server).await;
    let out = tempfile::tempdir().unwrap();

    let session = Session::spawn(snapshot, HttpClient::new(5_000), out.path(), 5_000, 1);
    let mut events = session.subscribe_events();

    let reply = session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: false,
        })
        .await
        .unwrap();
    assert!(matches!(reply, Reply::Ack));

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("failure event in time")
        .unwrap();
    match event {
        SessionEvent::Failure { message } => {
            assert!(message.contains("no bundle files found"));
        }
        SessionEvent::Complete { .. } => panic!("expected failure for empty page"),
    }

    // No archive was written.
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn second_extraction_while_running_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<script src="/_next/static/slow.js"></script>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_next/static/slow.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let snapshot = capture(&server).await;
    let out = tempfile::tempdir().unwrap();

    let session = Session::spawn(snapshot, HttpClient::new(5_000), out.path(), 5_000, 1);
    let mut events = session.subscribe_events();

    let first = session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: false,
        })
        .await
        .unwrap();
    assert!(matches!(first, Reply::Ack));

    // The first run is stuck on the slow asset; a second request is refused
    // but the agent still answers pings.
    let second = session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: false,
        })
        .await
        .unwrap();
    assert!(matches!(second, Reply::Rejected { .. }));
    assert!(matches!(
        session.page.request(Message::Ping).await.unwrap(),
        Reply::Pong
    ));

    // The first run still completes.
    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("completion in time")
        .unwrap();
    assert!(matches!(event, SessionEvent::Complete { .. }));
}
