//! Integration tests for loading documents over HTTP and from disk.

use termcast::asciicast::loader::find_alternate_link;
use termcast::{Asciicast, CastError, Frame, Loader, Source};

fn sample() -> Asciicast {
    Asciicast::new(80, 24, vec![Frame::new(0.25, b"hi\xff".to_vec())]).with_title("remote")
}

fn page(href: &str) -> String {
    format!(
        r#"<!doctype html><html><head>
<link rel="stylesheet" href="/style.css">
<link href="{href}" type="application/asciicast+json" rel="alternate">
</head><body></body></html>"#
    )
}

fn source(url: &str) -> Source {
    Source::parse(url).unwrap()
}

#[tokio::test]
async fn loads_document_directly() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/a.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sample().encode().unwrap())
        .create_async()
        .await;

    let cast = Loader::new()
        .load(&source(&format!("{}/a.json", server.url())))
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(cast.frames, sample().frames);
    assert_eq!(cast.title, "remote");
}

#[tokio::test]
async fn follows_alternate_link_in_html() {
    let mut server = mockito::Server::new_async().await;
    let html = server
        .mock("GET", "/a/123")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(page("/a/123.json"))
        .create_async()
        .await;
    let json = server
        .mock("GET", "/a/123.json")
        .with_status(200)
        .with_body(sample().encode().unwrap())
        .create_async()
        .await;

    let cast = Loader::new()
        .load(&source(&format!("{}/a/123", server.url())))
        .await
        .unwrap();
    html.assert_async().await;
    json.assert_async().await;
    assert_eq!(cast.frames, sample().frames);
}

#[tokio::test]
async fn relative_link_resolves_against_page() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/casts/demo.html")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(page("demo.json"))
        .create_async()
        .await;
    let json = server
        .mock("GET", "/casts/demo.json")
        .with_status(200)
        .with_body(sample().encode().unwrap())
        .create_async()
        .await;

    Loader::new()
        .load(&source(&format!("{}/casts/demo.html", server.url())))
        .await
        .unwrap();
    json.assert_async().await;
}

#[tokio::test]
async fn html_without_link_is_a_format_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><head><title>nothing here</title></head></html>")
        .create_async()
        .await;

    let err = Loader::new()
        .load(&source(&format!("{}/", server.url())))
        .await
        .unwrap_err();
    assert!(matches!(err, CastError::Format { .. }), "{err}");
}

#[tokio::test]
async fn error_status_is_a_network_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/missing.json")
        .with_status(404)
        .create_async()
        .await;

    let err = Loader::new()
        .load(&source(&format!("{}/missing.json", server.url())))
        .await
        .unwrap_err();
    assert!(err.is_network(), "{err}");
    assert!(err.to_string().contains("404"), "{err}");
}

#[tokio::test]
async fn self_referencing_page_gives_up() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/loop")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(page("/loop"))
        .expect_at_least(1)
        .create_async()
        .await;

    let err = Loader::new()
        .max_hops(2)
        .load(&source(&format!("{}/loop", server.url())))
        .await
        .unwrap_err();
    assert!(err.is_format(), "{err}");
}

#[tokio::test]
async fn local_html_points_at_sibling_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.json"), sample().encode().unwrap()).unwrap();
    let html = dir.path().join("index.html");
    std::fs::write(&html, page("demo.json")).unwrap();

    let cast = Loader::new()
        .load(&Source::Path(html))
        .await
        .unwrap();
    assert_eq!(cast.frames, sample().frames);
}

#[tokio::test]
async fn missing_local_file_names_the_path() {
    let err = Loader::new()
        .load(&Source::parse("/no/such/dir/demo.json").unwrap())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("/no/such/dir/demo.json"), "{err}");
}

#[test]
fn link_attributes_in_any_order_and_case() {
    let html = r#"<LINK HREF='x.json' REL=alternate TYPE="application/asciicast+json">"#;
    assert_eq!(find_alternate_link(html).as_deref(), Some("x.json"));
    assert_eq!(find_alternate_link(r#"<link rel="alternate" href="x">"#), None);
}
