//! Black-box tests for the static-file router collaborator (spec.md §1
//! "out of scope, specified only as a collaborator contract" — built
//! per SPEC_FULL.md as the minimal runnable router).

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tempfile::TempDir;
use webserv::config::Config;
use webserv::http::request::Method;
use webserv::http::{BodyLocation, BodyStore, Dispatch, ParsedRequest, Responder};
use webserv::router::StaticFileRouter;

fn config_for(root: &std::path::Path, directory_listing: bool) -> Rc<Config> {
    Rc::new(Config {
        port: 0,
        idle_timeout: Duration::from_secs(0),
        webroot: root.to_path_buf(),
        default_file: "index.html".to_string(),
        directory_listing,
        mime_overrides: HashMap::new(),
    })
}

fn request(method: Method, uri: &str) -> ParsedRequest {
    ParsedRequest {
        method,
        uri: uri.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: vec![("host".to_string(), "x".to_string())],
        body_location: BodyLocation::None,
    }
}

/// Drives one `on_request` call and returns the bytes the router sent.
fn dispatch(router: &mut StaticFileRouter, req: &ParsedRequest) -> Vec<u8> {
    let mut out = Vec::new();
    let mut send_fn = |b: &[u8]| out.extend_from_slice(b);
    let mut close_fn = || {};
    let mut responder = Responder::new(&mut send_fn, &mut close_fn);
    router.on_request(req, &mut BodyStore::Empty, &mut responder);
    out
}

#[test]
fn serves_an_existing_file_with_inferred_mime_type() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hello.html"), b"<p>hi</p>").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let resp = dispatch(&mut router, &request(Method::Get, "/hello.html"));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 200 OK"));
    assert!(text.contains("Content-Type: text/html"));
    assert!(text.ends_with("<p>hi</p>"));
}

#[test]
fn missing_file_is_404() {
    let dir = TempDir::new().unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let resp = dispatch(&mut router, &request(Method::Get, "/nope.html"));
    assert!(String::from_utf8_lossy(&resp).starts_with("HTTP/1.1 404"));
}

#[test]
fn directory_serves_default_file_when_present() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub/index.html"), b"welcome").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let resp = dispatch(&mut router, &request(Method::Get, "/sub/"));
    let text = String::from_utf8_lossy(&resp);
    assert!(text.starts_with("HTTP/1.1 200 OK"));
    assert!(text.ends_with("welcome"));
}

#[test]
fn directory_listing_enabled_without_default_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
    std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let resp = dispatch(&mut router, &request(Method::Get, "/"));
    let text = String::from_utf8_lossy(&resp);
    assert!(text.starts_with("HTTP/1.1 200 OK"));
    assert!(text.contains("a.txt"));
    assert!(text.contains("b.txt"));
}

#[test]
fn directory_listing_disabled_is_forbidden() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), false));

    let resp = dispatch(&mut router, &request(Method::Get, "/"));
    assert!(String::from_utf8_lossy(&resp).starts_with("HTTP/1.1 403"));
}

#[test]
fn path_traversal_above_webroot_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let resp = dispatch(&mut router, &request(Method::Get, "/../../etc/passwd"));
    assert!(String::from_utf8_lossy(&resp).starts_with("HTTP/1.1 403"));
}

#[test]
fn head_strips_body_but_keeps_content_length() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("f.txt"), b"0123456789").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let req = request(Method::Head, "/f.txt");
    let resp = dispatch(&mut router, &req);
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 200 OK"));
    assert!(text.contains("Content-Length: 10"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn unsupported_method_is_405() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("f.txt"), b"x").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let resp = dispatch(&mut router, &request(Method::Post, "/f.txt"));
    assert!(String::from_utf8_lossy(&resp).starts_with("HTTP/1.1 405"));
}

#[test]
fn connection_close_request_gets_close_header() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("f.txt"), b"x").unwrap();
    let mut router = StaticFileRouter::new(config_for(dir.path(), true));

    let mut req = request(Method::Get, "/f.txt");
    req.headers.push(("connection".to_string(), "close".to_string()));
    let resp = dispatch(&mut router, &req);
    assert!(String::from_utf8_lossy(&resp).contains("Connection: close"));
}
