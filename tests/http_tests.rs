//! Black-box tests against the HTTP framing state machine (C6) and
//! request parser (C7) directly — no live socket, matching the
//! properties spec.md §8 states against the state machine in isolation.

use webserv::http::request::parse_header_region;
use webserv::http::{BodyLocation, BodyStore, Dispatch, HttpConn, ParsedRequest, Responder};

#[derive(Default)]
struct Recorder {
    requests: Vec<(String, String, BodyLocation, Vec<u8>)>,
    bad_requests: Vec<u16>,
    server_errors: usize,
}

impl Dispatch for Recorder {
    fn on_request(&mut self, request: &ParsedRequest, body: &mut BodyStore, responder: &mut Responder) {
        let body = body.read_to_end().expect("body readable");
        self.requests.push((request.method.to_string(), request.uri.clone(), request.body_location, body));
        responder.send_data(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    }

    fn on_bad_request(&mut self, status: u16, responder: &mut Responder) {
        self.bad_requests.push(status);
        responder.close_conn();
    }

    fn on_server_error(&mut self, responder: &mut Responder) {
        self.server_errors += 1;
        responder.close_conn();
    }
}

/// Drives one `on_data` call through a throwaway `Responder`, returning
/// whatever bytes the dispatch callback sent plus whether the state
/// machine says the connection must close.
fn feed(conn: &mut HttpConn, dispatch: &mut Recorder, bytes: &[u8]) -> (Vec<u8>, bool) {
    let mut sent = Vec::new();
    let closed;
    {
        let mut send_fn = |b: &[u8]| sent.extend_from_slice(b);
        let mut close_fn = || {};
        let mut responder = Responder::new(&mut send_fn, &mut close_fn);
        closed = conn.on_data(bytes, dispatch, &mut responder);
    }
    (sent, closed)
}

#[test]
fn s1_minimal_get_keeps_connection_open() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let (sent, closed) = feed(&mut conn, &mut rec, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");

    assert!(!closed);
    assert_eq!(rec.requests.len(), 1);
    assert_eq!(rec.requests[0].0, "GET");
    assert_eq!(rec.requests[0].1, "/");
    assert_eq!(rec.requests[0].2, BodyLocation::None);
    assert!(sent.starts_with(b"HTTP/1.1 200 OK"));
}

#[test]
fn s2_pipelined_pair_dispatches_both_in_order() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let input = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HTTP/1.1\r\nHost: x\r\n\r\n";
    let (sent, closed) = feed(&mut conn, &mut rec, input);

    assert!(!closed);
    assert_eq!(rec.requests.len(), 2);
    assert_eq!(rec.requests[0].1, "/a");
    assert_eq!(rec.requests[1].1, "/b");
    let sent_str = String::from_utf8_lossy(&sent);
    assert_eq!(sent_str.matches("200 OK").count(), 2);
}

#[test]
fn s3_oversize_headers_without_terminator_yield_431() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let mut input = Vec::new();
    while input.len() < 9000 {
        input.extend_from_slice(b"X-Pad: a\r\n");
    }

    let (_sent, closed) = feed(&mut conn, &mut rec, &input);

    assert!(closed);
    assert_eq!(rec.bad_requests, vec![431]);
}

#[test]
fn s6_malformed_request_line_yields_400() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let (_sent, closed) = feed(&mut conn, &mut rec, b"GET HTTP/1.1\r\nHost: x\r\n\r\n");

    assert!(closed);
    assert_eq!(rec.bad_requests, vec![400]);
}

#[test]
fn s7_missing_host_yields_400() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let (_sent, closed) = feed(&mut conn, &mut rec, b"GET / HTTP/1.1\r\n\r\n");

    assert!(closed);
    assert_eq!(rec.bad_requests, vec![400]);
}

#[test]
fn s4_body_fits_in_memory() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let input = b"POST /upload HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello";
    let (_sent, closed) = feed(&mut conn, &mut rec, input);

    assert!(!closed);
    assert_eq!(rec.requests.len(), 1);
    assert_eq!(rec.requests[0].2, BodyLocation::Memory);
    assert_eq!(rec.requests[0].3, b"hello");
}

#[test]
fn s5_large_body_spills_to_file() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let payload = vec![b'z'; 2 * 1024 * 1024];
    let mut input =
        format!("POST /big HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n", payload.len()).into_bytes();
    input.extend_from_slice(&payload);

    // Deliver in two chunks to exercise the READING_BODY accumulation path.
    let mid = input.len() / 2;
    let (_sent, closed_mid) = feed(&mut conn, &mut rec, &input[..mid]);
    assert!(!closed_mid);
    assert!(rec.requests.is_empty());

    let (_sent, closed) = feed(&mut conn, &mut rec, &input[mid..]);
    assert!(!closed);
    assert_eq!(rec.requests.len(), 1);
    assert_eq!(rec.requests[0].2, BodyLocation::File);
    assert_eq!(rec.requests[0].3, payload);
}

#[test]
fn zero_length_content_length_is_treated_as_no_body() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let input = b"POST /noop HTTP/1.1\r\nHost: x\r\nContent-Length: 0\r\n\r\n";
    let (_sent, closed) = feed(&mut conn, &mut rec, input);

    assert!(!closed);
    assert_eq!(rec.requests.len(), 1);
    assert_eq!(rec.requests[0].2, BodyLocation::None);
    assert!(rec.requests[0].3.is_empty());
}

#[test]
fn connection_close_header_closes_after_dispatch() {
    let mut conn = HttpConn::new();
    let mut rec = Recorder::default();

    let input = b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n";
    let (_sent, closed) = feed(&mut conn, &mut rec, input);

    assert!(closed);
    assert_eq!(rec.requests.len(), 1);
}

#[test]
fn parser_is_idempotent_on_the_same_bytes() {
    let region = b"GET /a?x=1 HTTP/1.1\r\nHost: example\r\nX-Thing: v\r\n";
    let first = parse_header_region(region).expect("well-formed request parses");
    let second = parse_header_region(region).expect("well-formed request parses");

    assert_eq!(first.method, second.method);
    assert_eq!(first.uri, second.uri);
    assert_eq!(first.version, second.version);
    assert_eq!(first.headers, second.headers);
}

#[test]
fn permissive_uri_subdelims_are_accepted() {
    // Spec §9(b): `( ) * '` are preserved even though they're atypical.
    let region = b"GET /a(b)*c'd HTTP/1.1\r\nHost: x\r\n";
    let parsed = parse_header_region(region).expect("permissive sub-delims accepted");
    assert_eq!(parsed.uri, "/a(b)*c'd");
}

#[test]
fn percent_escape_must_be_two_hex_digits() {
    let ok = parse_header_region(b"GET /a%2F HTTP/1.1\r\nHost: x\r\n");
    assert!(ok.is_ok());

    let bad = parse_header_region(b"GET /a%2 HTTP/1.1\r\nHost: x\r\n");
    assert!(bad.is_err());
}

#[test]
fn unknown_method_is_rejected() {
    let result = parse_header_region(b"FETCH / HTTP/1.1\r\nHost: x\r\n");
    assert!(result.is_err());
}

#[test]
fn wrong_version_is_rejected() {
    let result = parse_header_region(b"GET / HTTP/1.0\r\nHost: x\r\n");
    assert!(result.is_err());
}
