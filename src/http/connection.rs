//! C6 — the per-connection HTTP framing state machine. Consumes bytes
//! the transport hands it chunk by chunk, accumulates a header region
//! until CRLFCRLF, parses it, reads whatever body `Content-Length`
//! promised, dispatches, and resets for the next request — including
//! immediately re-entering this same logic when a pipelined request's
//! bytes are already sitting in the buffer (spec §4.6 "Dispatch and
//! reset").

use crate::http::body::BodyStore;
use crate::http::dispatch::{Dispatch, Responder};
use crate::http::request::{parse_header_region, BodyLocation, ParseError, ParsedRequest};
use crate::prelude::HEADERS_BUFF_SIZE;

/// Usable header capacity: the full buffer minus the 1-byte guard
/// spec §3 reserves.
const MAX_HEADER: usize = HEADERS_BUFF_SIZE - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramingState {
    ReadingHeaders,
    ReadingBody,
}

pub struct HttpConn {
    /// Bytes received but not yet attributed to a dispatched request:
    /// the in-progress header block while `ReadingHeaders`, or
    /// in-progress body bytes (and any pipelined tail) while
    /// `ReadingBody`.
    buf: Vec<u8>,
    header_region_len: usize,
    state: FramingState,
    request: Option<ParsedRequest>,
    body_expected: usize,
    body_received: usize,
    body: BodyStore,
}

impl HttpConn {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            header_region_len: 0,
            state: FramingState::ReadingHeaders,
            request: None,
            body_expected: 0,
            body_received: 0,
            body: BodyStore::Empty,
        }
    }

    #[cfg(test)]
    fn header_region_len(&self) -> usize {
        self.header_region_len
    }

    #[cfg(test)]
    fn is_reading_headers(&self) -> bool {
        self.state == FramingState::ReadingHeaders
    }

    /// Feeds newly read bytes through the state machine, dispatching
    /// zero or more complete requests (pipelining). Returns `true` once
    /// the connection must close — a parse failure, an explicit
    /// `Connection: close`, or the handler closing it itself.
    pub fn on_data(&mut self, chunk: &[u8], dispatch: &mut dyn Dispatch, responder: &mut Responder) -> bool {
        self.buf.extend_from_slice(chunk);

        loop {
            match self.state {
                FramingState::ReadingHeaders => {
                    let Some(pos) = memchr::memmem::find(&self.buf, b"\r\n\r\n") else {
                        if self.buf.len() >= MAX_HEADER {
                            dispatch.on_bad_request(431, responder);
                            return true;
                        }
                        return false;
                    };

                    self.header_region_len = pos + 4;
                    // `pos` points at the *start* of the terminating
                    // `\r\n\r\n`, so `&self.buf[..pos]` would strip the
                    // last header line's own CRLF along with the blank
                    // line — `parse_headers`' CRLF-terminated-line scan
                    // would then fail to find a terminator for that last
                    // header and report it malformed. Slice at `pos + 2`
                    // to keep that header's CRLF while still excluding
                    // the blank line itself.
                    let parsed = parse_header_region(&self.buf[..pos + 2]);
                    self.buf.drain(..self.header_region_len);
                    self.header_region_len = 0;

                    let mut request = match parsed {
                        Ok(r) => r,
                        Err(e) => return self.fail(e, dispatch, responder),
                    };

                    let body_expected = match request.content_length() {
                        Ok(v) => v.unwrap_or(0),
                        Err(e) => return self.fail(e, dispatch, responder),
                    };

                    if body_expected == 0 {
                        // Spec §9(a): zero-length body is "no body".
                        request.body_location = BodyLocation::None;
                        self.request = Some(request);
                        if self.dispatch_and_reset(dispatch, responder) {
                            return true;
                        }
                        continue;
                    }

                    self.body = match BodyStore::init(body_expected) {
                        Ok(store) => store,
                        Err(_) => return self.fail(ParseError::Internal, dispatch, responder),
                    };
                    request.body_location = self.body.location();
                    self.request = Some(request);
                    self.body_expected = body_expected;
                    self.body_received = 0;
                    self.state = FramingState::ReadingBody;
                }

                FramingState::ReadingBody => {
                    let remaining = self.body_expected - self.body_received;
                    let take = remaining.min(self.buf.len());
                    if take > 0 {
                        let bytes: Vec<u8> = self.buf.drain(..take).collect();
                        if self.body.write(&bytes).is_err() {
                            return self.fail(ParseError::Internal, dispatch, responder);
                        }
                        self.body_received += take;
                    }

                    if self.body_received < self.body_expected {
                        return false;
                    }

                    if self.body.finalize().is_err() {
                        return self.fail(ParseError::Internal, dispatch, responder);
                    }
                    if self.dispatch_and_reset(dispatch, responder) {
                        return true;
                    }
                }
            }
        }
    }

    fn fail(&mut self, e: ParseError, dispatch: &mut dyn Dispatch, responder: &mut Responder) -> bool {
        if e == ParseError::Internal {
            dispatch.on_server_error(responder);
        } else {
            dispatch.on_bad_request(e.status_code(), responder);
        }
        true
    }

    /// Invokes `on_request`, then resets per-request state for the
    /// next cycle. Returns whether the connection is now closed —
    /// either because the request asked for `Connection: close` or the
    /// handler closed it from inside the callback.
    fn dispatch_and_reset(&mut self, dispatch: &mut dyn Dispatch, responder: &mut Responder) -> bool {
        let request = self.request.take().expect("request set before dispatch");
        let wants_close = request.wants_close();

        // The body store is handed over as-is rather than eagerly
        // copied into a `Vec` here: `request.body_location` already
        // tells a handler whether it's looking at a heap buffer or a
        // temp file, and only a handler that actually wants the bytes
        // pays the cost of materializing a file-backed body (see
        // `BodyStore::read_to_end`'s doc comment).
        dispatch.on_request(&request, &mut self.body, responder);

        self.body = BodyStore::Empty;
        self.body_expected = 0;
        self.body_received = 0;
        self.state = FramingState::ReadingHeaders;

        if wants_close {
            responder.close_conn();
        }
        responder.is_closed()
    }
}

impl Default for HttpConn {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Noop;

    impl Dispatch for Noop {
        fn on_request(&mut self, _request: &ParsedRequest, _body: &mut BodyStore, responder: &mut Responder) {
            responder.send_data(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        }
    }

    fn feed(conn: &mut HttpConn, bytes: &[u8]) -> bool {
        let mut dispatch = Noop;
        let mut send_fn = |_: &[u8]| {};
        let mut close_fn = || {};
        let mut responder = Responder::new(&mut send_fn, &mut close_fn);
        conn.on_data(bytes, &mut dispatch, &mut responder)
    }

    #[test]
    fn partial_headers_stay_in_reading_headers_state() {
        let mut conn = HttpConn::new();
        feed(&mut conn, b"GET / HTTP/1.1\r\nHost: x\r\n");

        assert!(conn.is_reading_headers());
        assert!(conn.header_region_len() == 0);
    }

    #[test]
    fn header_region_resets_once_a_request_is_dispatched() {
        let mut conn = HttpConn::new();
        feed(&mut conn, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");

        assert!(conn.is_reading_headers());
        assert_eq!(conn.header_region_len(), 0);
    }
}
