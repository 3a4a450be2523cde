//! C9 — the dispatch surface. Spec §9 notes the callback indirection
//! "maps cleanly to a small interface type with three methods,
//! carrying the opaque context" — that's exactly `Dispatch` below, with
//! the opaque context being whatever the implementor closes over.

use super::body::BodyStore;
use super::response::canonical_response;
use crate::http::request::ParsedRequest;

/// What a dispatch callback is handed to talk back to the transport.
/// Mirrors spec §4.9: `send_data` may be called any number of times,
/// `close_conn` at most meaningfully once.
pub struct Responder<'a> {
    send: &'a mut dyn FnMut(&[u8]),
    close: &'a mut dyn FnMut(),
    closed: bool,
}

impl<'a> Responder<'a> {
    pub fn new(send: &'a mut dyn FnMut(&[u8]), close: &'a mut dyn FnMut()) -> Self {
        Self { send, close, closed: false }
    }

    pub fn send_data(&mut self, bytes: &[u8]) {
        (self.send)(bytes)
    }

    pub fn close_conn(&mut self) {
        if !self.closed {
            (self.close)();
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// The three upcalls spec §4.9 requires. Default implementations are
/// the canonical minimal responses, matching "defaults when a callback
/// is absent" — `on_request` has no real default because a server with
/// nothing to serve isn't a server, but it still falls back to `501`
/// rather than failing to compile if a trait object forgets it.
///
/// `body` is handed over as the live `BodyStore` rather than a
/// pre-read `&[u8]`: `request.body_location` already tells a handler
/// whether it's a heap buffer or a temp file, and a handler that
/// doesn't care about the body (like this server's own static-file
/// router) never pays to materialize a large file-backed one. A
/// handler that does want the bytes calls `body.read_to_end()` itself.
pub trait Dispatch {
    fn on_request(&mut self, request: &ParsedRequest, body: &mut BodyStore, responder: &mut Responder) {
        let _ = (request, body);
        responder.send_data(&canonical_response(501));
        responder.close_conn();
    }

    fn on_bad_request(&mut self, status: u16, responder: &mut Responder) {
        responder.send_data(&canonical_response(status));
        responder.close_conn();
    }

    fn on_server_error(&mut self, responder: &mut Responder) {
        responder.send_data(&canonical_response(500));
        responder.close_conn();
    }
}
