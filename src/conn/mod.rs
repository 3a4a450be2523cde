//! C3 — the connection record and its LRU activity list, and C4 — the
//! non-blocking write path built on top of it.
//!
//! Connections live in a [`slab::Slab`] keyed by the same index used as
//! their `mio::Token`, per spec §9's guidance to prefer an arena with
//! stable indices over a pointer-based list: freeing one never
//! invalidates another connection's token, and a closed connection can
//! be detached from the LRU list immediately while its slot lingers
//! until the caller is done with the current event batch.

mod outbuf;

pub use outbuf::OutBuffer;

use mio::net::TcpStream;
use mio::{Interest, Token};
use slab::Slab;
use std::io::{self, ErrorKind, Write};
use std::time::Instant;

use crate::mux::Multiplexer;

pub struct Connection<P> {
    pub stream: TcpStream,
    pub peer_addr: String,
    pub protocol: P,
    pub last_activity: Instant,
    pub out: OutBuffer,
    pub is_closed: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

/// An arena of connections plus an intrusive doubly linked list over it
/// ordered by `last_activity`, head = oldest.
pub struct ConnectionTable<P> {
    slab: Slab<Connection<P>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<P> Default for ConnectionTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ConnectionTable<P> {
    pub fn new() -> Self {
        Self { slab: Slab::new(), head: None, tail: None }
    }

    pub fn insert(&mut self, stream: TcpStream, peer_addr: String, protocol: P) -> Token {
        let key = self.slab.insert(Connection {
            stream,
            peer_addr,
            protocol,
            last_activity: Instant::now(),
            out: OutBuffer::new(),
            is_closed: false,
            prev: self.tail,
            next: None,
        });
        self.link_tail(key);
        Token(key)
    }

    pub fn get(&self, token: Token) -> Option<&Connection<P>> {
        self.slab.get(token.0)
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection<P>> {
        self.slab.get_mut(token.0)
    }

    pub fn contains(&self, token: Token) -> bool {
        self.slab.contains(token.0)
    }

    /// Moves `token` to the tail (most recently active) of the LRU
    /// list. Called on any read or write activity, per spec §4.3.
    pub fn touch(&mut self, token: Token) {
        if !self.slab.contains(token.0) {
            return;
        }
        self.unlink(token.0);
        self.link_tail(token.0);
        self.slab[token.0].last_activity = Instant::now();
    }

    fn unlink(&mut self, key: usize) {
        let (prev, next) = {
            let conn = &self.slab[key];
            (conn.prev, conn.next)
        };
        match prev {
            Some(p) => self.slab[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slab[n].prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_tail(&mut self, key: usize) {
        let old_tail = self.tail;
        {
            let conn = &mut self.slab[key];
            conn.prev = old_tail;
            conn.next = None;
        }
        match old_tail {
            Some(t) => self.slab[t].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
    }

    /// Detaches `token` from the LRU list and marks it closed, without
    /// freeing its slot. Idempotent. Satisfies the invariant that a
    /// closed connection is unreachable from the list the instant it's
    /// closed, even though the slab entry (and any events already
    /// queued for it this batch) survive until `remove`.
    pub fn mark_closed(&mut self, token: Token) {
        let Some(conn) = self.slab.get_mut(token.0) else { return };
        if conn.is_closed {
            return;
        }
        conn.is_closed = true;
        self.unlink(token.0);
    }

    pub fn is_closed(&self, token: Token) -> bool {
        self.slab.get(token.0).map(|c| c.is_closed).unwrap_or(true)
    }

    /// Frees the slot for a previously closed connection. Safe to call
    /// only once the caller is certain no further events for this
    /// token remain in the current batch.
    pub fn remove(&mut self, token: Token) -> Option<Connection<P>> {
        if self.slab.contains(token.0) { Some(self.slab.remove(token.0)) } else { None }
    }

    pub fn oldest(&self) -> Option<Token> {
        self.head.map(Token)
    }

    pub fn next_after(&self, token: Token) -> Option<Token> {
        self.slab.get(token.0).and_then(|c| c.next).map(Token)
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener as StdTcpListener;
    use std::net::TcpStream as StdTcpStream;

    /// A real (if unused) socket pair, since `Connection` holds a
    /// concrete `mio::net::TcpStream` rather than a generic transport.
    fn dummy_stream() -> TcpStream {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = StdTcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        server.set_nonblocking(true).unwrap();
        drop(client);
        TcpStream::from_std(server)
    }

    #[test]
    fn insert_appends_to_the_tail_and_oldest_returns_the_head() {
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let a = table.insert(dummy_stream(), "a".into(), ());
        let _b = table.insert(dummy_stream(), "b".into(), ());

        assert_eq!(table.oldest(), Some(a));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn touch_moves_a_connection_to_the_tail() {
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let a = table.insert(dummy_stream(), "a".into(), ());
        let b = table.insert(dummy_stream(), "b".into(), ());

        assert_eq!(table.oldest(), Some(a));
        table.touch(a);
        assert_eq!(table.oldest(), Some(b));
        assert_eq!(table.next_after(b), Some(a));
    }

    #[test]
    fn mark_closed_unlinks_without_freeing_the_slot() {
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let a = table.insert(dummy_stream(), "a".into(), ());
        let b = table.insert(dummy_stream(), "b".into(), ());

        table.mark_closed(a);
        assert!(table.is_closed(a));
        assert!(table.contains(a));
        assert_eq!(table.oldest(), Some(b));

        table.mark_closed(a);
        assert!(table.is_closed(a));
    }

    #[test]
    fn remove_frees_the_slot_and_is_idempotent() {
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let a = table.insert(dummy_stream(), "a".into(), ());

        table.mark_closed(a);
        assert!(table.remove(a).is_some());
        assert!(!table.contains(a));
        assert!(table.remove(a).is_none());
    }
}

/// C4 — attempts a direct non-blocking send; on a full write, refreshes
/// the LRU entry. On a partial write or `WouldBlock`, buffers the
/// remainder and arms the writable interest. Any other I/O error marks
/// the connection closed and returns `false`.
pub fn send<P>(
    table: &mut ConnectionTable<P>,
    mux: &Multiplexer,
    token: Token,
    bytes: &[u8],
) -> bool {
    let Some(conn) = table.get_mut(token) else { return false };

    if conn.out.is_empty() {
        match conn.stream.write(bytes) {
            Ok(n) if n == bytes.len() => {
                table.touch(token);
                return true;
            }
            Ok(n) => {
                conn.out.append(&bytes[n..]);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                conn.out.append(bytes);
            }
            Err(_) => {
                table.mark_closed(token);
                return false;
            }
        }
    } else {
        conn.out.append(bytes);
    }

    let _ = mux.modify(&mut conn.stream, token, Interest::READABLE | Interest::WRITABLE);
    true
}

/// Drains as much of the outbound buffer as the socket will currently
/// accept. Returns `Ok(true)` once the buffer is fully drained (and
/// disables the writable interest), `Ok(false)` if bytes remain, and
/// `Err` if the connection should be closed.
pub fn drain_writable<P>(table: &mut ConnectionTable<P>, mux: &Multiplexer, token: Token) -> io::Result<bool> {
    let Some(conn) = table.get_mut(token) else { return Ok(true) };

    loop {
        let pending = conn.out.pending();
        if pending.is_empty() {
            break;
        }
        match conn.stream.write(pending) {
            Ok(0) => break,
            Ok(n) => conn.out.advance(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    if conn.out.is_empty() {
        mux.modify(&mut conn.stream, token, Interest::READABLE)?;
        table.touch(token);
        Ok(true)
    } else {
        Ok(false)
    }
}
