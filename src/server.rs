//! Wires C1–C9 together: the piece spec §2's "Data flow" line describes
//! end to end but spec.md itself never names as a single component,
//! since every module it documents is a collaborator the loop drives.
//! `Server::run` is the single-threaded cooperative scheduler spec §5
//! requires — one thread, one `Poll`, every callback invoked inline.

use std::io::{ErrorKind, Read};
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Instant;

use mio::net::TcpStream;
use mio::{Interest, Token};
use proxy_log::{errors, info};

use crate::config::Config;
use crate::conn::{self, ConnectionTable};
use crate::error::Result;
use crate::http::{HttpConn, Responder};
use crate::listener;
use crate::mux::Multiplexer;
use crate::prelude::READ_BUF_SIZE;
use crate::router::StaticFileRouter;
use crate::signal::ShutdownSignals;
use crate::sweeper;

/// Event-buffer capacity handed to the multiplexer; unrelated to the
/// number of live connections, which `ConnectionTable`'s slab grows to
/// fit.
const MAX_EVENTS: usize = 1024;

/// Reserved tokens outside the slab's key space (`slab` keys start at 0
/// and climb), per spec §9's call for a stable, non-aliasing identity
/// for the listener and the shutdown self-pipe.
const LISTENER_TOKEN: Token = Token(usize::MAX);
const SHUTDOWN_TOKEN: Token = Token(usize::MAX - 1);

pub struct Server {
    config: Rc<Config>,
    mux: Multiplexer,
    listener: mio::net::TcpListener,
    table: ConnectionTable<HttpConn>,
    router: StaticFileRouter,
    shutdown: ShutdownSignals,
    /// Tokens closed during the current batch, freed once every event
    /// in that batch has been drained (spec §4.3's "memory ... is
    /// reclaimed by the event loop after all of its pending events in
    /// the current batch have been drained").
    pending_removals: Vec<Token>,
    running: bool,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        let config = Rc::new(config);
        let mux = Multiplexer::new(MAX_EVENTS)?;

        let mut listener = listener::bind(config.port)?;
        mux.register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        let shutdown = ShutdownSignals::register(&mux, SHUTDOWN_TOKEN)?;
        let router = StaticFileRouter::new(Rc::clone(&config));

        Ok(Self {
            config,
            mux,
            listener,
            table: ConnectionTable::new(),
            router,
            shutdown,
            pending_removals: Vec::new(),
            running: true,
        })
    }

    /// Clears the running flag (spec §5 "Cancellation"). The current
    /// batch still runs to completion; the loop exits before the next
    /// `wait()`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn run(&mut self) -> Result<()> {
        info!(
            "listening on 0.0.0.0:{} (webroot {})",
            self.config.port,
            self.config.webroot.display()
        );

        while self.running {
            let idle_enabled = !self.config.idle_timeout.is_zero();
            let batch: Vec<(Token, bool, bool)> = {
                let events = self.mux.wait(idle_enabled)?;
                events.iter().map(|e| (e.token(), e.is_readable(), e.is_writable())).collect()
            };

            // Spec §5 "Ordering": events for distinct connections are
            // processed in kernel-reported order; for one connection,
            // readable before writable within a batch.
            for (token, readable, writable) in batch {
                if token == LISTENER_TOKEN {
                    // Spec §7: a listening-socket/multiplexer error is
                    // not a per-connection failure domain — propagate
                    // it out of the event loop instead of logging and
                    // spinning on a now-useless listener.
                    self.accept_connections()?;
                    continue;
                }
                if token == SHUTDOWN_TOKEN {
                    if self.shutdown.poll_shutdown() {
                        info!("shutdown signal received, draining current batch");
                        self.running = false;
                    }
                    continue;
                }
                if self.table.is_closed(token) {
                    continue;
                }
                if readable {
                    self.handle_readable(token);
                }
                if writable && !self.table.is_closed(token) {
                    self.handle_writable(token);
                }
            }

            for token in self.pending_removals.drain(..) {
                self.table.remove(token);
            }

            sweeper::sweep(&mut self.table, &self.mux, self.config.idle_timeout, Instant::now(), |table, tok| {
                table.remove(tok);
            });
        }

        self.destroy();
        Ok(())
    }

    /// Only valid once `stop()` has taken effect and `run()` has
    /// returned: closes every remaining connection, then releases the
    /// multiplexer and listening socket (spec §5 "Cancellation").
    fn destroy(&mut self) {
        while let Some(token) = self.table.oldest() {
            self.close(token);
        }
        for token in self.pending_removals.drain(..) {
            self.table.remove(token);
        }
        let _ = self.mux.unregister(&mut self.listener);
    }

    fn accept_connections(&mut self) -> Result<()> {
        let mut accepted: Vec<(TcpStream, SocketAddr)> = Vec::new();
        // Any connections already accepted before a listener-socket
        // error surfaced are still registered and tracked; only the
        // error itself is propagated once the drain is done.
        let accept_result = listener::accept_all(&self.listener, |stream, addr| accepted.push((stream, addr)));

        for (stream, addr) in accepted {
            let peer = addr.to_string();
            let token = self.table.insert(stream, peer.clone(), HttpConn::new());

            let registered = {
                let table = &mut self.table;
                let mux = &self.mux;
                match table.get_mut(token) {
                    Some(conn) => mux.register(&mut conn.stream, token, Interest::READABLE).is_ok(),
                    None => false,
                }
            };

            if !registered {
                errors!("failed to register connection from {peer}");
                self.table.mark_closed(token);
                self.table.remove(token);
                continue;
            }

            info!("accepted connection from {peer}");
        }

        accept_result?;
        Ok(())
    }

    /// Reads until `WouldBlock` (edge-triggered draining, spec §4.1),
    /// feeds whatever arrived through the HTTP framing state machine,
    /// and closes the connection on EOF, a fatal read error, or a
    /// framing-level decision to close.
    fn handle_readable(&mut self, token: Token) {
        let mut chunk = Vec::new();
        let mut peer_closed = false;

        loop {
            let table = &mut self.table;
            let Some(conn) = table.get_mut(token) else { return };
            let mut buf = [0u8; READ_BUF_SIZE];
            match conn.stream.read(&mut buf) {
                Ok(0) => {
                    peer_closed = true;
                    break;
                }
                Ok(n) => chunk.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => {
                    peer_closed = true;
                    break;
                }
            }
        }

        if !chunk.is_empty() {
            self.table.touch(token);
            self.feed(token, &chunk);
        }

        if peer_closed && !self.table.is_closed(token) {
            self.close(token);
        }
    }

    /// Hands `chunk` to the connection's `HttpConn`, buffering whatever
    /// responses the dispatch callback produces and sending them
    /// through the C4 write path once the callback returns — avoiding
    /// two callbacks needing simultaneous mutable access to the same
    /// connection table.
    fn feed(&mut self, token: Token, chunk: &[u8]) {
        let Some(conn) = self.table.get_mut(token) else { return };
        let mut proto = std::mem::take(&mut conn.protocol);

        let mut outbox: Vec<Vec<u8>> = Vec::new();
        let must_close;
        {
            let mut send_fn = |bytes: &[u8]| outbox.push(bytes.to_vec());
            let mut close_fn = || {};
            let mut responder = Responder::new(&mut send_fn, &mut close_fn);
            must_close = proto.on_data(chunk, &mut self.router, &mut responder);
        }

        if let Some(conn) = self.table.get_mut(token) {
            conn.protocol = proto;
        }

        let mut alive = true;
        for bytes in &outbox {
            if !conn::send(&mut self.table, &self.mux, token, bytes) {
                alive = false;
                break;
            }
        }

        if must_close || !alive {
            self.close(token);
        }
    }

    fn handle_writable(&mut self, token: Token) {
        if conn::drain_writable(&mut self.table, &self.mux, token).is_err() {
            self.close(token);
        }
    }

    /// C3's close protocol: unregister from the multiplexer, mark
    /// closed (detaching it from the LRU list immediately), and queue
    /// the slot for removal once the current batch has finished with
    /// it. Idempotent.
    fn close(&mut self, token: Token) {
        if self.table.is_closed(token) {
            return;
        }
        {
            let table = &mut self.table;
            let mux = &self.mux;
            if let Some(conn) = table.get_mut(token) {
                let _ = mux.unregister(&mut conn.stream);
            }
        }
        self.table.mark_closed(token);
        self.pending_removals.push(token);
    }
}
