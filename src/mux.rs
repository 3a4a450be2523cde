//! C1 — the readiness multiplexer. A thin wrapper over `mio::Poll` that
//! owns the `Events` buffer and knows the two poll-timeout regimes the
//! event loop needs: bounded (so the idle sweeper gets to run) or
//! infinite (no timeout configured).

use std::io;
use std::time::Duration;

use mio::event::Source;
use mio::{Events, Interest, Poll, Token};

use crate::prelude::EPOLL_CHECK_INTERVAL_MS;

pub struct Multiplexer {
    poll: Poll,
    events: Events,
}

impl Multiplexer {
    pub fn new(max_events: usize) -> io::Result<Self> {
        Ok(Self { poll: Poll::new()?, events: Events::with_capacity(max_events) })
    }

    pub fn register<S: Source + ?Sized>(&self, source: &mut S, token: Token, interests: Interest) -> io::Result<()> {
        self.poll.registry().register(source, token, interests)
    }

    pub fn modify<S: Source + ?Sized>(&self, source: &mut S, token: Token, interests: Interest) -> io::Result<()> {
        self.poll.registry().reregister(source, token, interests)
    }

    pub fn unregister<S: Source + ?Sized>(&self, source: &mut S) -> io::Result<()> {
        self.poll.registry().deregister(source)
    }

    /// Blocks until at least one event is ready or `timeout` elapses.
    /// `idle_timeout_enabled` selects between a bounded wait (so the
    /// sweeper runs on a cadence even when nothing else is happening)
    /// and an unbounded one. Retries transparently on `EINTR` — signal
    /// delivery must not surface as an event-loop error.
    pub fn wait(&mut self, idle_timeout_enabled: bool) -> io::Result<&Events> {
        let timeout = idle_timeout_enabled.then(|| Duration::from_millis(EPOLL_CHECK_INTERVAL_MS));
        loop {
            match self.poll.poll(&mut self.events, timeout) {
                Ok(()) => return Ok(&self.events),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
