//! Signal-driven graceful shutdown (spec §6/§9). Spec §9 explicitly
//! calls out the classic "global server handle mutated from a signal
//! handler" hazard and asks for a self-pipe or atomic flag instead.
//! This uses `signal_hook`'s low-level pipe registration: the signal
//! handler itself only ever writes one byte to a pre-made pipe, which
//! is the one `async-signal-safe` thing it's allowed to do. The read
//! end is a plain `mio` source registered into the same `Poll` as
//! everything else, so "a signal arrived" becomes an ordinary
//! readiness event instead of asynchronous state mutation.

use std::io::{self, Read};
use std::os::unix::net::UnixStream as StdUnixStream;

use mio::net::UnixStream;
use mio::{Interest, Token};
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::mux::Multiplexer;

pub struct ShutdownSignals {
    read_end: UnixStream,
}

impl ShutdownSignals {
    pub fn register(mux: &Multiplexer, token: Token) -> io::Result<Self> {
        let (read_end, write_end) = StdUnixStream::pair()?;
        read_end.set_nonblocking(true)?;
        write_end.set_nonblocking(true)?;

        signal_hook::low_level::pipe::register(SIGINT, write_end.try_clone()?)?;
        signal_hook::low_level::pipe::register(SIGTERM, write_end)?;

        let mut read_end = UnixStream::from_std(read_end);
        mux.register(&mut read_end, token, Interest::READABLE)?;
        Ok(Self { read_end })
    }

    /// Drains the pipe. Any byte at all means a shutdown signal fired;
    /// which signal it was doesn't matter, so the byte value is
    /// discarded.
    pub fn poll_shutdown(&mut self) -> bool {
        let mut buf = [0u8; 16];
        let mut signaled = false;
        loop {
            match self.read_end.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => signaled = true,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        signaled
    }
}
