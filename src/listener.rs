//! C2 — the listening endpoint. Binds `INADDR_ANY:port`, accepts
//! non-blocking connections until the kernel reports `WouldBlock`, and
//! hands each one to the caller to register and track.

use std::io;
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use socket2::{Domain, Protocol, Socket, Type};

use proxy_log::errors;

/// Creates a non-blocking listening socket with `SO_REUSEADDR` set,
/// backlog `SOMAXCONN`, wrapped for `mio` registration.
pub fn bind(port: u16) -> io::Result<TcpListener> {
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().map_err(io::Error::other)?;
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(i32::MAX)?;
    Ok(TcpListener::from_std(socket.into()))
}

/// Accepts every connection currently pending on `listener`, invoking
/// `on_accept` for each one, until the accept queue is drained
/// (`WouldBlock`). Per spec §7, a transport error on the listening
/// socket itself (as opposed to one accepted connection) is not a
/// per-connection failure domain — it's propagated so the caller can
/// exit the event loop rather than spin on a now-useless listener.
pub fn accept_all(listener: &TcpListener, mut on_accept: impl FnMut(TcpStream, SocketAddr)) -> io::Result<()> {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => on_accept(stream, addr),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                errors!("accept failed: {e}");
                return Err(e);
            }
        }
    }
}
