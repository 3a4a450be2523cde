pub use crate::error::{Result, ServerError};
pub use mio::{
    Events, Interest, Poll, Token,
    event::Event,
    net::{TcpListener, TcpStream},
};
pub use proxy_log::{debug, errors, info, trace, warn};
pub use std::collections::HashMap;
pub use std::fs::File;
pub use std::io::{ErrorKind, Read, Write};
pub use std::net::SocketAddr;
pub use std::path::{Path, PathBuf};
pub use std::time::{Duration, Instant};

/// Size of the scratch buffer used for each non-blocking `read()` call.
pub const READ_BUF_SIZE: usize = 4096;

// 4xx Client Errors
pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_FORBIDDEN: u16 = 403;
pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_METHOD_NOT_ALLOWED: u16 = 405;
pub const HTTP_REQUEST_HEADER_FIELDS_TOO_LARGE: u16 = 431;

// 5xx Server Errors
pub const HTTP_INTERNAL_SERVER_ERROR: u16 = 500;
pub const HTTP_NOT_IMPLEMENTED: u16 = 501;

pub const HTTP_OK: u16 = 200;

/// `HEADERS_BUFF_SIZE` (spec §3): fixed header accumulation buffer,
/// 8192 bytes with 1 held back as a guard (8191 usable).
pub const HEADERS_BUFF_SIZE: usize = 8192;

/// `BODY_IN_FILE_THRESHOLD` (spec §3/§4.8): bodies larger than this
/// spill to an anonymous temp file instead of a heap buffer.
pub const BODY_IN_FILE_THRESHOLD: usize = 1024 * 1024;

/// Initial capacity of a connection's outbound buffer (spec §4.4),
/// doubled on overflow.
pub const OUTBOUND_BUFFER_INITIAL: usize = 4096;

/// `EPOLL_CHECK_INTERVAL_MS` (spec §4.1): poll timeout used whenever an
/// idle timeout is configured, so the sweeper gets a chance to run.
pub const EPOLL_CHECK_INTERVAL_MS: u64 = 5000;
