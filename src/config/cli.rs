use std::path::PathBuf;

use clap::Parser;

use super::types::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_PORT};

/// Command-line surface, exactly spec'd: port, idle timeout, a
/// browse-disable flag, help, and a positional web root. `clap`'s
/// defaults already give us the exit codes we need — 2 on a usage
/// error, 0 on `--help`.
#[derive(Debug, Parser)]
#[command(name = "webserv", about = "A non-blocking static file server")]
pub struct Args {
    /// TCP port to listen on.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Idle connection timeout in seconds; 0 disables eviction.
    #[arg(short = 't', long = "conn_timeout", default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub conn_timeout: u64,

    /// Disable directory listing (autoindex) for directories with no
    /// default file.
    #[arg(short = 'b', long = "no-browse")]
    pub no_browse: bool,

    /// Filesystem root to serve files from.
    pub webroot: PathBuf,
}
