use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_FILE: &str = "index.html";

/// Fully resolved server configuration: CLI flags layered with the
/// optional `config.yaml` overlay (see [`crate::config::yaml`]).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub idle_timeout: Duration,
    pub webroot: PathBuf,
    pub default_file: String,
    pub directory_listing: bool,
    pub mime_overrides: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            webroot: PathBuf::from("./www"),
            default_file: DEFAULT_FILE.to_string(),
            directory_listing: true,
            mime_overrides: HashMap::new(),
        }
    }
}
