use core::fmt;
use std::{
    error::Error,
    fmt::{Debug, Display, Formatter},
};

use config_parser::ConfigError;

/// Crate-wide error for the startup path: argument parsing, binding the
/// listener, loading the optional YAML overlay, building the poller.
/// Never crosses into a connection's failure domain — see
/// [`crate::http::ParseError`] for that.
pub struct ServerError(pub Box<dyn Error + Send + Sync>);

impl Debug for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\r\x1b[K{self}")
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x1b[31mERROR\x1b[0m: {}", self.0)
    }
}

impl Error for ServerError {}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(e: std::net::AddrParseError) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<String> for ServerError {
    fn from(s: String) -> Self {
        ServerError(Box::new(std::io::Error::other(s)))
    }
}

impl From<&str> for ServerError {
    fn from(s: &str) -> Self {
        ServerError(Box::new(std::io::Error::other(s.to_string())))
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
