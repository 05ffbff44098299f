use std::time::Duration;
use thiserror::Error;

/// Error taxonomy for the resolution pipeline
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // I/O errors (startup, federation store loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Network errors at the HTTP client boundary
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // An external collaborator (DOI registry, unpaywall, linksolver)
    // could not be reached or did not answer in time
    #[error("Upstream unavailable: {service} - {reason}")]
    UpstreamUnavailable { service: String, reason: String },

    #[error("Upstream timeout after {timeout:?}: {service}")]
    UpstreamTimeout { service: String, timeout: Duration },

    // A target URL could not be parsed during WAYFless rewriting
    #[error("Malformed target URL: {url}")]
    MalformedTarget { url: String },

    // Parse errors (HTML scraping, federation store files)
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    // Client errors (permanent)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // General service error
    #[error("Service error: {0}")]
    Service(String),
}

impl Error {
    /// True for failures of an external collaborator, which the routing
    /// engine degrades from instead of surfacing to the end user.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::UpstreamUnavailable { .. }
                | Error::UpstreamTimeout { .. }
                | Error::Parse { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
