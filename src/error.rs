//! Error types for urlframe
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Only [`Error::QueryDecode`], [`Error::MissingAllowList`] and
//! [`Error::Interpolation`] abort a query outright. Every other failure met
//! while fetching, extracting or framing is recorded in the frame metadata so
//! the batch still yields one frame per query.

use thiserror::Error;

/// Message shown when authentication is configured without an allow-list
pub const MISSING_ALLOWED_HOSTS: &str =
    "Datasource is missing allowed hosts/URLs. Configure it in the datasource settings page.";

/// Message shown when a request targets a URL outside the allow-list
pub const URL_NOT_ALLOWED: &str = "requested URL is not allowed. To allow this URL, update the datasource config URL -> Allowed Hosts section";

/// Message shown for any root selector failure
pub const ROOT_DATA_PARSE: &str = "error parsing json root data";

/// The main error type for urlframe
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("error un-marshaling the query: {message}")]
    QueryDecode { message: String },

    #[error("{}", MISSING_ALLOWED_HOSTS)]
    MissingAllowList,

    #[error("error applying macros: {message}")]
    Interpolation { message: String },

    // ============================================================================
    // Security Errors
    // ============================================================================
    #[error("{message}")]
    InvalidCredential { message: String },

    #[error("{}", URL_NOT_ALLOWED)]
    Unauthorized,

    // ============================================================================
    // Fetch Errors
    // ============================================================================
    #[error("error getting response from {url}")]
    Network { url: String },

    #[error("{status_line}")]
    Upstream { status: u16, status_line: String },

    #[error("{message}")]
    Parse { message: String },

    #[error("{}", ROOT_DATA_PARSE)]
    InvalidPath { selector: String },

    // ============================================================================
    // Framing Errors
    // ============================================================================
    #[error("error building frame: {message}")]
    Framing { message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("OAuth2 error: {message}")]
    OAuth2 { message: String },

    #[error("JWT generation failed: {message}")]
    JwtGeneration { message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a query decode error
    pub fn query_decode(message: impl Into<String>) -> Self {
        Self::QueryDecode {
            message: message.into(),
        }
    }

    /// Create an interpolation error
    pub fn interpolation(message: impl Into<String>) -> Self {
        Self::Interpolation {
            message: message.into(),
        }
    }

    /// Create an invalid credential error
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential {
            message: message.into(),
        }
    }

    /// Create a network error for the given (redacted) URL
    pub fn network(url: impl Into<String>) -> Self {
        Self::Network { url: url.into() }
    }

    /// Create an upstream error from a status code
    pub fn upstream(status: reqwest::StatusCode) -> Self {
        let status_line = match status.canonical_reason() {
            Some(reason) => format!("{} {reason}", status.as_u16()),
            None => status.as_u16().to_string(),
        };
        Self::Upstream {
            status: status.as_u16(),
            status_line,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(selector: impl Into<String>) -> Self {
        Self::InvalidPath {
            selector: selector.into(),
        }
    }

    /// Create a framing error
    pub fn framing(message: impl Into<String>) -> Self {
        Self::Framing {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error aborts the query before any frame data is produced
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Error::QueryDecode { .. } | Error::MissingAllowList | Error::Interpolation { .. }
        )
    }

    /// HTTP status associated with this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            Error::Unauthorized => Some(401),
            _ => None,
        }
    }
}

/// Result type alias for urlframe
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
