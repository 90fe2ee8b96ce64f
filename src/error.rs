//! Typed errors for the job-extraction pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while extracting a single job posting.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No API credential configured; the remote client is permanently
    /// unavailable until one is provided.
    #[error("remote extraction service unavailable: no API key configured")]
    RemoteUnavailable,

    /// All remote attempts were exhausted.
    #[error("remote extraction failed after {attempts} attempts: {source}")]
    RemoteFailed {
        attempts: u32,
        #[source]
        source: RemoteError,
    },

    /// Direct fetch in the legacy fallback path failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// URL was rejected before any network activity began.
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error (e.g., HTTP client construction).
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a single remote scrape attempt.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service responded but reported failure
    #[error("scrape API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service returned a structurally unusable payload
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Remote call exceeded its deadline
    #[error("timeout scraping: {url}")]
    Timeout { url: String },
}

/// Errors from the legacy direct-HTML path.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (network, DNS, TLS)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success HTTP status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// URL rejected by security validation
    #[error("security error: {0}")]
    Security(#[from] SecurityError),
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, cloud metadata endpoints)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for remote scrape attempts.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Result type alias for legacy fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for security validation.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
