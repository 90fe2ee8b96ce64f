//! Pipeline configuration.
//!
//! All knobs have defaults so the pipeline can be constructed without
//! any environment. A missing API key does not fail construction; the
//! remote client degrades to permanently unavailable and errors only at
//! call time.

use secrecy::SecretString;
use std::time::Duration;

use crate::validate::EssentialThresholds;

/// Default base URL for the remote structured-scrape service.
pub const DEFAULT_API_URL: &str = "https://api.firecrawl.dev/v1";

/// Configuration for the whole extraction pipeline, owned by the
/// dependency-injection root of the consuming process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Remote service API key. `None` disables the remote client.
    pub api_key: Option<SecretString>,

    /// Remote service base URL.
    pub api_url: String,

    /// Per-call remote timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum remote call attempts per URL (including the first).
    pub max_retries: u32,

    /// Maximum in-flight extraction operations.
    pub concurrency: usize,

    /// URLs per batch group.
    pub batch_size: usize,

    /// Maximum age of a cache entry before it is considered stale.
    pub cache_max_age: Duration,

    /// Maximum number of cache entries.
    pub cache_max_size: usize,

    /// Delay between groups under normal error rates.
    pub group_delay: Duration,

    /// Delay between groups once the error rate crosses the threshold.
    pub degraded_delay: Duration,

    /// Running error rate above which the degraded delay kicks in.
    pub error_rate_threshold: f64,

    /// Run the legacy scraper when the remote result is missing or
    /// incomplete.
    pub fallback_enabled: bool,

    /// Essential-info length thresholds.
    pub thresholds: EssentialThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_ms: 30_000,
            max_retries: 3,
            concurrency: 5,
            batch_size: 5,
            cache_max_age: Duration::from_secs(3600),
            cache_max_size: 100,
            group_delay: Duration::from_millis(1000),
            degraded_delay: Duration::from_millis(2000),
            error_rate_threshold: 0.3,
            fallback_enabled: true,
            thresholds: EssentialThresholds::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a config with default values and no API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables, falling back to defaults for
    /// anything unset or unparseable.
    ///
    /// Recognized variables: `FIRECRAWL_API_KEY`, `FIRECRAWL_API_URL`,
    /// `EXTRACTION_TIMEOUT_MS`, `EXTRACTION_MAX_RETRIES`,
    /// `EXTRACTION_CONCURRENCY`, `EXTRACTION_BATCH_SIZE`,
    /// `EXTRACTION_CACHE_MAX_AGE_SECS`, `EXTRACTION_CACHE_MAX_SIZE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_key: std::env::var("FIRECRAWL_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            api_url: std::env::var("FIRECRAWL_API_URL").unwrap_or(defaults.api_url),
            timeout_ms: env_parse("EXTRACTION_TIMEOUT_MS", defaults.timeout_ms),
            max_retries: env_parse("EXTRACTION_MAX_RETRIES", defaults.max_retries),
            concurrency: env_parse("EXTRACTION_CONCURRENCY", defaults.concurrency),
            batch_size: env_parse("EXTRACTION_BATCH_SIZE", defaults.batch_size),
            cache_max_age: Duration::from_secs(env_parse(
                "EXTRACTION_CACHE_MAX_AGE_SECS",
                defaults.cache_max_age.as_secs(),
            )),
            cache_max_size: env_parse("EXTRACTION_CACHE_MAX_SIZE", defaults.cache_max_size),
            ..defaults
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the remote service base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the maximum remote attempts per URL.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the group size for batch processing.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Disable the legacy fallback scraper.
    pub fn without_fallback(mut self) -> Self {
        self.fallback_enabled = false;
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
