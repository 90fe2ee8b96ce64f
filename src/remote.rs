//! Remote structured-extraction client.
//!
//! Drives an external scraping service (Firecrawl-style `/scrape`
//! endpoint) with platform-specific interaction steps and extraction
//! schemas, retrying transient failures with capped exponential
//! backoff. The wire seam is the [`ScrapeApi`] trait so the pipeline
//! can be tested without a network.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::ExtractionCache;
use crate::error::{ExtractionError, RemoteError, RemoteResult, Result};
use crate::normalize::{normalize, RawJobPayload};
use crate::platform::{PageAction, PlatformProfile};
use crate::security::UrlPolicy;
use crate::types::config::PipelineConfig;
use crate::types::options::ExtractOptions;
use crate::types::record::JobRecord;
use crate::validate::EssentialThresholds;

/// Backoff before the next attempt: `min(1000 * 2^(attempt-1), 10000)` ms.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    Duration::from_millis((1000u64 << exp).min(10_000))
}

// Wire types for the scrape API.

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub formats: Vec<String>,
    #[serde(rename = "onlyMainContent")]
    pub only_main_content: bool,
    #[serde(rename = "includeTags", skip_serializing_if = "Vec::is_empty")]
    pub include_tags: Vec<String>,
    #[serde(rename = "excludeTags", skip_serializing_if = "Vec::is_empty")]
    pub exclude_tags: Vec<String>,
    /// Per-call timeout in milliseconds, enforced service-side.
    pub timeout: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<PageAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractSpec {
    pub schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: Option<ScrapeData>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeData {
    pub markdown: Option<String>,
    pub extract: Option<serde_json::Value>,
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
}

/// Build the request payload for a URL: requested formats, tag filters,
/// platform interaction steps, and — for known platforms only — the
/// structured-extraction schema.
pub fn build_request(
    url: &str,
    options: &ExtractOptions,
    profile: &PlatformProfile,
) -> ScrapeRequest {
    let mut formats = options.formats.clone();
    let extract = if profile.is_generic() {
        None
    } else {
        if !formats.iter().any(|f| f == "extract") {
            formats.push("extract".to_string());
        }
        Some(ExtractSpec {
            schema: schema_json(profile),
        })
    };

    ScrapeRequest {
        url: url.to_string(),
        formats,
        only_main_content: options.only_main_content,
        include_tags: options.include_tags.clone(),
        exclude_tags: options.exclude_tags.clone(),
        timeout: options.timeout_ms,
        actions: profile.actions.clone(),
        extract,
    }
}

/// JSON-schema object for a platform profile. List fields become
/// string arrays; everything else is a described string.
fn schema_json(profile: &PlatformProfile) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    for (field, description) in &profile.schema {
        let prop = if field == "responsibilities" || field == "requirements" {
            serde_json::json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description,
            })
        } else {
            serde_json::json!({ "type": "string", "description": description })
        };
        properties.insert(field.clone(), prop);
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": profile.required_fields,
    })
}

/// A single scrape attempt against the remote service.
#[async_trait]
pub trait ScrapeApi: Send + Sync {
    async fn scrape(&self, request: &ScrapeRequest) -> RemoteResult<ScrapeData>;

    /// Name for logging and record metadata.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Production [`ScrapeApi`] over the Firecrawl HTTP API.
pub struct FirecrawlApi {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl FirecrawlApi {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout_ms: u64,
    ) -> RemoteResult<Self> {
        // Outer transport timeout; the service-side timeout rides in the
        // request body. Headroom covers queueing on the remote end.
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms.saturating_mul(2)))
            .build()
            .map_err(|e| RemoteError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
        })
    }

    /// Build from config; `None` when no API key is configured.
    pub fn from_config(config: &PipelineConfig) -> RemoteResult<Option<Self>> {
        match &config.api_key {
            Some(key) => Ok(Some(Self::new(
                key.clone(),
                config.api_url.clone(),
                config.timeout_ms,
            )?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ScrapeApi for FirecrawlApi {
    async fn scrape(&self, request: &ScrapeRequest) -> RemoteResult<ScrapeData> {
        let endpoint = format!("{}/scrape", self.base_url);
        debug!(url = %request.url, endpoint = %endpoint, "remote scrape starting");

        let response = self
            .client
            .post(&endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout {
                        url: request.url.clone(),
                    }
                } else {
                    RemoteError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Http(Box::new(e)))?;

        if !body.success {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| "scrape failed".to_string()),
            });
        }

        body.data
            .ok_or_else(|| RemoteError::MalformedResponse("no data in response".to_string()))
    }

    fn name(&self) -> &str {
        "firecrawl"
    }
}

/// Client for the remote extraction path: cache consult, platform
/// profile resolution, retries with backoff, normalization.
///
/// This component never falls back on its own. A structurally
/// successful extraction that misses the essential-info bar is returned
/// with `has_essential_info = false`; the caller decides whether to run
/// the legacy scraper.
pub struct RemoteExtractionClient<A: ScrapeApi> {
    api: Option<A>,
    cache: Arc<ExtractionCache>,
    policy: UrlPolicy,
    max_retries: u32,
    thresholds: EssentialThresholds,
    total_requests: AtomicU64,
    errors: AtomicU64,
}

impl<A: ScrapeApi> RemoteExtractionClient<A> {
    /// `api = None` builds a degraded client that reports
    /// [`ExtractionError::RemoteUnavailable`] at call time; construction
    /// itself never fails.
    pub fn new(
        api: Option<A>,
        cache: Arc<ExtractionCache>,
        max_retries: u32,
        thresholds: EssentialThresholds,
    ) -> Self {
        Self {
            api,
            cache,
            policy: UrlPolicy::new(),
            max_retries: max_retries.max(1),
            thresholds,
            total_requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Replace the URL policy (tests, trusted internal hosts).
    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Remote call attempts made so far.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Failed remote call attempts so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Extract one URL through the remote service.
    pub async fn extract(&self, url: &str, options: &ExtractOptions) -> Result<JobRecord> {
        self.policy.check(url)?;

        let api = self.api.as_ref().ok_or(ExtractionError::RemoteUnavailable)?;

        let cache_key = options.cache_key(url);
        if !options.skip_cache {
            if let Some(hit) = self.cache.get(&cache_key) {
                debug!(url = %url, "extraction cache hit");
                return Ok(hit);
            }
        }

        let profile = PlatformProfile::for_url(url);
        debug!(url = %url, platform = %profile.platform, "classified URL");

        let request = build_request(url, options, &profile);
        let data = self.scrape_with_retries(api, &request).await?;

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("extractor".to_string(), api.name().to_string());
        if let Some(code) = data.metadata.as_ref().and_then(|m| m.status_code) {
            metadata.insert("http_status".to_string(), code.to_string());
        }

        let payload = RawJobPayload {
            url: url.to_string(),
            title: data.metadata.as_ref().and_then(|m| m.title.clone()),
            text: data.markdown.unwrap_or_default(),
            structured: data.extract,
            metadata,
        };

        let record = normalize(payload, profile.platform, &self.thresholds);

        if !record.has_essential_info {
            warn!(url = %url, "remote extraction is missing essential info");
        }

        if !options.skip_cache {
            self.cache.put(cache_key, record.clone());
        }

        Ok(record)
    }

    async fn scrape_with_retries(
        &self,
        api: &A,
        request: &ScrapeRequest,
    ) -> Result<ScrapeData> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.total_requests.fetch_add(1, Ordering::Relaxed);

            match api.scrape(request).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    self.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        url = %request.url,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "remote scrape attempt failed"
                    );

                    if attempt >= self.max_retries {
                        return Err(ExtractionError::RemoteFailed {
                            attempts: attempt,
                            source: e,
                        });
                    }

                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
        }
    }
}
