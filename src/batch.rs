//! Batch orchestration.
//!
//! Fans a list of URLs out in fixed-size groups under a bounded
//! concurrency cap, runs the remote-then-fallback pipeline per URL,
//! and adapts the inter-group delay to the observed error rate so a
//! failing upstream is not hammered. A single URL's failure never
//! aborts the batch.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::ExtractionCache;
use crate::error::{ExtractionError, Result};
use crate::limiter::ConcurrencyLimiter;
use crate::remote::{FirecrawlApi, RemoteExtractionClient, ScrapeApi};
use crate::scraper::{FallbackScraper, LegacyHeuristicScraper};
use crate::types::batch::{BatchFailure, BatchOutcome, BatchSuccess, BatchSummary};
use crate::types::config::PipelineConfig;
use crate::types::options::ExtractOptions;
use crate::types::record::JobRecord;

/// Orchestrates batches of URLs through the extraction pipeline.
pub struct BatchOrchestrator<A: ScrapeApi, F: FallbackScraper> {
    remote: Arc<RemoteExtractionClient<A>>,
    fallback: Arc<F>,
    limiter: Arc<ConcurrencyLimiter>,
    batch_size: usize,
    group_delay: Duration,
    degraded_delay: Duration,
    error_rate_threshold: f64,
    fallback_enabled: bool,
}

impl BatchOrchestrator<FirecrawlApi, LegacyHeuristicScraper> {
    /// Wire the production pipeline from configuration. A missing API
    /// key still constructs successfully; the remote path then degrades
    /// to the legacy scraper at call time.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let api =
            FirecrawlApi::from_config(config).map_err(|e| ExtractionError::Config(Box::new(e)))?;

        let cache = Arc::new(ExtractionCache::new(
            config.cache_max_age,
            config.cache_max_size,
        ));
        let remote = Arc::new(RemoteExtractionClient::new(
            api,
            cache,
            config.max_retries,
            config.thresholds,
        ));
        let fallback = Arc::new(
            LegacyHeuristicScraper::new(config.thresholds)
                .map_err(|e| ExtractionError::Config(Box::new(e)))?,
        );
        let limiter = Arc::new(ConcurrencyLimiter::new(config.concurrency));

        Ok(Self::new(remote, fallback, limiter, config))
    }
}

impl<A: ScrapeApi, F: FallbackScraper> BatchOrchestrator<A, F> {
    /// Assemble from explicitly injected components.
    pub fn new(
        remote: Arc<RemoteExtractionClient<A>>,
        fallback: Arc<F>,
        limiter: Arc<ConcurrencyLimiter>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            remote,
            fallback,
            limiter,
            batch_size: config.batch_size.max(1),
            group_delay: config.group_delay,
            degraded_delay: config.degraded_delay,
            error_rate_threshold: config.error_rate_threshold,
            fallback_enabled: config.fallback_enabled,
        }
    }

    /// Process a batch of URLs. Every submitted index appears exactly
    /// once across `succeeded`/`failed`, in submission order.
    pub async fn process_batch(&self, urls: &[String], options: &ExtractOptions) -> BatchOutcome {
        let batch_id = Uuid::new_v4();
        let started = Instant::now();

        info!(
            batch_id = %batch_id,
            total_urls = urls.len(),
            batch_size = self.batch_size,
            concurrency = self.limiter.max_slots(),
            "batch processing starting"
        );

        let mut succeeded: Vec<BatchSuccess> = Vec::new();
        let mut failed: Vec<BatchFailure> = Vec::new();

        for (group_index, group) in urls.chunks(self.batch_size).enumerate() {
            // Adaptive backpressure between groups.
            if group_index > 0 {
                let processed = succeeded.len() + failed.len();
                let delay = self.pacing_delay(failed.len(), processed);
                debug!(
                    batch_id = %batch_id,
                    group = group_index,
                    failed = failed.len(),
                    processed = processed,
                    delay_ms = delay.as_millis() as u64,
                    "pausing before next group"
                );
                tokio::time::sleep(delay).await;
            }

            let base_index = group_index * self.batch_size;
            let results = join_all(group.iter().enumerate().map(|(offset, url)| {
                let index = base_index + offset;
                async move {
                    let _slot = self.limiter.acquire().await;
                    let result = self.extract_single(url, options).await;
                    (index, url.clone(), result)
                }
            }))
            .await;

            // join_all preserves input order, so results land in
            // submission order regardless of completion order.
            for (index, url, result) in results {
                match result {
                    Ok(record) => succeeded.push(BatchSuccess { url, index, record }),
                    Err(e) => {
                        warn!(batch_id = %batch_id, url = %url, error = %e, "URL failed");
                        failed.push(BatchFailure {
                            url,
                            index,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let summary = BatchSummary {
            total_urls: urls.len(),
            success_count: succeeded.len(),
            error_count: failed.len(),
            duration: started.elapsed(),
        };

        let outcome = BatchOutcome {
            succeeded,
            failed,
            summary,
        };

        info!(
            batch_id = %batch_id,
            total_urls = outcome.summary.total_urls,
            success_count = outcome.summary.success_count,
            error_count = outcome.summary.error_count,
            duration_ms = outcome.summary.duration.as_millis() as u64,
            "batch processing completed"
        );

        outcome
    }

    /// Legacy-compatible entry point: labeled text blocks joined with a
    /// `---` delimiter, ready for prompt inclusion.
    pub async fn extract_multiple_text(
        &self,
        urls: &[String],
        options: &ExtractOptions,
    ) -> String {
        self.process_batch(urls, options).await.to_prompt_text()
    }

    /// Inter-group delay for the observed running error rate.
    fn pacing_delay(&self, failed: usize, processed: usize) -> Duration {
        if processed == 0 {
            return self.group_delay;
        }
        let error_rate = failed as f64 / processed as f64;
        if error_rate > self.error_rate_threshold {
            self.degraded_delay
        } else {
            self.group_delay
        }
    }

    /// Run the full single-URL pipeline: remote extraction, then the
    /// legacy scraper when the remote path fails or comes back without
    /// essential info.
    async fn extract_single(&self, url: &str, options: &ExtractOptions) -> Result<JobRecord> {
        match self.remote.extract(url, options).await {
            Ok(record) if record.has_essential_info || !self.fallback_enabled => Ok(record),
            Ok(partial) => {
                debug!(url = %url, "remote record incomplete; trying legacy scraper");
                match self.fallback.fetch_and_extract(url).await {
                    Ok(record) => Ok(record),
                    Err(e) => {
                        warn!(url = %url, error = %e, "fallback failed; keeping partial record");
                        Ok(partial)
                    }
                }
            }
            Err(e) if self.fallback_enabled => {
                warn!(url = %url, error = %e, "remote extraction failed; trying legacy scraper");
                Ok(self.fallback.fetch_and_extract(url).await?)
            }
            Err(e) => Err(e),
        }
    }
}
