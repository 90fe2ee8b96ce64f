//! Job-Posting Extraction Pipeline
//!
//! Turns job-posting URLs into normalized, structured records. The
//! pipeline classifies each URL by hosting platform, drives a remote
//! structured-scrape service with platform-specific schemas and page
//! actions, and falls back to a direct-HTML heuristic scraper when the
//! remote path fails or comes back without the essential fields.
//!
//! # Design Philosophy
//!
//! - Remote-first, heuristics as a safety net
//! - Partial records over dropped URLs
//! - Submission order in, submission order out
//! - Library handles mechanics, app handles semantics
//!
//! # Usage
//!
//! ```rust,ignore
//! use job_extraction::{BatchOrchestrator, ExtractOptions, PipelineConfig};
//!
//! let config = PipelineConfig::from_env();
//! let orchestrator = BatchOrchestrator::from_config(&config)?;
//!
//! let urls = vec!["https://empresa.gupy.io/jobs/12345".to_string()];
//! let outcome = orchestrator.process_batch(&urls, &ExtractOptions::default()).await;
//!
//! // Or the prompt-ready text form:
//! let text = orchestrator.extract_multiple_text(&urls, &ExtractOptions::default()).await;
//! ```
//!
//! # Modules
//!
//! - [`platform`] - URL-to-platform classification and extraction profiles
//! - [`remote`] - Remote scrape client with retries and backoff
//! - [`scraper`] - Legacy direct-HTML heuristic fallback
//! - [`normalize`] - Raw payload to [`types::record::JobRecord`] normalization
//! - [`batch`] - Batch orchestration with adaptive pacing
//! - [`cache`] - In-memory TTL extraction cache
//! - [`limiter`] - Bounded-concurrency slot limiter
//! - [`security`] - Outbound-URL policy (SSRF protection)
//! - [`testing`] - Mock implementations for testing

pub mod batch;
pub mod cache;
pub mod error;
pub mod limiter;
pub mod normalize;
pub mod platform;
pub mod remote;
pub mod scraper;
pub mod security;
pub mod testing;
pub mod types;
pub mod validate;

// Re-export core types at crate root
pub use batch::BatchOrchestrator;
pub use cache::{CacheStats, ExtractionCache};
pub use error::{ExtractionError, FetchError, RemoteError, Result, SecurityError};
pub use limiter::ConcurrencyLimiter;
pub use platform::{Platform, PlatformProfile};
pub use remote::{FirecrawlApi, RemoteExtractionClient, ScrapeApi};
pub use scraper::{FallbackScraper, LegacyHeuristicScraper};
pub use security::UrlPolicy;
pub use types::batch::{BatchFailure, BatchOutcome, BatchSuccess, BatchSummary};
pub use types::config::PipelineConfig;
pub use types::options::ExtractOptions;
pub use types::record::JobRecord;
pub use validate::{has_essential_info, EssentialThresholds};
