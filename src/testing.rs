//! Testing utilities including mock implementations.
//!
//! Useful for exercising the pipeline without a network or a paid
//! remote-service credential.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult, RemoteError, RemoteResult};
use crate::platform::Platform;
use crate::remote::{PageMetadata, ScrapeApi, ScrapeData, ScrapeRequest};
use crate::scraper::FallbackScraper;
use crate::types::record::JobRecord;
use crate::validate::EssentialThresholds;

enum ScriptedScrape {
    Payload(ScrapeData),
    Failure(String),
}

/// Mock remote scrape API with scripted per-URL responses.
///
/// Responses queue per URL and are consumed in order, so a URL can be
/// scripted to fail twice and then succeed. Calls are tracked for
/// assertions.
#[derive(Default)]
pub struct MockScrapeApi {
    responses: Arc<RwLock<HashMap<String, VecDeque<ScriptedScrape>>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Clone for MockScrapeApi {
    fn clone(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl MockScrapeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful payload for a URL.
    pub fn with_payload(self, url: impl Into<String>, data: ScrapeData) -> Self {
        self.responses
            .write()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(ScriptedScrape::Payload(data));
        self
    }

    /// Queue a failed attempt for a URL.
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(ScriptedScrape::Failure(message.into()));
        self
    }

    /// Queue `count` consecutive failures for a URL.
    pub fn with_failures(
        self,
        url: impl Into<String>,
        count: usize,
        message: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let message = message.into();
        {
            let mut responses = self.responses.write().unwrap();
            let queue = responses.entry(url).or_default();
            for _ in 0..count {
                queue.push_back(ScriptedScrape::Failure(message.clone()));
            }
        }
        self
    }

    /// Total scrape calls made.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// URLs requested, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Calls made for one URL.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.read().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl ScrapeApi for MockScrapeApi {
    async fn scrape(&self, request: &ScrapeRequest) -> RemoteResult<ScrapeData> {
        self.calls.write().unwrap().push(request.url.clone());

        let scripted = self
            .responses
            .write()
            .unwrap()
            .get_mut(&request.url)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(ScriptedScrape::Payload(data)) => Ok(data),
            Some(ScriptedScrape::Failure(message)) => Err(RemoteError::Api {
                status: 502,
                message,
            }),
            None => Err(RemoteError::Api {
                status: 500,
                message: format!("no scripted response for {}", request.url),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

enum ScriptedFallback {
    Record(JobRecord),
    Failure(String),
}

/// Mock fallback scraper with scripted per-URL results and call
/// tracking.
#[derive(Default)]
pub struct MockFallback {
    scripted: Arc<RwLock<HashMap<String, VecDeque<ScriptedFallback>>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Clone for MockFallback {
    fn clone(&self) -> Self {
        Self {
            scripted: Arc::clone(&self.scripted),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl MockFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record for a URL.
    pub fn with_record(self, url: impl Into<String>, record: JobRecord) -> Self {
        self.scripted
            .write()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(ScriptedFallback::Record(record));
        self
    }

    /// Queue a fetch failure for a URL.
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripted
            .write()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(ScriptedFallback::Failure(message.into()));
        self
    }

    /// Total fetch calls made.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// URLs requested, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl FallbackScraper for MockFallback {
    async fn fetch_and_extract(&self, url: &str) -> FetchResult<JobRecord> {
        self.calls.write().unwrap().push(url.to_string());

        let scripted = self
            .scripted
            .write()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(ScriptedFallback::Record(record)) => Ok(record),
            Some(ScriptedFallback::Failure(message)) => Err(FetchError::Http(
                std::io::Error::new(std::io::ErrorKind::Other, message).into(),
            )),
            None => Err(FetchError::Http(
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no scripted record for {}", url),
                )
                .into(),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock-fallback"
    }
}

/// A scrape payload with markdown content and a page title.
pub fn scrape_data(markdown: &str, title: &str) -> ScrapeData {
    ScrapeData {
        markdown: Some(markdown.to_string()),
        extract: None,
        metadata: Some(PageMetadata {
            title: Some(title.to_string()),
            source_url: None,
            status_code: Some(200),
        }),
    }
}

/// A scrape payload carrying schema-extracted structured fields.
pub fn structured_scrape_data(extract: serde_json::Value) -> ScrapeData {
    ScrapeData {
        markdown: None,
        extract: Some(extract),
        metadata: None,
    }
}

/// A complete record (passes essential-info validation) for fallback
/// scripting.
pub fn sample_record(title: &str) -> JobRecord {
    JobRecord::assemble(
        title.to_string(),
        "Descrição de exemplo da vaga.".to_string(),
        vec!["Responsabilidade de exemplo da vaga".to_string()],
        vec!["Requisito de exemplo da vaga".to_string()],
        None,
        HashMap::new(),
        Platform::Generic,
        &EssentialThresholds::default(),
    )
}

/// An intentionally incomplete record (fails validation).
pub fn partial_record(title: &str) -> JobRecord {
    let mut record = JobRecord::empty(Platform::Generic);
    record.title = title.to_string();
    record
}
