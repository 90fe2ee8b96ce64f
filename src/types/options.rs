//! Per-call extraction options.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Options for a single extraction call. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Output formats requested from the remote service.
    pub formats: Vec<String>,

    /// Ask the remote service to strip navigation/boilerplate.
    pub only_main_content: bool,

    /// HTML tags to keep (empty = service default).
    #[serde(default)]
    pub include_tags: Vec<String>,

    /// HTML tags to drop before capture.
    #[serde(default)]
    pub exclude_tags: Vec<String>,

    /// Per-call timeout in milliseconds for the remote service.
    pub timeout_ms: u64,

    /// Bypass the extraction cache for this call (result is also not
    /// stored).
    pub skip_cache: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            formats: vec!["markdown".to_string()],
            only_main_content: true,
            include_tags: Vec::new(),
            exclude_tags: vec!["nav".to_string(), "footer".to_string(), "aside".to_string()],
            timeout_ms: 30_000,
            skip_cache: false,
        }
    }
}

impl ExtractOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.formats.push(format.into());
        self
    }

    /// Set whether the service should strip boilerplate.
    pub fn with_only_main_content(mut self, only: bool) -> Self {
        self.only_main_content = only;
        self
    }

    /// Replace the include-tag list.
    pub fn with_include_tags(
        mut self,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.include_tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Replace the exclude-tag list.
    pub fn with_exclude_tags(
        mut self,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.exclude_tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Set the remote-call timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Bypass the cache for this call.
    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    /// Cache key for a URL under these options.
    ///
    /// Covers the fields that change the extracted content (formats,
    /// main-content flag, tag filters). `skip_cache` and `timeout_ms`
    /// alter call behavior, not the content identity, so they are
    /// excluded.
    pub fn cache_key(&self, url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update([0]);
        for format in &self.formats {
            hasher.update(format.as_bytes());
            hasher.update([0]);
        }
        hasher.update([self.only_main_content as u8]);
        for tag in &self.include_tags {
            hasher.update(tag.as_bytes());
            hasher.update([0]);
        }
        hasher.update([0xff]);
        for tag in &self.exclude_tags {
            hasher.update(tag.as_bytes());
            hasher.update([0]);
        }
        format!("{:x}", hasher.finalize())
    }
}
