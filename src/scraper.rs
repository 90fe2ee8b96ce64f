//! Legacy heuristic scraper — the fallback of last resort.
//!
//! Fetches raw HTML directly (no JavaScript execution) and extracts
//! relevant sections by testing heading-like elements (h1–h4, strong,
//! b) against the same section keyword set the normalizer uses. A
//! best-effort, possibly incomplete record is preferable to none, so
//! its output is accepted even when it misses the essential-info bar.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::normalize::{is_relevant_heading, normalize, RawJobPayload};
use crate::platform::PlatformProfile;
use crate::security::UrlPolicy;
use crate::types::record::JobRecord;
use crate::validate::EssentialThresholds;

/// Seam for the fallback path, so batch orchestration can be tested
/// without a network.
#[async_trait]
pub trait FallbackScraper: Send + Sync {
    /// Fetch a URL directly and produce a best-effort record.
    async fn fetch_and_extract(&self, url: &str) -> FetchResult<JobRecord>;

    /// Name for logging and record metadata.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Direct-HTML scraper using heading/keyword pattern matching.
pub struct LegacyHeuristicScraper {
    client: reqwest::Client,
    user_agent: String,
    /// Cap on content lines accumulated per relevant section.
    max_section_lines: usize,
    policy: UrlPolicy,
    thresholds: EssentialThresholds,
}

impl LegacyHeuristicScraper {
    pub fn new(thresholds: EssentialThresholds) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            user_agent: "JobExtractionBot/1.0".to_string(),
            max_section_lines: 30,
            policy: UrlPolicy::new(),
            thresholds,
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-section content cap.
    pub fn with_max_section_lines(mut self, lines: usize) -> Self {
        self.max_section_lines = lines.max(1);
        self
    }

    /// Replace the URL policy (tests, trusted internal hosts).
    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl FallbackScraper for LegacyHeuristicScraper {
    async fn fetch_and_extract(&self, url: &str) -> FetchResult<JobRecord> {
        let target = self.policy.check_resolved(url).await?;

        debug!(url = %url, "legacy fetch starting");
        let response = self
            .client
            .get(target)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "legacy fetch failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let extracted = extract_sections(&html, self.max_section_lines);
        if !extracted.found_relevant {
            debug!(url = %url, "no relevant headings; using body text");
        }

        let mut metadata = HashMap::new();
        metadata.insert("extractor".to_string(), self.name().to_string());
        metadata.insert("http_status".to_string(), status.as_u16().to_string());

        let payload = RawJobPayload {
            url: url.to_string(),
            title: extracted.title,
            text: extracted.text,
            structured: None,
            metadata,
        };

        let platform = PlatformProfile::for_url(url).platform;
        Ok(normalize(payload, platform, &self.thresholds))
    }

    fn name(&self) -> &str {
        "legacy"
    }
}

/// Outcome of the HTML heuristics, before normalization.
struct ExtractedHtml {
    title: Option<String>,
    text: String,
    found_relevant: bool,
}

/// Scan heading-like elements for relevant sections and assemble a
/// plain-text document the normalizer can sectionize. Falls back to the
/// entire visible body text when no relevant heading exists.
fn extract_sections(html: &str, max_section_lines: usize) -> ExtractedHtml {
    // regex has no backreferences, so the matching closing tag is found
    // by string search per opening tag.
    let open_re = Regex::new(r"(?i)<(h[1-4]|strong|b)\b[^>]*>").unwrap();

    struct Heading {
        text: String,
        content_start: usize,
        start: usize,
    }

    let mut headings: Vec<Heading> = Vec::new();
    let mut cursor = 0;

    for cap in open_re.captures_iter(html) {
        let (Some(open), Some(tag)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        // Tags nested inside an already-consumed heading element.
        if open.start() < cursor {
            continue;
        }
        let tag = tag.as_str().to_ascii_lowercase();
        let Some((inner_end, after_close)) = find_closing_tag(html, open.end(), &tag) else {
            // Unclosed element; not a usable heading.
            continue;
        };
        cursor = after_close;

        let text = html_to_text(&html[open.end()..inner_end]).trim().to_string();
        if text.is_empty() {
            continue;
        }
        headings.push(Heading {
            text,
            content_start: after_close,
            start: open.start(),
        });
    }

    let mut assembled = String::new();
    let mut found_relevant = false;

    for (i, heading) in headings.iter().enumerate() {
        if !is_relevant_heading(&heading.text) {
            continue;
        }
        found_relevant = true;

        // Accumulate sibling content until the next heading-like
        // element, capped to bound cost on pathological pages.
        let content_end = headings
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(html.len());
        let content = html_to_text(&html[heading.content_start..content_end]);

        assembled.push_str(heading.text.trim_end_matches(':'));
        assembled.push_str(":\n");
        for line in content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(max_section_lines)
        {
            assembled.push_str(line);
            assembled.push('\n');
        }
    }

    let text = if found_relevant {
        assembled
    } else {
        let body_re = Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap();
        let body = body_re
            .captures(html)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
            .unwrap_or(html);
        html_to_text(body).trim().to_string()
    };

    ExtractedHtml {
        title: extract_title(html),
        text,
        found_relevant,
    }
}

/// Find `</tag>` case-insensitively at or after `from`. Returns the
/// byte offsets of the closing tag's start and of the position just
/// past it. ASCII lowercasing keeps byte offsets stable.
fn find_closing_tag(html: &str, from: usize, tag: &str) -> Option<(usize, usize)> {
    let closing = format!("</{}>", tag);
    let rel = html[from..].to_ascii_lowercase().find(&closing)?;
    Some((from + rel, from + rel + closing.len()))
}

/// Page title: `<title>` tag, else the first h1.
fn extract_title(html: &str) -> Option<String> {
    let title_re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
    let h1_re = Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap();

    title_re
        .captures(html)
        .or_else(|| h1_re.captures(html))
        .and_then(|cap| cap.get(1))
        .map(|m| html_to_text(m.as_str()).trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Convert an HTML fragment to plain text, keeping list items as
/// bulleted lines so the sectionizer can split them.
fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();

    let script_re = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    let style_re = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    let comment_re = Regex::new(r"(?s)<!--.*?-->").unwrap();
    text = script_re.replace_all(&text, "").into_owned();
    text = style_re.replace_all(&text, "").into_owned();
    text = comment_re.replace_all(&text, "").into_owned();

    let li_re = Regex::new(r"(?i)<li[^>]*>").unwrap();
    text = li_re.replace_all(&text, "\n- ").into_owned();

    let break_re = Regex::new(r"(?i)<(?:br\s*/?|/p|/div|/li|/tr|/h[1-6]|/ul|/ol)>").unwrap();
    text = break_re.replace_all(&text, "\n").into_owned();

    let tag_re = Regex::new(r"<[^>]+>").unwrap();
    text = tag_re.replace_all(&text, "").into_owned();

    text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    let blank_re = Regex::new(r"\n{3,}").unwrap();
    blank_re.replace_all(&text, "\n\n").trim().to_string()
}
