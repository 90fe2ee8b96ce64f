//! Platform classification for job-board sites.
//!
//! Maps a URL to a known job-board platform and its extraction
//! configuration: which fields the site is expected to provide, the
//! interaction steps the remote scraper must perform before the page is
//! complete, and the structured-extraction schema for that vendor.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Known job-board platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Gupy,
    Linkedin,
    Indeed,
    Catho,
    Workday,
    Generic,
}

impl Platform {
    /// Stable lowercase identifier (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Gupy => "gupy",
            Platform::Linkedin => "linkedin",
            Platform::Indeed => "indeed",
            Platform::Catho => "catho",
            Platform::Workday => "workday",
            Platform::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page interaction step performed by the remote scraper before
/// capture (wire format mirrors the scrape API's `actions` array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageAction {
    Wait { milliseconds: u64 },
    Click { selector: String },
    Scroll { direction: String },
}

/// Hostname substrings checked in order; first match wins.
const HOST_TABLE: &[(&str, Platform)] = &[
    ("gupy.io", Platform::Gupy),
    ("linkedin.com", Platform::Linkedin),
    ("indeed.com", Platform::Indeed),
    ("catho.com", Platform::Catho),
    ("workday", Platform::Workday),
];

/// Static extraction configuration for a job-board platform.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub platform: Platform,

    /// Fields this platform is expected to yield.
    pub required_fields: Vec<&'static str>,

    /// Interaction steps to run before capturing the page.
    pub actions: Vec<PageAction>,

    /// Structured-extraction schema: field name -> description for the
    /// remote service. Empty for the generic profile.
    pub schema: IndexMap<String, String>,
}

impl PlatformProfile {
    /// Classify a URL into a platform profile.
    ///
    /// Pure and infallible: unparseable URLs and unknown hosts degrade
    /// to the generic profile rather than erroring.
    pub fn for_url(url: &str) -> Self {
        let host = match url::Url::parse(url) {
            Ok(parsed) => parsed.host_str().unwrap_or_default().to_ascii_lowercase(),
            Err(_) => return Self::generic(),
        };

        for (needle, platform) in HOST_TABLE {
            if host.contains(needle) {
                return Self::for_platform(*platform);
            }
        }

        Self::generic()
    }

    /// Build the profile for a specific platform.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Gupy => Self::gupy(),
            Platform::Linkedin => Self::linkedin(),
            Platform::Indeed => Self::indeed(),
            Platform::Catho => Self::catho(),
            Platform::Workday => Self::workday(),
            Platform::Generic => Self::generic(),
        }
    }

    /// The fallback profile: no actions, no schema, plain capture.
    pub fn generic() -> Self {
        Self {
            platform: Platform::Generic,
            required_fields: vec!["title", "description"],
            actions: Vec::new(),
            schema: IndexMap::new(),
        }
    }

    pub fn is_generic(&self) -> bool {
        self.platform == Platform::Generic
    }

    fn gupy() -> Self {
        Self {
            platform: Platform::Gupy,
            required_fields: vec!["title", "responsibilities", "requirements"],
            actions: vec![PageAction::Wait { milliseconds: 3000 }],
            schema: schema_pt(),
        }
    }

    fn linkedin() -> Self {
        Self {
            platform: Platform::Linkedin,
            required_fields: vec!["title", "responsibilities", "requirements"],
            actions: vec![
                PageAction::Wait { milliseconds: 2000 },
                PageAction::Click {
                    selector: ".show-more-less-html__button".to_string(),
                },
                PageAction::Wait { milliseconds: 500 },
            ],
            schema: schema_en(),
        }
    }

    fn indeed() -> Self {
        Self {
            platform: Platform::Indeed,
            required_fields: vec!["title", "responsibilities", "requirements"],
            actions: vec![PageAction::Wait { milliseconds: 2000 }],
            schema: schema_en(),
        }
    }

    fn catho() -> Self {
        Self {
            platform: Platform::Catho,
            required_fields: vec!["title", "responsibilities", "requirements"],
            actions: vec![PageAction::Wait { milliseconds: 2000 }],
            schema: schema_pt(),
        }
    }

    fn workday() -> Self {
        Self {
            platform: Platform::Workday,
            required_fields: vec!["title", "responsibilities", "requirements"],
            actions: vec![
                PageAction::Wait { milliseconds: 3000 },
                PageAction::Scroll {
                    direction: "down".to_string(),
                },
            ],
            schema: schema_en(),
        }
    }
}

fn schema_pt() -> IndexMap<String, String> {
    [
        ("title", "Título da vaga"),
        ("description", "Descrição geral da vaga"),
        (
            "responsibilities",
            "Lista de responsabilidades e atribuições do cargo",
        ),
        (
            "requirements",
            "Lista de requisitos e qualificações exigidas",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn schema_en() -> IndexMap<String, String> {
    [
        ("title", "Job title"),
        ("description", "General description of the position"),
        (
            "responsibilities",
            "List of responsibilities and duties of the role",
        ),
        (
            "requirements",
            "List of required skills and qualifications",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_platforms() {
        let cases = [
            ("https://empresa.gupy.io/jobs/123", Platform::Gupy),
            ("https://www.linkedin.com/jobs/view/456", Platform::Linkedin),
            ("https://br.indeed.com/viewjob?jk=789", Platform::Indeed),
            ("https://www.catho.com.br/vagas/abc", Platform::Catho),
            (
                "https://acme.wd5.myworkdayjobs.com/careers/job/x",
                Platform::Workday,
            ),
        ];

        for (url, expected) in cases {
            let profile = PlatformProfile::for_url(url);
            assert_eq!(profile.platform, expected, "url: {}", url);
            assert!(!profile.schema.is_empty());
        }
    }

    #[test]
    fn test_unknown_host_degrades_to_generic() {
        let profile = PlatformProfile::for_url("https://careers.example.com/vaga/1");
        assert_eq!(profile.platform, Platform::Generic);
        assert!(profile.is_generic());
        assert!(profile.actions.is_empty());
        assert!(profile.schema.is_empty());
    }

    #[test]
    fn test_unparseable_url_never_errors() {
        let profile = PlatformProfile::for_url("not a url at all");
        assert_eq!(profile.platform, Platform::Generic);
    }

    #[test]
    fn test_host_match_ignores_path() {
        // "gupy.io" in the path must not classify as Gupy
        let profile = PlatformProfile::for_url("https://example.com/gupy.io/fake");
        assert_eq!(profile.platform, Platform::Generic);
    }

    #[test]
    fn test_action_wire_format() {
        let action = PageAction::Click {
            selector: ".show-more".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "click");
        assert_eq!(json["selector"], ".show-more");

        let wait = serde_json::to_value(PageAction::Wait { milliseconds: 2000 }).unwrap();
        assert_eq!(wait["type"], "wait");
        assert_eq!(wait["milliseconds"], 2000);
    }

    #[test]
    fn test_schema_field_order_is_stable() {
        let profile = PlatformProfile::for_url("https://empresa.gupy.io/jobs/1");
        let fields: Vec<&str> = profile.schema.keys().map(|s| s.as_str()).collect();
        assert_eq!(
            fields,
            vec!["title", "description", "responsibilities", "requirements"]
        );
    }
}
