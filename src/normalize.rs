//! Payload normalization.
//!
//! Converts raw payloads from either source (remote structured service
//! or legacy heuristic scraper) into a single uniform [`JobRecord`].
//! Structured fields win when present; otherwise free-form text is
//! partitioned into description / responsibilities / requirements by
//! scanning for section-boundary headings.

use std::collections::HashMap;

use crate::platform::Platform;
use crate::types::record::JobRecord;
use crate::validate::EssentialThresholds;

/// Upper bound on the description when no section headings are found.
const MAX_DESCRIPTION_CHARS: usize = 4000;

/// Heading lines longer than this are treated as prose, not headings.
const MAX_HEADING_CHARS: usize = 60;

/// Headings that open the responsibilities section.
const RESPONSIBILITY_HEADINGS: &[&str] = &[
    "responsabilidades",
    "atribuições",
    "atribuicoes",
    "o que você vai fazer",
    "o que voce vai fazer",
    "responsibilities",
    "what you'll do",
    "what you will do",
    "your role",
];

/// Headings that open the requirements section.
const REQUIREMENT_HEADINGS: &[&str] = &[
    "requisitos",
    "qualificações",
    "qualificacoes",
    "o que esperamos",
    "requirements",
    "qualifications",
    "what we're looking for",
    "what we are looking for",
];

/// Other recognized headings; they reset the active section back to
/// description without discarding prior content.
const OTHER_HEADINGS: &[&str] = &[
    "benefícios",
    "beneficios",
    "benefits",
    "sobre a empresa",
    "sobre nós",
    "sobre nos",
    "about the company",
    "about us",
    "localização",
    "localizacao",
    "location",
    "salário",
    "salario",
    "salary",
    "etapas do processo",
    "hiring process",
];

/// Raw extraction output before normalization. Produced by both the
/// remote client and the legacy scraper.
#[derive(Debug, Clone, Default)]
pub struct RawJobPayload {
    /// Source URL.
    pub url: String,

    /// Title from page metadata, when the source provides one.
    pub title: Option<String>,

    /// Free-form page text (markdown or plain text).
    pub text: String,

    /// Structured fields from schema extraction, when present.
    pub structured: Option<serde_json::Value>,

    /// Source-specific metadata.
    pub metadata: HashMap<String, String>,
}

/// The three buffers produced by the free-text sectionizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub description: String,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum ActiveSection {
    Description,
    Responsibilities,
    Requirements,
}

/// Normalize a raw payload into a [`JobRecord`]. Deterministic given
/// identical input.
pub fn normalize(
    payload: RawJobPayload,
    platform: Platform,
    thresholds: &EssentialThresholds,
) -> JobRecord {
    let sections = sectionize(&payload.text);

    let mut title = payload.title.unwrap_or_default();
    let mut description = sections.description;
    let mut responsibilities = sections.responsibilities;
    let mut requirements = sections.requirements;

    // Schema-extracted fields take precedence over text scanning.
    if let Some(structured) = &payload.structured {
        if let Some(value) = nonempty_string(structured, "title") {
            title = value;
        }
        if let Some(value) = nonempty_string(structured, "description") {
            description = value;
        }
        let items = string_list(structured, "responsibilities");
        if !items.is_empty() {
            responsibilities = items;
        }
        let items = string_list(structured, "requirements");
        if !items.is_empty() {
            requirements = items;
        }
    }

    let mut metadata = payload.metadata;
    if !payload.url.is_empty() {
        metadata.insert("source_url".to_string(), payload.url);
    }

    JobRecord::assemble(
        title,
        truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        responsibilities,
        requirements,
        payload.structured,
        metadata,
        platform,
        thresholds,
    )
}

/// Partition free-form text into description / responsibilities /
/// requirements by scanning line-by-line for section headings.
///
/// If no heading is detected at all, the entire text (bounded) becomes
/// the description and both lists stay empty.
pub fn sectionize(text: &str) -> Sections {
    let mut description: Vec<String> = Vec::new();
    let mut responsibilities: Vec<String> = Vec::new();
    let mut requirements: Vec<String> = Vec::new();
    let mut active = ActiveSection::Description;
    let mut found_heading = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // List-like lines are always content, even when they mention a
        // section keyword.
        if split_list_item(trimmed).is_none() {
            if let Some(section) = heading_kind(trimmed) {
                found_heading = true;
                active = section;
                continue;
            }
        }

        match active {
            ActiveSection::Description => description.push(clean_line(trimmed)),
            ActiveSection::Responsibilities => push_item(&mut responsibilities, trimmed),
            ActiveSection::Requirements => push_item(&mut requirements, trimmed),
        }
    }

    if !found_heading {
        return Sections {
            description: truncate_chars(text.trim(), MAX_DESCRIPTION_CHARS),
            responsibilities: Vec::new(),
            requirements: Vec::new(),
        };
    }

    Sections {
        description: description.join("\n"),
        responsibilities,
        requirements,
    }
}

/// True when a heading line opens a responsibilities or requirements
/// section. Shared with the legacy scraper so both paths recognize the
/// same keyword set.
pub(crate) fn is_relevant_heading(line: &str) -> bool {
    matches!(
        heading_kind(line),
        Some(ActiveSection::Responsibilities | ActiveSection::Requirements)
    )
}

/// Classify a line as a section heading, or `None` for prose.
fn heading_kind(line: &str) -> Option<ActiveSection> {
    if line.chars().count() > MAX_HEADING_CHARS {
        return None;
    }

    let normalized = normalize_heading(line);
    if normalized.is_empty() {
        return None;
    }

    if RESPONSIBILITY_HEADINGS.iter().any(|k| normalized.contains(k)) {
        return Some(ActiveSection::Responsibilities);
    }
    if REQUIREMENT_HEADINGS.iter().any(|k| normalized.contains(k)) {
        return Some(ActiveSection::Requirements);
    }
    if OTHER_HEADINGS.iter().any(|k| normalized.contains(k)) {
        return Some(ActiveSection::Description);
    }

    None
}

/// Lowercase and strip markdown/punctuation decorations from a
/// candidate heading line.
fn normalize_heading(line: &str) -> String {
    line.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '#' | '*' | '_' | '>' | ':' | '.' | '•' | '-')
    })
    .to_lowercase()
}

/// Strip a leading bullet or list number, returning the item text.
fn split_list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();

    for bullet in ["- ", "* ", "+ ", "• ", "· ", "– ", "— "] {
        if let Some(rest) = trimmed.strip_prefix(bullet) {
            return Some(rest.trim());
        }
    }

    // Numbered items: "1. text" or "2) text"
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        let rest = &trimmed[digits.len()..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if stripped.starts_with(' ') {
                return Some(stripped.trim());
            }
        }
    }

    None
}

/// Append a content line to a list section: list-like lines become
/// discrete items, prose lines concatenate onto the previous item.
fn push_item(items: &mut Vec<String>, line: &str) {
    if let Some(item) = split_list_item(line) {
        if !item.is_empty() {
            items.push(clean_line(item));
        }
        return;
    }

    let prose = clean_line(line);
    match items.last_mut() {
        Some(last) => {
            last.push(' ');
            last.push_str(&prose);
        }
        None => items.push(prose),
    }
}

/// Strip lightweight markdown emphasis from a content line.
fn clean_line(line: &str) -> String {
    line.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_'))
        .to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

fn nonempty_string(value: &serde_json::Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read a field as a list of strings: a JSON array of strings, or a
/// newline-separated string split into items.
fn string_list(value: &serde_json::Value, field: &str) -> Vec<String> {
    match value.get(field) {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| split_list_item(s).unwrap_or(s).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_json::Value::String(text)) => text
            .lines()
            .map(|line| split_list_item(line).unwrap_or(line).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sectionize_basic_headings() {
        let text = "Responsabilidades:\n- Fazer X\n- Fazer Y\nRequisitos:\n- Ter Z";
        let sections = sectionize(text);

        assert_eq!(sections.responsibilities, vec!["Fazer X", "Fazer Y"]);
        assert_eq!(sections.requirements, vec!["Ter Z"]);
        assert_eq!(sections.description, "");
    }

    #[test]
    fn test_sectionize_english_and_markdown_headings() {
        let text = "## What you'll do\n* Ship features\n* Review code\n\n**Requirements**\n1. Rust experience\n2) Async background";
        let sections = sectionize(text);

        assert_eq!(sections.responsibilities, vec!["Ship features", "Review code"]);
        assert_eq!(
            sections.requirements,
            vec!["Rust experience", "Async background"]
        );
    }

    #[test]
    fn test_other_heading_resets_to_description() {
        let text = "Sobre a vaga em geral.\nRequisitos:\n- Ter Z\nBenefícios:\nVale refeição e plano de saúde.";
        let sections = sectionize(text);

        assert_eq!(sections.requirements, vec!["Ter Z"]);
        assert!(sections.description.contains("Sobre a vaga em geral."));
        assert!(sections
            .description
            .contains("Vale refeição e plano de saúde."));
    }

    #[test]
    fn test_no_headings_means_whole_text_is_description() {
        let text = "Uma vaga sem estrutura nenhuma.\nApenas texto corrido.";
        let sections = sectionize(text);

        assert_eq!(sections.description, text);
        assert!(sections.responsibilities.is_empty());
        assert!(sections.requirements.is_empty());
    }

    #[test]
    fn test_no_headings_description_is_bounded() {
        let long = "x".repeat(10_000);
        let sections = sectionize(&long);
        assert_eq!(sections.description.chars().count(), 4000);
    }

    #[test]
    fn test_list_line_with_keyword_is_not_a_heading() {
        let text = "Requisitos:\n- Levantamento de requisitos com clientes\n- Ter Z";
        let sections = sectionize(text);

        assert_eq!(
            sections.requirements,
            vec!["Levantamento de requisitos com clientes", "Ter Z"]
        );
    }

    #[test]
    fn test_prose_in_list_section_concatenates() {
        let text = "Requisitos:\n- Experiência com Rust\ncom foco em serviços async";
        let sections = sectionize(text);

        assert_eq!(
            sections.requirements,
            vec!["Experiência com Rust com foco em serviços async"]
        );
    }

    #[test]
    fn test_long_line_with_keyword_is_prose() {
        let long_line = format!(
            "A empresa busca alinhar responsabilidades e expectativas {}",
            "de forma clara e objetiva em todas as etapas"
        );
        let text = format!("{}\nRequisitos:\n- Ter Z", long_line);
        let sections = sectionize(&text);

        assert!(sections.description.contains("busca alinhar"));
        assert_eq!(sections.requirements, vec!["Ter Z"]);
    }

    #[test]
    fn test_normalize_prefers_structured_fields() {
        let payload = RawJobPayload {
            url: "https://empresa.gupy.io/jobs/1".to_string(),
            title: Some("Título da página".to_string()),
            text: "Responsabilidades:\n- Do texto".to_string(),
            structured: Some(json!({
                "title": "Engenheiro de Software Sênior",
                "description": "Time de plataforma.",
                "responsibilities": ["Desenhar sistemas distribuídos"],
                "requirements": ["Experiência sólida com Rust"]
            })),
            metadata: HashMap::new(),
        };

        let record = normalize(payload, Platform::Gupy, &EssentialThresholds::default());

        assert_eq!(record.title, "Engenheiro de Software Sênior");
        assert_eq!(record.description, "Time de plataforma.");
        assert_eq!(record.responsibilities, vec!["Desenhar sistemas distribuídos"]);
        assert_eq!(record.requirements, vec!["Experiência sólida com Rust"]);
        assert!(record.has_essential_info);
        assert_eq!(
            record.metadata.get("source_url").map(String::as_str),
            Some("https://empresa.gupy.io/jobs/1")
        );
    }

    #[test]
    fn test_normalize_structured_string_lists_split() {
        let payload = RawJobPayload {
            url: String::new(),
            title: None,
            text: String::new(),
            structured: Some(json!({
                "title": "Analista de Dados Pleno",
                "requirements": "- SQL avançado e modelagem\n- Python para análise"
            })),
            metadata: HashMap::new(),
        };

        let record = normalize(payload, Platform::Generic, &EssentialThresholds::default());
        assert_eq!(
            record.requirements,
            vec!["SQL avançado e modelagem", "Python para análise"]
        );
    }

    #[test]
    fn test_normalize_falls_back_to_text_sections() {
        let payload = RawJobPayload {
            url: String::new(),
            title: Some("Desenvolvedor Backend Pleno".to_string()),
            text: "Responsabilidades:\n- Manter APIs de pagamento\nRequisitos:\n- Conhecimento de Postgres"
                .to_string(),
            structured: None,
            metadata: HashMap::new(),
        };

        let record = normalize(payload, Platform::Generic, &EssentialThresholds::default());
        assert_eq!(record.title, "Desenvolvedor Backend Pleno");
        assert_eq!(record.responsibilities, vec!["Manter APIs de pagamento"]);
        assert_eq!(record.requirements, vec!["Conhecimento de Postgres"]);
        assert!(record.has_essential_info);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let payload = RawJobPayload {
            url: "https://example.com/vaga".to_string(),
            title: Some("Engenheiro de Plataforma".to_string()),
            text: "Requisitos:\n- Kubernetes em produção".to_string(),
            structured: None,
            metadata: HashMap::new(),
        };

        let a = normalize(payload.clone(), Platform::Generic, &EssentialThresholds::default());
        let b = normalize(payload, Platform::Generic, &EssentialThresholds::default());

        assert_eq!(a.title, b.title);
        assert_eq!(a.requirements, b.requirements);
        assert_eq!(a.has_essential_info, b.has_essential_info);
    }
}
