//! The normalized job record — the uniform internal representation of
//! an extracted job posting, regardless of source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::platform::Platform;
use crate::validate::{has_essential_info, EssentialThresholds};

/// A normalized, validated job posting. Treated as a value type:
/// constructed once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job title.
    pub title: String,

    /// Free-form description (everything not classified as
    /// responsibilities or requirements).
    pub description: String,

    /// Discrete responsibility items, in source order.
    pub responsibilities: Vec<String>,

    /// Discrete requirement items, in source order.
    pub requirements: Vec<String>,

    /// Raw structured payload from the remote service, when present.
    pub structured: Option<serde_json::Value>,

    /// Source-specific metadata (extractor name, HTTP status, etc.).
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Platform the source URL was classified as.
    pub platform: Platform,

    /// When the extraction happened.
    pub extracted_at: DateTime<Utc>,

    /// Whether this record meets the minimum bar of essential info.
    /// Computed from the record's own fields at construction, never set
    /// independently.
    pub has_essential_info: bool,
}

impl JobRecord {
    /// Assemble a record, computing `has_essential_info` from the parts.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        title: String,
        description: String,
        responsibilities: Vec<String>,
        requirements: Vec<String>,
        structured: Option<serde_json::Value>,
        metadata: HashMap<String, String>,
        platform: Platform,
        thresholds: &EssentialThresholds,
    ) -> Self {
        let essential = has_essential_info(&title, &responsibilities, &requirements, thresholds);
        Self {
            title,
            description,
            responsibilities,
            requirements,
            structured,
            metadata,
            platform,
            extracted_at: Utc::now(),
            has_essential_info: essential,
        }
    }

    /// An empty best-effort record for a source that yielded nothing
    /// extractable.
    pub fn empty(platform: Platform) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            responsibilities: Vec::new(),
            requirements: Vec::new(),
            structured: None,
            metadata: HashMap::new(),
            platform,
            extracted_at: Utc::now(),
            has_essential_info: false,
        }
    }

    /// Render the record as a labeled text block for prompt inclusion.
    pub fn to_prompt_block(&self) -> String {
        let mut block = String::new();
        block.push_str("TÍTULO: ");
        block.push_str(self.title.trim());

        if !self.responsibilities.is_empty() {
            block.push_str("\nRESPONSABILIDADES:");
            for item in &self.responsibilities {
                block.push_str("\n- ");
                block.push_str(item.trim());
            }
        }

        if !self.requirements.is_empty() {
            block.push_str("\nREQUISITOS:");
            for item in &self.requirements {
                block.push_str("\n- ");
                block.push_str(item.trim());
            }
        }

        if !self.description.trim().is_empty() {
            block.push_str("\nDESCRIÇÃO: ");
            block.push_str(self.description.trim());
        }

        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> JobRecord {
        JobRecord::assemble(
            "Engenheiro de Dados Pleno".to_string(),
            "Vaga híbrida em São Paulo.".to_string(),
            vec!["Construir pipelines de ingestão de dados".to_string()],
            vec!["Experiência com Rust ou Python".to_string()],
            None,
            HashMap::new(),
            Platform::Gupy,
            &EssentialThresholds::default(),
        )
    }

    #[test]
    fn test_assemble_computes_essential_flag() {
        let record = sample();
        assert!(record.has_essential_info);

        let incomplete = JobRecord::assemble(
            "Engenheiro de Dados Pleno".to_string(),
            String::new(),
            vec![],
            vec!["Experiência com Rust ou Python".to_string()],
            None,
            HashMap::new(),
            Platform::Gupy,
            &EssentialThresholds::default(),
        );
        assert!(!incomplete.has_essential_info);
    }

    #[test]
    fn test_empty_record() {
        let record = JobRecord::empty(Platform::Generic);
        assert!(!record.has_essential_info);
        assert!(record.title.is_empty());
        assert!(record.responsibilities.is_empty());
    }

    #[test]
    fn test_prompt_block_labels() {
        let block = sample().to_prompt_block();

        assert!(block.starts_with("TÍTULO: Engenheiro de Dados Pleno"));
        assert!(block.contains("RESPONSABILIDADES:\n- Construir pipelines"));
        assert!(block.contains("REQUISITOS:\n- Experiência com Rust ou Python"));
        assert!(block.contains("DESCRIÇÃO: Vaga híbrida em São Paulo."));
    }

    #[test]
    fn test_prompt_block_omits_empty_sections() {
        let block = JobRecord::empty(Platform::Generic).to_prompt_block();
        assert_eq!(block, "TÍTULO: ");
        assert!(!block.contains("RESPONSABILIDADES"));
        assert!(!block.contains("DESCRIÇÃO"));
    }
}
