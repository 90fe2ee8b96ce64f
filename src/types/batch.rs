//! Batch processing outcomes.

use std::time::Duration;

use crate::types::record::JobRecord;

/// A URL that produced a usable (possibly partial) record.
#[derive(Debug, Clone)]
pub struct BatchSuccess {
    pub url: String,
    /// Position in the submitted URL list.
    pub index: usize,
    pub record: JobRecord,
}

/// A URL that failed both the remote and fallback paths.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub url: String,
    /// Position in the submitted URL list.
    pub index: usize,
    pub error: String,
}

/// Aggregate statistics for a completed batch.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total_urls: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub duration: Duration,
}

/// The result of processing a batch of URLs. Immutable once returned;
/// `succeeded` and `failed` are ordered by submission index and
/// together cover every submitted URL exactly once.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub succeeded: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    /// Fraction of URLs that produced a record (0.0 when empty).
    pub fn success_rate(&self) -> f64 {
        if self.summary.total_urls == 0 {
            return 0.0;
        }
        self.summary.success_count as f64 / self.summary.total_urls as f64
    }

    /// URLs processed per second (0.0 for an instantaneous batch).
    pub fn throughput_per_sec(&self) -> f64 {
        let secs = self.summary.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.summary.total_urls as f64 / secs
    }

    /// Legacy-compatible prompt text: one labeled block per submitted
    /// URL, joined with a `---` delimiter, in submission order. A URL
    /// that failed both paths still gets a block, flagged with an
    /// `ERRO:` line, so downstream analysis sees every job slot.
    pub fn to_prompt_text(&self) -> String {
        let mut blocks: Vec<(usize, String)> = self
            .succeeded
            .iter()
            .map(|s| (s.index, s.record.to_prompt_block()))
            .chain(self.failed.iter().map(|f| {
                (f.index, format!("TÍTULO: \nERRO: {} ({})", f.error, f.url))
            }))
            .collect();
        blocks.sort_by_key(|(index, _)| *index);

        blocks
            .into_iter()
            .map(|(_, block)| block)
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::validate::EssentialThresholds;
    use std::collections::HashMap;

    fn record(title: &str) -> JobRecord {
        JobRecord::assemble(
            title.to_string(),
            String::new(),
            vec!["Responsabilidade de exemplo aqui".to_string()],
            vec!["Requisito de exemplo aqui".to_string()],
            None,
            HashMap::new(),
            Platform::Generic,
            &EssentialThresholds::default(),
        )
    }

    fn outcome() -> BatchOutcome {
        BatchOutcome {
            succeeded: vec![
                BatchSuccess {
                    url: "https://a.example/1".to_string(),
                    index: 0,
                    record: record("Analista de Sistemas Pleno"),
                },
                BatchSuccess {
                    url: "https://a.example/3".to_string(),
                    index: 2,
                    record: record("Desenvolvedor Backend Sênior"),
                },
            ],
            failed: vec![BatchFailure {
                url: "https://a.example/2".to_string(),
                index: 1,
                error: "fetch failed".to_string(),
            }],
            summary: BatchSummary {
                total_urls: 3,
                success_count: 2,
                error_count: 1,
                duration: Duration::from_secs(2),
            },
        }
    }

    #[test]
    fn test_rates() {
        let outcome = outcome();
        assert!((outcome.success_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert!((outcome.throughput_per_sec() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_prompt_text_joins_blocks_in_submission_order() {
        let text = outcome().to_prompt_text();
        assert!(text.contains("TÍTULO: Analista de Sistemas Pleno"));
        assert!(text.contains("\n---\n"));
        assert!(text.contains("TÍTULO: Desenvolvedor Backend Sênior"));

        // The failed URL keeps its slot, flagged rather than dropped.
        assert!(text.contains("ERRO: fetch failed (https://a.example/2)"));
        let failed_at = text.find("ERRO:").unwrap();
        assert!(text.find("Analista de Sistemas Pleno").unwrap() < failed_at);
        assert!(failed_at < text.find("Desenvolvedor Backend Sênior").unwrap());
    }

    #[test]
    fn test_empty_outcome_rates() {
        let outcome = BatchOutcome {
            succeeded: vec![],
            failed: vec![],
            summary: BatchSummary {
                total_urls: 0,
                success_count: 0,
                error_count: 0,
                duration: Duration::ZERO,
            },
        };
        assert_eq!(outcome.success_rate(), 0.0);
        assert_eq!(outcome.throughput_per_sec(), 0.0);
        assert_eq!(outcome.to_prompt_text(), "");
    }
}
