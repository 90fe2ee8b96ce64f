//! Essential-info validation.
//!
//! A job record is only usable by downstream analysis when it carries a
//! minimum bar of information: a non-trivial title plus at least one
//! non-trivial responsibility and one non-trivial requirement.

use serde::{Deserialize, Serialize};

/// Minimum length thresholds for the essential-info predicate.
///
/// The defaults are inherited heuristics; callers tuning precision
/// should adjust these rather than the predicate itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EssentialThresholds {
    /// Minimum title length in characters.
    pub min_title_chars: usize,

    /// Minimum length in characters for a responsibility or requirement
    /// item to count as non-trivial.
    pub min_item_chars: usize,
}

impl Default for EssentialThresholds {
    fn default() -> Self {
        Self {
            min_title_chars: 10,
            min_item_chars: 12,
        }
    }
}

/// Pure predicate: does the extracted content meet the minimum bar?
///
/// True only when the title exceeds `min_title_chars` and both lists
/// contain at least one item exceeding `min_item_chars`.
pub fn has_essential_info(
    title: &str,
    responsibilities: &[String],
    requirements: &[String],
    thresholds: &EssentialThresholds,
) -> bool {
    let title_ok = title.trim().chars().count() > thresholds.min_title_chars;

    let any_nontrivial = |items: &[String]| {
        items
            .iter()
            .any(|item| item.trim().chars().count() > thresholds.min_item_chars)
    };

    title_ok && any_nontrivial(responsibilities) && any_nontrivial(requirements)
}
