//! Status classification and aggregation
//!
//! Service records carry a free-text "Situação da Demanda" column. This module
//! turns that text into a fixed taxonomy and counts records per category for
//! the summary chart.
//!
//! # Core Concepts
//!
//! - **StatusCategory**: Resolved, InProgress, Harmed or Unclassified
//! - **LabelContext**: where a category is displayed (table cell or chart legend)
//! - **StatusSummary**: zero-filled per-category counts
//!
//! # Example
//!
//! ```rust
//! use fichas_core::status::{LabelContext, StatusCategory, StatusSummary};
//!
//! let category = StatusCategory::classify(Some("Em andamento - aguardando retorno"));
//! assert_eq!(category, StatusCategory::InProgress);
//!
//! let summary = StatusSummary::from_statuses([Some("PREJUDICADO"), None, Some("solucionado")]);
//! assert_eq!(summary.total(), 3);
//! assert_eq!(summary.count(StatusCategory::Unclassified), 1);
//! assert_eq!(StatusCategory::Unclassified.label(LabelContext::Chart), "Outros");
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Record, UnknownName};

// ============================================================================
// Core Types
// ============================================================================

/// Keyword stems tested against the normalized status text, highest priority first
const KEYWORD_STEMS: [(&str, StatusCategory); 3] = [
    ("prejudic", StatusCategory::Harmed),
    ("andament", StatusCategory::InProgress),
    ("solucion", StatusCategory::Resolved),
];

/// Classified state of a service record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// "Solucionado"
    Resolved,
    /// "Em Andamento"
    InProgress,
    /// "Prejudicado"
    Harmed,
    /// Anything else, including an empty or missing status
    Unclassified,
}

/// Presentation context for category labels.
///
/// The same category is worded differently in the table and in the chart
/// legend; only the catch-all category differs today.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelContext {
    Table,
    Chart,
}

impl StatusCategory {
    /// All categories in display order
    pub const ALL: [StatusCategory; 4] = [
        StatusCategory::Resolved,
        StatusCategory::InProgress,
        StatusCategory::Harmed,
        StatusCategory::Unclassified,
    ];

    /// Classify free-text status.
    ///
    /// The text is lower-cased and trimmed, then tested for the keyword stems
    /// in priority order: "prejudic", "andament", "solucion". First match wins.
    pub fn classify(status: Option<&str>) -> Self {
        let normalized = status.unwrap_or_default().trim().to_lowercase();
        KEYWORD_STEMS
            .iter()
            .find(|(stem, _)| normalized.contains(stem))
            .map(|(_, category)| *category)
            .unwrap_or(StatusCategory::Unclassified)
    }

    /// Display label for the given context
    pub fn label(&self, context: LabelContext) -> &'static str {
        match (self, context) {
            (StatusCategory::Resolved, _) => "Solucionado",
            (StatusCategory::InProgress, _) => "Em Andamento",
            (StatusCategory::Harmed, _) => "Prejudicado",
            (StatusCategory::Unclassified, LabelContext::Table) => "Não informado",
            (StatusCategory::Unclassified, LabelContext::Chart) => "Outros",
        }
    }

    /// Stable machine key, matches the serde representation
    pub fn key(&self) -> &'static str {
        match self {
            StatusCategory::Resolved => "resolved",
            StatusCategory::InProgress => "in_progress",
            StatusCategory::Harmed => "harmed",
            StatusCategory::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label(LabelContext::Table))
    }
}

impl FromStr for StatusCategory {
    type Err = UnknownName;

    /// Accepts English keys and the Portuguese labels, hyphenated or not
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        match word.as_str() {
            "resolved" | "solucionado" => Ok(StatusCategory::Resolved),
            "inprogress" | "andamento" | "emandamento" => Ok(StatusCategory::InProgress),
            "harmed" | "prejudicado" => Ok(StatusCategory::Harmed),
            "unclassified" | "outros" | "naoinformado" | "nãoinformado" => {
                Ok(StatusCategory::Unclassified)
            }
            _ => Err(UnknownName::new("status category", s)),
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Per-category record counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub resolved: usize,
    pub in_progress: usize,
    pub harmed: usize,
    pub unclassified: usize,
}

impl StatusSummary {
    /// Count records by the category of their status field
    pub fn from_records(records: &[Record]) -> Self {
        records.iter().map(Record::status_category).collect()
    }

    /// Count raw status values
    pub fn from_statuses<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        statuses.into_iter().map(StatusCategory::classify).collect()
    }

    /// Add one record of the given category
    pub fn record(&mut self, category: StatusCategory) {
        *self.slot(category) += 1;
    }

    fn slot(&mut self, category: StatusCategory) -> &mut usize {
        match category {
            StatusCategory::Resolved => &mut self.resolved,
            StatusCategory::InProgress => &mut self.in_progress,
            StatusCategory::Harmed => &mut self.harmed,
            StatusCategory::Unclassified => &mut self.unclassified,
        }
    }

    pub fn count(&self, category: StatusCategory) -> usize {
        match category {
            StatusCategory::Resolved => self.resolved,
            StatusCategory::InProgress => self.in_progress,
            StatusCategory::Harmed => self.harmed,
            StatusCategory::Unclassified => self.unclassified,
        }
    }

    /// Total number of classified records
    pub fn total(&self) -> usize {
        self.resolved + self.in_progress + self.harmed + self.unclassified
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Share of a category as a percentage (0-100), 0 when there are no records
    pub fn percentage(&self, category: StatusCategory) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(category) as f64 * 100.0 / total as f64
    }

    /// `(category, count)` for all four categories in display order
    pub fn iter(&self) -> impl Iterator<Item = (StatusCategory, usize)> + '_ {
        StatusCategory::ALL.into_iter().map(|c| (c, self.count(c)))
    }
}

impl FromIterator<StatusCategory> for StatusSummary {
    fn from_iter<I: IntoIterator<Item = StatusCategory>>(iter: I) -> Self {
        let mut summary = StatusSummary::default();
        for category in iter {
            summary.record(category);
        }
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn classify_keyword_examples() {
        assert_eq!(
            StatusCategory::classify(Some("Em andamento - aguardando retorno")),
            StatusCategory::InProgress
        );
        assert_eq!(StatusCategory::classify(Some("PREJUDICADO")), StatusCategory::Harmed);
        assert_eq!(StatusCategory::classify(Some("  Solucionado \n")), StatusCategory::Resolved);
        assert_eq!(StatusCategory::classify(Some("")), StatusCategory::Unclassified);
        assert_eq!(StatusCategory::classify(None), StatusCategory::Unclassified);
        assert_eq!(StatusCategory::classify(Some("Aguardando")), StatusCategory::Unclassified);
    }

    #[test]
    fn harmed_has_priority_over_other_stems() {
        let text = "Solucionado em parte, andamento prejudicado";
        assert_eq!(StatusCategory::classify(Some(text)), StatusCategory::Harmed);
    }

    #[test]
    fn in_progress_has_priority_over_resolved() {
        let text = "Em andamento (solucionado parcialmente)";
        assert_eq!(StatusCategory::classify(Some(text)), StatusCategory::InProgress);
    }

    #[test]
    fn stems_match_inflected_forms() {
        assert_eq!(StatusCategory::classify(Some("Prejudicada")), StatusCategory::Harmed);
        assert_eq!(StatusCategory::classify(Some("Solucionada")), StatusCategory::Resolved);
    }

    #[test]
    fn labels_differ_only_for_catch_all() {
        for category in StatusCategory::ALL {
            let table = category.label(LabelContext::Table);
            let chart = category.label(LabelContext::Chart);
            if category == StatusCategory::Unclassified {
                assert_eq!(table, "Não informado");
                assert_eq!(chart, "Outros");
            } else {
                assert_eq!(table, chart);
            }
        }
    }

    #[test]
    fn category_parses_from_cli_words() {
        assert_eq!("resolved".parse::<StatusCategory>().unwrap(), StatusCategory::Resolved);
        assert_eq!("em-andamento".parse::<StatusCategory>().unwrap(), StatusCategory::InProgress);
        assert_eq!("in_progress".parse::<StatusCategory>().unwrap(), StatusCategory::InProgress);
        assert_eq!("Prejudicado".parse::<StatusCategory>().unwrap(), StatusCategory::Harmed);
        assert_eq!("outros".parse::<StatusCategory>().unwrap(), StatusCategory::Unclassified);
        assert!("pending".parse::<StatusCategory>().is_err());
    }

    #[test]
    fn summary_is_zero_filled() {
        let summary = StatusSummary::from_statuses([Some("Solucionado")]);
        let counts: Vec<_> = summary.iter().collect();
        assert_eq!(
            counts,
            vec![
                (StatusCategory::Resolved, 1),
                (StatusCategory::InProgress, 0),
                (StatusCategory::Harmed, 0),
                (StatusCategory::Unclassified, 0),
            ]
        );
    }

    #[test]
    fn summary_percentage() {
        let summary = StatusSummary::from_statuses([
            Some("Solucionado"),
            Some("Solucionado"),
            Some("Prejudicado"),
            None,
        ]);
        assert_eq!(summary.percentage(StatusCategory::Resolved), 50.0);
        assert_eq!(summary.percentage(StatusCategory::Harmed), 25.0);
        assert_eq!(summary.percentage(StatusCategory::InProgress), 0.0);
    }

    #[test]
    fn empty_summary_has_zero_percentages() {
        let summary = StatusSummary::default();
        assert!(summary.is_empty());
        assert_eq!(summary.percentage(StatusCategory::Resolved), 0.0);
    }

    #[test]
    fn record_without_status_column_is_unclassified() {
        let records = vec![Record::new().with(Field::Name, "Ana")];
        let summary = StatusSummary::from_records(&records);
        assert_eq!(summary.unclassified, 1);
    }
}
