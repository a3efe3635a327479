//! Row filtering
//!
//! A [`RowFilter`] is applied in three stages, each of which can only remove
//! records:
//!
//! 1. presence of a required identity field (non-blank),
//! 2. an optional case-insensitive substring query over one field,
//! 3. an optional set of selected status categories.
//!
//! Filtering never fails and never reorders. A field missing from a record
//! simply does not match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::status::StatusCategory;
use crate::{Field, Record};

/// Substring query over one field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuery {
    pub field: Field,
    pub text: String,
}

impl TextQuery {
    pub fn new(field: Field, text: impl Into<String>) -> Self {
        Self {
            field,
            text: text.into(),
        }
    }

    /// An empty query does not restrict anything
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        matches_lowered(record, self.field, &self.text.to_lowercase())
    }
}

fn matches_lowered(record: &Record, field: Field, needle: &str) -> bool {
    record
        .get(field)
        .is_some_and(|value| value.to_lowercase().contains(needle))
}

/// Filter applied to the records of a dataset before display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    /// Records with this field absent or blank are dropped
    pub required: Option<Field>,
    /// Substring query, ignored when empty
    pub query: Option<TextQuery>,
    /// Selected categories; empty means no category filtering
    pub categories: BTreeSet<StatusCategory>,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self {
            required: Some(Field::Name),
            query: None,
            categories: BTreeSet::new(),
        }
    }
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required identity field
    pub fn require(mut self, field: Field) -> Self {
        self.required = Some(field);
        self
    }

    /// Keep records regardless of identity field
    pub fn no_required_field(mut self) -> Self {
        self.required = None;
        self
    }

    /// Set the substring query
    pub fn query(mut self, field: Field, text: impl Into<String>) -> Self {
        self.query = Some(TextQuery::new(field, text));
        self
    }

    /// Add a category to the selection
    pub fn category(mut self, category: StatusCategory) -> Self {
        self.categories.insert(category);
        self
    }

    /// Add several categories to the selection
    pub fn categories(mut self, categories: impl IntoIterator<Item = StatusCategory>) -> Self {
        self.categories.extend(categories);
        self
    }

    /// Flip a category in or out of the selection, returning whether it is now selected
    pub fn toggle(&mut self, category: StatusCategory) -> bool {
        if self.categories.remove(&category) {
            false
        } else {
            self.categories.insert(category);
            true
        }
    }

    /// Active query, if any
    pub fn active_query(&self) -> Option<&TextQuery> {
        self.query.as_ref().filter(|q| !q.is_empty())
    }

    /// Whether the query or category stages restrict anything
    pub fn is_narrowing(&self) -> bool {
        self.active_query().is_some() || !self.categories.is_empty()
    }

    /// Whether a single record passes all stages
    pub fn matches(&self, record: &Record) -> bool {
        let needle = self.active_query().map(|q| (q.field, q.text.to_lowercase()));
        self.matches_with(record, needle.as_ref())
    }

    fn matches_with(&self, record: &Record, needle: Option<&(Field, String)>) -> bool {
        if let Some(required) = self.required {
            if !record.is_filled(required) {
                return false;
            }
        }

        if let Some((field, text)) = needle {
            if !matches_lowered(record, *field, text) {
                return false;
            }
        }

        self.categories.is_empty() || self.categories.contains(&record.status_category())
    }

    /// Surviving records, cloned, in input order
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        let needle = self.active_query().map(|q| (q.field, q.text.to_lowercase()));
        records
            .iter()
            .filter(|record| self.matches_with(record, needle.as_ref()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.get(Field::Name)).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            Record::new()
                .with(Field::Name, "Ana Souza")
                .with(Field::Neighborhood, "Centro")
                .with(Field::Status, "Solucionado"),
            Record::new()
                .with(Field::Name, "Bruno Lima")
                .with(Field::Neighborhood, "Boa Vista")
                .with(Field::Status, "Em andamento"),
            Record::new()
                .with(Field::Name, "Carla Dias")
                .with(Field::Status, "Prejudicado"),
            Record::new().with(Field::Name, "   ").with(Field::Status, "Solucionado"),
            Record::new().with(Field::Status, "Solucionado"),
        ]
    }

    #[test]
    fn default_filter_drops_blank_names() {
        let result = RowFilter::default().apply(&sample());
        assert_eq!(names(&result), vec!["Ana Souza", "Bruno Lima", "Carla Dias"]);
    }

    #[test]
    fn no_required_field_keeps_everything() {
        let result = RowFilter::new().no_required_field().apply(&sample());
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn query_is_case_insensitive() {
        let filter = RowFilter::new().query(Field::Neighborhood, "CENTRO");
        assert_eq!(names(&filter.apply(&sample())), vec!["Ana Souza"]);
    }

    #[test]
    fn query_on_missing_field_does_not_match() {
        let filter = RowFilter::new().query(Field::Phone, "9");
        assert!(filter.apply(&sample()).is_empty());
    }

    #[test]
    fn empty_query_is_pass_through() {
        let filter = RowFilter::new().query(Field::Neighborhood, "");
        assert_eq!(filter.apply(&sample()).len(), 3);
        assert!(!filter.is_narrowing());
    }

    #[test]
    fn category_selection_uses_classification() {
        let filter = RowFilter::new()
            .category(StatusCategory::Resolved)
            .category(StatusCategory::Harmed);
        assert_eq!(names(&filter.apply(&sample())), vec!["Ana Souza", "Carla Dias"]);
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut filter = RowFilter::new();
        assert!(filter.toggle(StatusCategory::InProgress));
        assert_eq!(names(&filter.apply(&sample())), vec!["Bruno Lima"]);
        assert!(!filter.toggle(StatusCategory::InProgress));
        assert!(filter.categories.is_empty());
    }

    #[test]
    fn matches_agrees_with_apply() {
        let filter = RowFilter::new().query(Field::Name, "a").category(StatusCategory::Resolved);
        let records = sample();
        let expected: Vec<_> = records.iter().filter(|r| filter.matches(r)).cloned().collect();
        assert_eq!(filter.apply(&records), expected);
    }

    #[test]
    fn dataset_without_name_column_shows_nothing() {
        use crate::{AuthContext, DashboardView, Dataset, Tab};

        let records = vec![
            Record::new().with(Field::Status, "Solucionado"),
            Record::new().with(Field::Status, "Prejudicado"),
        ];
        let dataset = Dataset::new(Tab::Health, vec![Field::Status], records);
        let view = DashboardView::build(
            &AuthContext::new("admin", "Admin"),
            &dataset,
            &RowFilter::default(),
        );

        assert!(view.records.is_empty());
        assert_eq!(view.total_records, 2);
        assert_eq!(view.summary.total(), 0);
        assert_eq!(view.columns, vec![Field::Status]);
    }
}
