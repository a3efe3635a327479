//! # fichas-core
//!
//! Core domain model for the fichas service record dashboard.
//!
//! This crate provides:
//! - Domain types: `Tab`, `Field`, `Record`, `Dataset`, `AuthContext`
//! - Status classification and aggregation (`status` module)
//! - Row filtering (`filter` module)
//! - The `DashboardView` entry point and the `Renderer` trait
//! - Error types shared by the source and render crates
//!
//! ## Example
//!
//! ```rust
//! use fichas_core::{AuthContext, Dataset, DashboardView, Field, Record, Tab};
//! use fichas_core::filter::RowFilter;
//! use fichas_core::status::StatusCategory;
//!
//! let dataset = Dataset::new(
//!     Tab::General,
//!     vec![Field::Name, Field::Status],
//!     vec![
//!         Record::new().with(Field::Name, "Maria").with(Field::Status, "Solucionado"),
//!         Record::new().with(Field::Name, "   ").with(Field::Status, "Em andamento"),
//!     ],
//! );
//!
//! let viewer = AuthContext::new("admin", "Admin");
//! let view = DashboardView::build(&viewer, &dataset, &RowFilter::default());
//!
//! assert_eq!(view.records.len(), 1);
//! assert_eq!(view.summary.count(StatusCategory::Resolved), 1);
//! ```

pub mod filter;
pub mod status;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::filter::RowFilter;
use crate::status::{StatusCategory, StatusSummary};

/// Collapse runs of whitespace into a single space and trim both ends.
///
/// Spreadsheet headers routinely carry doubled spaces and line breaks; every
/// header comparison in the workspace goes through this function.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tab
// ============================================================================

/// A section of the source spreadsheet, one per demand domain
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// "Demandas Gerais"
    General,
    /// "Demandas Oftalmológicas"
    Ophthalmologic,
    /// "Demandas da Saúde"
    Health,
    /// "Demandas Jurídicas"
    Legal,
}

impl Tab {
    /// All tabs in display order
    pub const ALL: [Tab; 4] = [Tab::General, Tab::Ophthalmologic, Tab::Health, Tab::Legal];

    /// Human-readable label shown in headings and chart legends
    pub fn label(&self) -> &'static str {
        match self {
            Tab::General => "Demandas Gerais",
            Tab::Ophthalmologic => "Demandas Oftalmológicas",
            Tab::Health => "Demandas da Saúde",
            Tab::Legal => "Demandas Jurídicas",
        }
    }

    /// Sheet identifier (`gid`) of the tab in the spreadsheet export URL
    pub fn gid(&self) -> &'static str {
        match self {
            Tab::General => "0",
            Tab::Ophthalmologic => "1946301846",
            Tab::Health => "27665281",
            Tab::Legal => "1416239426",
        }
    }

    /// Short ASCII name, used for local file names and CLI arguments
    pub fn slug(&self) -> &'static str {
        match self {
            Tab::General => "gerais",
            Tab::Ophthalmologic => "oftalmologicas",
            Tab::Health => "saude",
            Tab::Legal => "juridicas",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Tab {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = collapse_whitespace(s).to_lowercase();
        Tab::ALL
            .into_iter()
            .find(|tab| {
                tab.slug() == wanted || tab.gid() == wanted || tab.label().to_lowercase() == wanted
            })
            .ok_or_else(|| UnknownName::new("tab", s))
    }
}

// ============================================================================
// Field
// ============================================================================

/// Canonical record field.
///
/// Variant order is the canonical display order; `Record` iterates fields in
/// this order because it is keyed by `Field` in a `BTreeMap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Phone,
    Street,
    Number,
    Neighborhood,
    DemandArea,
    Summary,
    Responsible,
    Status,
    StatusDescription,
    UpdatedAt,
}

impl Field {
    /// All fields in canonical order
    pub const ALL: [Field; 11] = [
        Field::Name,
        Field::Phone,
        Field::Street,
        Field::Number,
        Field::Neighborhood,
        Field::DemandArea,
        Field::Summary,
        Field::Responsible,
        Field::Status,
        Field::StatusDescription,
        Field::UpdatedAt,
    ];

    /// Column heading used in every rendered table
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Nome",
            Field::Phone => "Telefone",
            Field::Street => "Rua",
            Field::Number => "Número",
            Field::Neighborhood => "Bairro",
            Field::DemandArea => "Área da Demanda",
            Field::Summary => "Resumo da Demanda",
            Field::Responsible => "Servidor Responsável",
            Field::Status => "Situação da Demanda",
            Field::StatusDescription => "Descrição da Situação",
            Field::UpdatedAt => "Data da Atualização",
        }
    }

    /// Stable machine key, matches the serde representation
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone => "phone",
            Field::Street => "street",
            Field::Number => "number",
            Field::Neighborhood => "neighborhood",
            Field::DemandArea => "demand_area",
            Field::Summary => "summary",
            Field::Responsible => "responsible",
            Field::Status => "status",
            Field::StatusDescription => "status_description",
            Field::UpdatedAt => "updated_at",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Field {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = collapse_whitespace(s).to_lowercase();
        let as_key = wanted.replace(['-', ' '], "_");
        Field::ALL
            .into_iter()
            .find(|field| field.key() == as_key || field.label().to_lowercase() == wanted)
            .ok_or_else(|| UnknownName::new("field", s))
    }
}

// ============================================================================
// Record
// ============================================================================

/// One service record: canonical field → value.
///
/// A field that the source does not provide is absent from the map, which is
/// different from a field that is present with an empty value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<Field, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    /// Value of a field, `None` when the field is absent
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Whether the field is part of this record's field set
    pub fn has(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// True when the field is present and holds something besides whitespace
    pub fn is_filled(&self, field: Field) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    /// Present fields in canonical order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.values.keys().copied()
    }

    /// Present `(field, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Status category derived from the status field
    pub fn status_category(&self) -> StatusCategory {
        StatusCategory::classify(self.get(Field::Status))
    }
}

impl FromIterator<(Field, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Mapped records loaded from one spreadsheet tab
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Tab the data was loaded from
    pub tab: Tab,
    /// Canonical columns present in the source, in canonical order
    pub columns: Vec<Field>,
    /// Records in source order
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(tab: Tab, columns: Vec<Field>, records: Vec<Record>) -> Self {
        Self {
            tab,
            columns,
            records,
        }
    }

    /// Whether the source provided the given column
    pub fn has_column(&self, field: Field) -> bool {
        self.columns.contains(&field)
    }
}

// ============================================================================
// Authentication context
// ============================================================================

/// Identity of an authenticated viewer.
///
/// The core never authenticates anybody; it only requires proof that the
/// caller went through a login gate before building a view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub username: String,
    pub display_name: String,
}

impl AuthContext {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
        }
    }
}

// ============================================================================
// Dashboard view
// ============================================================================

/// Everything a renderer needs for one interaction: filtered rows plus summary
#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
    pub tab: Tab,
    pub viewer: AuthContext,
    /// Visible columns, canonical order
    pub columns: Vec<Field>,
    /// Records that survived the filter, source order
    pub records: Vec<Record>,
    /// Number of records in the dataset before filtering
    pub total_records: usize,
    /// Category counts over `records`
    pub summary: StatusSummary,
    /// Filter that produced `records`
    pub filter: RowFilter,
    /// When the view was produced (local time), if the caller tracks it
    pub generated_at: Option<NaiveDateTime>,
}

impl DashboardView {
    /// Filter a dataset and summarize the result for an authenticated viewer
    pub fn build(auth: &AuthContext, dataset: &Dataset, filter: &RowFilter) -> Self {
        let records = filter.apply(&dataset.records);
        let summary = StatusSummary::from_records(&records);

        Self {
            tab: dataset.tab,
            viewer: auth.clone(),
            columns: dataset.columns.clone(),
            records,
            total_records: dataset.records.len(),
            summary,
            filter: filter.clone(),
            generated_at: None,
        }
    }

    /// Stamp the view with a generation time
    pub fn generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a dashboard view to the output format
    fn render(&self, view: &DashboardView) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// A name given on the command line or in config did not match any variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownName {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Data source error.
///
/// Either variant is terminal for the current interaction.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable ({source_id}): {reason}")]
    Unavailable { source_id: String, reason: String },

    #[error("Malformed CSV ({source_id}): {reason}")]
    Malformed { source_id: String, reason: String },
}

impl SourceError {
    /// Identifier of the source that failed
    pub fn source_id(&self) -> &str {
        match self {
            SourceError::Unavailable { source_id, .. } | SourceError::Malformed { source_id, .. } => {
                source_id
            }
        }
    }
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
