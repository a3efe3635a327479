//! Colors and cell styles shared by the HTML, SVG and Excel renderers

use fichas_core::status::StatusCategory;
use serde::{Deserialize, Serialize};

/// Highlight of a status cell in the records table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub background: String,
    pub color: String,
    pub bold: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            background: "#ffffff".into(),
            color: "#000000".into(),
            bold: false,
        }
    }
}

impl CellStyle {
    pub fn new(background: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            background: background.into(),
            color: color.into(),
            bold: true,
        }
    }

    /// Inline CSS declaration for a table cell
    pub fn css(&self) -> String {
        let weight = if self.bold { "font-weight:bold;" } else { "" };
        format!(
            "background-color:{};color:{};{}text-align:center;",
            self.background, self.color, weight
        )
    }
}

/// Dashboard color scheme
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardTheme {
    /// Header and footer background
    pub brand_color: String,
    pub brand_border: String,
    pub brand_text: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,

    pub resolved_cell: CellStyle,
    pub in_progress_cell: CellStyle,
    pub harmed_cell: CellStyle,

    pub resolved_color: String,
    pub in_progress_color: String,
    pub harmed_color: String,
    pub other_color: String,
}

impl Default for DashboardTheme {
    fn default() -> Self {
        Self {
            brand_color: "#004D26".into(),
            brand_border: "#003300".into(),
            brand_text: "#ffffff".into(),
            background_color: "#ffffff".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),

            resolved_cell: CellStyle::new("#33cc33", "#ffffff"),
            in_progress_cell: CellStyle::new("#ffd633", "#000000"),
            harmed_cell: CellStyle::new("#ff4d4d", "#ffffff"),

            resolved_color: "#28a745".into(),
            in_progress_color: "#ffd633".into(),
            harmed_color: "#ff4d4d".into(),
            other_color: "#B0B8BF".into(),
        }
    }
}

impl DashboardTheme {
    /// Table highlight for a category; unclassified statuses are not highlighted
    pub fn cell_style(&self, category: StatusCategory) -> Option<&CellStyle> {
        match category {
            StatusCategory::Resolved => Some(&self.resolved_cell),
            StatusCategory::InProgress => Some(&self.in_progress_cell),
            StatusCategory::Harmed => Some(&self.harmed_cell),
            StatusCategory::Unclassified => None,
        }
    }

    /// Chart slice color for a category
    pub fn chart_color(&self, category: StatusCategory) -> &str {
        match category {
            StatusCategory::Resolved => &self.resolved_color,
            StatusCategory::InProgress => &self.in_progress_color,
            StatusCategory::Harmed => &self.harmed_color,
            StatusCategory::Unclassified => &self.other_color,
        }
    }
}

/// Parse `#rrggbb` (or `rrggbb`) into a 24-bit RGB value
pub fn hex_to_rgb(color: &str) -> Option<u32> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
