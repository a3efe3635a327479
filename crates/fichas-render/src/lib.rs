//! # fichas-render
//!
//! Rendering backends for fichas dashboard views.
//!
//! This crate provides:
//! - Standalone HTML dashboard (records table with colored status cells + chart)
//! - SVG donut chart of the status summary
//! - Excel workbook export
//! - Plain text and CSV output
//!
//! ## Example
//!
//! ```rust,ignore
//! use fichas_core::{DashboardView, Renderer};
//! use fichas_render::{ExcelRenderer, HtmlDashboardRenderer, SvgPieRenderer, TextRenderer};
//!
//! let html = HtmlDashboardRenderer::new().render(&view)?;
//! let svg = SvgPieRenderer::new().render(&view)?;
//! let xlsx_bytes = ExcelRenderer::new().render(&view)?;
//! std::fs::write("fichas.xlsx", xlsx_bytes)?;
//! println!("{}", TextRenderer::new().render(&view)?);
//! ```

pub mod excel;
pub mod html;
pub mod pie;
pub mod theme;

pub use excel::ExcelRenderer;
pub use html::HtmlDashboardRenderer;
pub use pie::SvgPieRenderer;
pub use theme::{CellStyle, DashboardTheme};

use fichas_core::filter::RowFilter;
use fichas_core::status::LabelContext;
use fichas_core::{DashboardView, RenderError, Renderer};

/// Shown instead of a table when the tab exposes none of the known columns
pub const NO_COLUMNS_MESSAGE: &str = "Não há colunas disponíveis nesta aba.";

/// Shown instead of a chart when there is nothing to count
pub const NO_CHART_DATA_MESSAGE: &str = "Sem dados para exibir o gráfico.";

/// Heading of the records table for a view
pub fn view_heading(view: &DashboardView) -> String {
    format!("Fichas de Atendimento - {}", view.tab.label())
}

/// Human-readable description of the narrowing parts of a filter
pub fn describe_filter(filter: &RowFilter) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(query) = filter.active_query() {
        parts.push(format!("{} contém \"{}\"", query.field.label(), query.text));
    }
    if !filter.categories.is_empty() {
        let labels: Vec<_> = filter
            .categories
            .iter()
            .map(|c| c.label(LabelContext::Table))
            .collect();
        parts.push(format!("Situação: {}", labels.join(", ")));
    }
    parts
}

/// Percentage with one decimal, e.g. `33.3%`
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Truncate to a number of characters, ending with an ellipsis when cut
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!(
            "{}…",
            s.chars().take(max.saturating_sub(1)).collect::<String>()
        )
    }
}

/// Plain text renderer for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Longest cell content before truncation, in characters
    pub max_column_width: usize,
    pub show_table: bool,
    pub show_summary: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            max_column_width: 28,
            show_table: true,
            show_summary: true,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the status summary, no records table
    pub fn summary_only() -> Self {
        Self {
            show_table: false,
            ..Self::default()
        }
    }

    /// Configure maximum cell width
    pub fn max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width.max(2);
        self
    }

    fn render_table(&self, view: &DashboardView, out: &mut String) {
        if view.columns.is_empty() {
            out.push_str(NO_COLUMNS_MESSAGE);
            out.push('\n');
            return;
        }
        if view.records.is_empty() {
            out.push_str("Nenhuma ficha encontrada.\n");
            return;
        }

        let rows: Vec<Vec<String>> = view
            .records
            .iter()
            .map(|record| {
                view.columns
                    .iter()
                    .map(|field| {
                        let value = record.get(*field).unwrap_or_default();
                        truncate(&fichas_core::collapse_whitespace(value), self.max_column_width)
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = view
            .columns
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let header = truncate(field.label(), self.max_column_width).chars().count();
                rows.iter()
                    .map(|row| row[i].chars().count())
                    .fold(header, usize::max)
            })
            .collect();

        let headers: Vec<String> = view
            .columns
            .iter()
            .map(|field| truncate(field.label(), self.max_column_width))
            .collect();
        push_row(out, &headers, &widths);

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');

        for row in &rows {
            push_row(out, row, &widths);
        }
    }

    fn render_summary(&self, view: &DashboardView, out: &mut String) {
        out.push_str("Situação da Demanda\n");
        if view.summary.is_empty() {
            out.push_str("  ");
            out.push_str(NO_CHART_DATA_MESSAGE);
            out.push('\n');
            return;
        }
        for (category, count) in view.summary.iter() {
            out.push_str(&format!(
                "  {:<14} {:>5}  {:>6}\n",
                category.label(LabelContext::Chart),
                count,
                format_percent(view.summary.percentage(category))
            ));
        }
        out.push_str(&format!("  {:<14} {:>5}\n", "Total", view.summary.total()));
    }
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, view: &DashboardView) -> Result<String, RenderError> {
        let mut out = String::new();

        out.push_str(&view_heading(view));
        out.push('\n');
        out.push_str(&format!("{} de {} fichas", view.records.len(), view.total_records));
        let filters = describe_filter(&view.filter);
        if !filters.is_empty() {
            out.push_str(" | ");
            out.push_str(&filters.join(" | "));
        }
        out.push_str("\n\n");

        if self.show_table {
            self.render_table(view, &mut out);
            out.push('\n');
        }
        if self.show_summary {
            self.render_summary(view, &mut out);
        }

        Ok(out)
    }
}

/// CSV renderer: visible columns with display labels as header
#[derive(Clone, Debug, Default)]
pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    type Output = String;

    fn render(&self, view: &DashboardView) -> Result<String, RenderError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(view.columns.iter().map(|f| f.label()))
            .map_err(|e| RenderError::Format(format!("Failed to write CSV: {e}")))?;

        for record in &view.records {
            writer
                .write_record(view.columns.iter().map(|f| record.get(*f).unwrap_or_default()))
                .map_err(|e| RenderError::Format(format!("Failed to write CSV: {e}")))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| RenderError::Format(format!("Failed to flush CSV: {e}")))?;
        String::from_utf8(bytes).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {e}")))
    }
}
