//! Excel workbook renderer
//!
//! Generates an XLSX file with two sheets:
//! - Fichas: the filtered records, status cells colored like the dashboard
//! - Resumo: per-category counts and percentages with a total row
//!
//! ```text
//! Sheet: Resumo
//! | Situação     | Quantidade | Percentual |
//! |--------------|------------|------------|
//! | Solucionado  | 2          | 33.3%      |
//! | Em Andamento | 1          | 16.7%      |
//! | ...          |            |            |
//! | Total        | 6          | 100.0%     |
//! ```

use fichas_core::status::{LabelContext, StatusCategory};
use fichas_core::{DashboardView, Field, RenderError, Renderer};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::theme::{hex_to_rgb, CellStyle, DashboardTheme};

/// Excel workbook renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    pub theme: DashboardTheme,
    /// Whether to include the Resumo sheet
    pub include_summary: bool,
    /// Upper bound for auto-sized column widths, in characters
    pub max_column_width: usize,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            theme: DashboardTheme::default(),
            include_summary: true,
            max_column_width: 50,
        }
    }
}

struct ExcelFormats {
    header: Format,
    text: Format,
    resolved: Format,
    in_progress: Format,
    harmed: Format,
    integer: Format,
    percent: Format,
    total_text: Format,
    total_integer: Format,
    total_percent: Format,
}

impl ExcelFormats {
    fn status(&self, category: StatusCategory) -> &Format {
        match category {
            StatusCategory::Resolved => &self.resolved,
            StatusCategory::InProgress => &self.in_progress,
            StatusCategory::Harmed => &self.harmed,
            StatusCategory::Unclassified => &self.text,
        }
    }
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(mut self, theme: DashboardTheme) -> Self {
        self.theme = theme;
        self
    }

    /// Only the Fichas sheet
    pub fn no_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, view: &DashboardView) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();

        self.add_records_sheet(&mut workbook, view, &formats)?;
        if self.include_summary {
            self.add_summary_sheet(&mut workbook, view, &formats)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn create_formats(&self) -> ExcelFormats {
        let brand = hex_to_rgb(&self.theme.brand_color).unwrap_or(0x004D26);
        let brand_text = hex_to_rgb(&self.theme.brand_text).unwrap_or(0xFFFFFF);

        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(brand)
            .set_font_color(brand_text)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let integer = Format::new()
            .set_num_format("0")
            .set_border(FormatBorder::Thin);

        let percent = Format::new()
            .set_num_format("0.0%")
            .set_border(FormatBorder::Thin);

        let total = Format::new()
            .set_bold()
            .set_background_color(0xE2EFDA)
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            header,
            resolved: status_format(&self.theme.resolved_cell),
            in_progress: status_format(&self.theme.in_progress_cell),
            harmed: status_format(&self.theme.harmed_cell),
            text,
            integer,
            percent,
            total_text: total.clone(),
            total_integer: total.clone().set_num_format("0"),
            total_percent: total.set_num_format("0.0%"),
        }
    }

    /// Add the Fichas sheet with the filtered records
    fn add_records_sheet(
        &self,
        workbook: &mut Workbook,
        view: &DashboardView,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Fichas")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (col, field) in view.columns.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, field.label(), &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for (i, record) in view.records.iter().enumerate() {
            let row = i as u32 + 1;
            let category = record.status_category();
            for (col, field) in view.columns.iter().enumerate() {
                let value = record.get(*field).unwrap_or_default();
                let format = if *field == Field::Status {
                    formats.status(category)
                } else {
                    &formats.text
                };
                sheet
                    .write_with_format(row, col as u16, value, format)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
        }

        self.size_columns(sheet, view);

        if !view.columns.is_empty() {
            sheet.set_freeze_panes(1, 0).ok();
            sheet
                .autofilter(0, 0, view.records.len() as u32, view.columns.len() as u16 - 1)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        Ok(())
    }

    /// Width of each column from its longest cell, header included
    fn size_columns(&self, sheet: &mut Worksheet, view: &DashboardView) {
        for (col, field) in view.columns.iter().enumerate() {
            let longest = view
                .records
                .iter()
                .filter_map(|r| r.get(*field))
                .map(|v| v.chars().count())
                .fold(field.label().chars().count(), usize::max);
            let width = (longest + 2).min(self.max_column_width);
            sheet.set_column_width(col as u16, width as f64).ok();
        }
    }

    /// Add the Resumo sheet with the status summary
    fn add_summary_sheet(
        &self,
        workbook: &mut Workbook,
        view: &DashboardView,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Resumo")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (col, header) in ["Situação", "Quantidade", "Percentual"].iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        sheet.set_column_width(0, 18).ok();
        sheet.set_column_width(1, 12).ok();
        sheet.set_column_width(2, 12).ok();

        let summary = &view.summary;
        let mut row = 1;
        for (category, count) in summary.iter() {
            sheet
                .write_with_format(row, 0, category.label(LabelContext::Chart), formats.status(category))
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 1, count as f64, &formats.integer)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 2, summary.percentage(category) / 100.0, &formats.percent)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            row += 1;
        }

        let total_share = if summary.is_empty() { 0.0 } else { 1.0 };
        sheet
            .write_with_format(row, 0, "Total", &formats.total_text)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet
            .write_with_format(row, 1, summary.total() as f64, &formats.total_integer)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet
            .write_with_format(row, 2, total_share, &formats.total_percent)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        sheet
            .write(row + 2, 0, format!("Aba: {}", view.tab.label()).as_str())
            .map_err(|e| RenderError::Format(e.to_string()))?;
        Ok(())
    }
}

fn status_format(style: &CellStyle) -> Format {
    let mut format = Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    if let Some(background) = hex_to_rgb(&style.background) {
        format = format.set_background_color(background);
    }
    if let Some(color) = hex_to_rgb(&style.color) {
        format = format.set_font_color(color);
    }
    if style.bold {
        format = format.set_bold();
    }
    format
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, view: &DashboardView) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fichas_core::filter::RowFilter;
    use fichas_core::{AuthContext, Dataset, Record, Tab};

    fn view(records: Vec<Record>) -> DashboardView {
        let dataset = Dataset::new(Tab::Health, vec![Field::Name, Field::Status], records);
        DashboardView::build(&AuthContext::new("admin", "Admin"), &dataset, &RowFilter::default())
    }

    #[test]
    fn renders_xlsx_zip() {
        let bytes = ExcelRenderer::new()
            .render(&view(vec![
                Record::new().with(Field::Name, "Lia").with(Field::Status, "Solucionado"),
                Record::new().with(Field::Name, "Rui").with(Field::Status, "Prejudicado"),
            ]))
            .unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn renders_empty_view() {
        let bytes = ExcelRenderer::new().render(&view(Vec::new())).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn renders_without_columns() {
        let dataset = Dataset::new(Tab::Legal, Vec::new(), Vec::new());
        let view = DashboardView::build(
            &AuthContext::new("admin", "Admin"),
            &dataset,
            &RowFilter::default(),
        );
        let bytes = ExcelRenderer::new().no_summary().render(&view).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
