//! SVG donut chart of the status summary
//!
//! One slice per non-empty category, drawn clockwise from twelve o'clock in
//! display order (Solucionado, Em Andamento, Prejudicado, Outros). Slices
//! carry their percentage; the legend on the right lists every category with
//! its count.

use std::f64::consts::{FRAC_PI_2, TAU};

use fichas_core::status::{LabelContext, StatusCategory, StatusSummary};
use fichas_core::{DashboardView, RenderError, Renderer};
use svg::node::element::{Circle, Group, Path, Rectangle, Text};
use svg::Document;

use crate::theme::DashboardTheme;
use crate::{format_percent, NO_CHART_DATA_MESSAGE};

/// Slices smaller than this share of the total get no percentage label
const MIN_LABEL_SHARE: f64 = 0.04;

/// SVG donut chart renderer
#[derive(Clone, Debug)]
pub struct SvgPieRenderer {
    /// Diameter of the chart area
    pub size: u32,
    /// Inner radius as a fraction of the outer radius
    pub hole_ratio: f64,
    pub padding: u32,
    pub legend_width: u32,
    pub font_family: String,
    pub font_size: u32,
    pub theme: DashboardTheme,
}

impl Default for SvgPieRenderer {
    fn default() -> Self {
        let theme = DashboardTheme::default();
        Self {
            size: 380,
            hole_ratio: 0.55,
            padding: 16,
            legend_width: 190,
            font_family: theme.font_family.clone(),
            font_size: 13,
            theme,
        }
    }
}

impl SvgPieRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure chart diameter
    pub fn size(mut self, size: u32) -> Self {
        self.size = size.max(40);
        self
    }

    /// Configure the donut hole, clamped to `0.0..0.95`
    pub fn hole_ratio(mut self, ratio: f64) -> Self {
        self.hole_ratio = ratio.clamp(0.0, 0.95);
        self
    }

    pub fn theme(mut self, theme: DashboardTheme) -> Self {
        self.font_family = theme.font_family.clone();
        self.theme = theme;
        self
    }

    fn outer_radius(&self) -> f64 {
        f64::from(self.size) / 2.0 - f64::from(self.padding)
    }

    fn center(&self) -> (f64, f64) {
        let half = f64::from(self.size) / 2.0;
        (half, half)
    }

    /// Point on a circle, angle measured clockwise from twelve o'clock
    fn point(&self, radius: f64, angle: f64) -> (f64, f64) {
        let (cx, cy) = self.center();
        let theta = angle - FRAC_PI_2;
        (cx + radius * theta.cos(), cy + radius * theta.sin())
    }

    /// Path data for a ring segment between two angles
    fn slice_data(&self, start: f64, end: f64) -> String {
        let outer = self.outer_radius();
        let inner = outer * self.hole_ratio;
        let large_arc = u8::from(end - start > std::f64::consts::PI);

        let (ox0, oy0) = self.point(outer, start);
        let (ox1, oy1) = self.point(outer, end);
        let (ix1, iy1) = self.point(inner, end);
        let (ix0, iy0) = self.point(inner, start);

        if inner > 0.0 {
            format!(
                "M {ox0:.2} {oy0:.2} A {outer:.2} {outer:.2} 0 {large_arc} 1 {ox1:.2} {oy1:.2} \
                 L {ix1:.2} {iy1:.2} A {inner:.2} {inner:.2} 0 {large_arc} 0 {ix0:.2} {iy0:.2} Z"
            )
        } else {
            let (cx, cy) = self.center();
            format!(
                "M {cx:.2} {cy:.2} L {ox0:.2} {oy0:.2} \
                 A {outer:.2} {outer:.2} 0 {large_arc} 1 {ox1:.2} {oy1:.2} Z"
            )
        }
    }

    fn render_slices(&self, summary: &StatusSummary) -> Group {
        let mut group = Group::new().set("class", "slices");
        let total = summary.total() as f64;
        let outer = self.outer_radius();
        let inner = outer * self.hole_ratio;
        let (cx, cy) = self.center();

        let filled: Vec<(StatusCategory, usize)> =
            summary.iter().filter(|(_, count)| *count > 0).collect();

        // A single category covers the whole ring; an arc cannot start and end
        // on the same point, so draw it as circles instead.
        if let [(category, _)] = filled.as_slice() {
            group = group.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", outer)
                    .set("fill", self.theme.chart_color(*category))
                    .set("class", category.key()),
            );
            if inner > 0.0 {
                group = group.add(
                    Circle::new()
                        .set("cx", cx)
                        .set("cy", cy)
                        .set("r", inner)
                        .set("fill", self.theme.background_color.as_str()),
                );
            }
            return group.add(self.slice_label(0.0, TAU, 100.0));
        }

        let mut angle = 0.0;
        for (category, count) in filled {
            let share = count as f64 / total;
            let end = angle + share * TAU;

            group = group.add(
                Path::new()
                    .set("d", self.slice_data(angle, end))
                    .set("fill", self.theme.chart_color(category))
                    .set("stroke", self.theme.background_color.as_str())
                    .set("stroke-width", 1)
                    .set("class", category.key()),
            );
            if share >= MIN_LABEL_SHARE {
                group = group.add(self.slice_label(angle, end, share * 100.0));
            }
            angle = end;
        }
        group
    }

    fn slice_label(&self, start: f64, end: f64, percent: f64) -> Text {
        let outer = self.outer_radius();
        let mid_radius = (outer + outer * self.hole_ratio) / 2.0;
        let (x, y) = self.point(mid_radius, (start + end) / 2.0);

        Text::new(format_percent(percent))
            .set("x", x)
            .set("y", y + f64::from(self.font_size) / 3.0)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("font-weight", "bold")
            .set("fill", self.theme.text_color.as_str())
            .set("text-anchor", "middle")
    }

    fn render_legend(&self, summary: &StatusSummary, title: &str) -> Group {
        let x = f64::from(self.size);
        let line_height = f64::from(self.font_size) * 1.9;
        let top = f64::from(self.size) / 2.0 - line_height * 2.5;

        let mut group = Group::new().set("class", "legend").add(
            Text::new(title)
                .set("x", x)
                .set("y", top)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size + 1)
                .set("font-weight", "bold")
                .set("fill", self.theme.text_color.as_str()),
        );

        for (i, (category, count)) in summary.iter().enumerate() {
            let y = top + line_height * (i as f64 + 1.0);
            let swatch = f64::from(self.font_size);
            group = group
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y - swatch + 2.0)
                        .set("width", swatch)
                        .set("height", swatch)
                        .set("fill", self.theme.chart_color(category)),
                )
                .add(
                    Text::new(format!("{} ({count})", category.label(LabelContext::Chart)))
                        .set("x", x + swatch + 6.0)
                        .set("y", y)
                        .set("font-family", self.font_family.as_str())
                        .set("font-size", self.font_size)
                        .set("fill", self.theme.text_color.as_str()),
                );
        }
        group
    }

    fn render_placeholder(&self) -> Text {
        let (cx, cy) = self.center();
        Text::new(NO_CHART_DATA_MESSAGE)
            .set("x", cx)
            .set("y", cy)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.theme.text_color.as_str())
            .set("text-anchor", "middle")
    }

    /// Render a summary directly; `legend_title` heads the legend
    pub fn render_summary(
        &self,
        summary: &StatusSummary,
        legend_title: &str,
    ) -> Result<String, RenderError> {
        if !(0.0..1.0).contains(&self.hole_ratio) {
            return Err(RenderError::InvalidData(format!(
                "hole ratio must be in [0, 1), got {}",
                self.hole_ratio
            )));
        }

        let width = self.size + self.legend_width;
        let height = self.size;

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        document = document.add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", self.theme.background_color.as_str()),
        );

        if summary.is_empty() {
            document = document.add(self.render_placeholder());
        } else {
            document = document
                .add(self.render_slices(summary))
                .add(self.render_legend(summary, legend_title));
        }

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {e}")))?;

        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {e}")))
    }
}

impl Renderer for SvgPieRenderer {
    type Output = String;

    fn render(&self, view: &DashboardView) -> Result<String, RenderError> {
        self.render_summary(&view.summary, view.tab.label())
    }
}
