//! Standalone HTML dashboard renderer
//!
//! Generates a single self-contained page: branded header bar, the applied
//! filters, the records table with colored status cells, the embedded SVG
//! donut chart and a footer. No scripts and no external assets besides an
//! optional logo URL.

use fichas_core::status::LabelContext;
use fichas_core::{DashboardView, Field, RenderError, Renderer};

use crate::pie::SvgPieRenderer;
use crate::theme::DashboardTheme;
use crate::{describe_filter, format_percent, view_heading, NO_COLUMNS_MESSAGE};

/// HTML dashboard renderer configuration
#[derive(Clone, Debug)]
pub struct HtmlDashboardRenderer {
    /// Text of the header bar and page title
    pub title: String,
    pub footer: Option<String>,
    /// Image shown on the left of the header bar
    pub logo_url: Option<String>,
    pub theme: DashboardTheme,
    /// Chart embedded below the table
    pub pie: SvgPieRenderer,
}

impl Default for HtmlDashboardRenderer {
    fn default() -> Self {
        Self {
            title: "Fichas de Atendimento".into(),
            footer: None,
            logo_url: None,
            theme: DashboardTheme::default(),
            pie: SvgPieRenderer::default(),
        }
    }
}

impl HtmlDashboardRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    /// Use a theme for the page and the embedded chart
    pub fn theme(mut self, theme: DashboardTheme) -> Self {
        self.pie = self.pie.theme(theme.clone());
        self.theme = theme;
        self
    }

    fn generate_css(&self) -> String {
        let t = &self.theme;
        format!(
            r#"        * {{ box-sizing: border-box; }}
        body {{
            margin: 0;
            font-family: {font};
            background: {bg};
            color: {text};
        }}
        .header-bar {{
            display: flex;
            align-items: center;
            gap: 16px;
            padding: 14px 24px;
            background: {brand};
            border-bottom: 3px solid {border};
            color: {brand_text};
        }}
        .header-bar h1 {{ margin: 0; font-size: 1.6rem; }}
        .header-bar img {{ height: 48px; }}
        main {{ padding: 20px 24px; }}
        .filters {{ color: #555; margin-bottom: 12px; }}
        .count {{ font-size: 0.9rem; color: #555; }}
        table.fichas {{ border-collapse: collapse; width: 100%; font-size: 0.85rem; }}
        table.fichas th {{
            background: {brand};
            color: {brand_text};
            padding: 6px 8px;
            text-align: left;
        }}
        table.fichas td {{ border-bottom: 1px solid #e1e4e8; padding: 5px 8px; }}
        .empty {{ font-style: italic; color: #777; }}
        .chart {{ margin-top: 24px; }}
        table.summary td {{ padding: 2px 10px; }}
        footer {{
            margin-top: 32px;
            padding: 12px 24px;
            background: {brand};
            color: {brand_text};
            font-size: 0.85rem;
        }}"#,
            font = t.font_family,
            bg = t.background_color,
            text = t.text_color,
            brand = t.brand_color,
            border = t.brand_border,
            brand_text = t.brand_text,
        )
    }

    fn generate_header(&self) -> String {
        let logo = self
            .logo_url
            .as_deref()
            .map(|url| format!(r#"<img src="{}" alt="">"#, html_escape(url)))
            .unwrap_or_default();
        format!(
            r#"    <div class="header-bar">{logo}<h1>{}</h1></div>"#,
            html_escape(&self.title)
        )
    }

    fn generate_table(&self, view: &DashboardView) -> String {
        if view.columns.is_empty() {
            return format!(r#"<p class="empty">{}</p>"#, html_escape(NO_COLUMNS_MESSAGE));
        }

        let mut html = String::from("<table class=\"fichas\">\n<thead><tr>");
        for field in &view.columns {
            html.push_str(&format!("<th>{}</th>", html_escape(field.label())));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        if view.records.is_empty() {
            html.push_str(&format!(
                r#"<tr><td colspan="{}" class="empty">Nenhuma ficha encontrada.</td></tr>"#,
                view.columns.len()
            ));
            html.push('\n');
        }

        for record in &view.records {
            html.push_str("<tr>");
            for field in &view.columns {
                let value = html_escape(record.get(*field).unwrap_or_default());
                if *field == Field::Status {
                    let style = self
                        .theme
                        .cell_style(record.status_category())
                        .map(|s| s.css())
                        .unwrap_or_else(|| "text-align:center;".to_string());
                    html.push_str(&format!(r#"<td style="{style}">{value}</td>"#));
                } else {
                    html.push_str(&format!("<td>{value}</td>"));
                }
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>");
        html
    }

    fn generate_summary_table(&self, view: &DashboardView) -> String {
        let mut html = String::from("<table class=\"summary\">\n");
        for (category, count) in view.summary.iter() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{count}</td><td>{}</td></tr>\n",
                html_escape(category.label(LabelContext::Chart)),
                format_percent(view.summary.percentage(category))
            ));
        }
        html.push_str(&format!(
            "<tr><td><strong>Total</strong></td><td><strong>{}</strong></td><td></td></tr>\n</table>",
            view.summary.total()
        ));
        html
    }

    fn generate_footer(&self, view: &DashboardView) -> String {
        let mut meta = format!("Usuário: {}", html_escape(&view.viewer.display_name));
        if let Some(at) = view.generated_at {
            meta.push_str(&format!(" | Gerado em {}", at.format("%d/%m/%Y %H:%M")));
        }
        let text = self
            .footer
            .as_deref()
            .map(|f| format!("<div>{}</div>", html_escape(f)))
            .unwrap_or_default();
        format!("    <footer><div>{meta}</div>{text}</footer>")
    }
}

impl Renderer for HtmlDashboardRenderer {
    type Output = String;

    fn render(&self, view: &DashboardView) -> Result<String, RenderError> {
        let chart = self.pie.render(view)?;

        let filters = describe_filter(&view.filter);
        let filters = if filters.is_empty() {
            "Sem filtros aplicados".to_string()
        } else {
            filters.iter().map(|f| html_escape(f)).collect::<Vec<_>>().join(" | ")
        };

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {tab}</title>
    <style>
{css}
    </style>
</head>
<body>
{header}
    <main>
        <h2>{heading}</h2>
        <div class="filters">{filters}</div>
        <div class="count">{shown} de {total} fichas</div>
{table}
        <div class="chart">
            <h3>Situação da Demanda</h3>
{chart}
{summary}
        </div>
    </main>
{footer}
</body>
</html>
"#,
            title = html_escape(&self.title),
            tab = html_escape(view.tab.label()),
            css = self.generate_css(),
            header = self.generate_header(),
            heading = html_escape(&view_heading(view)),
            filters = filters,
            shown = view.records.len(),
            total = view.total_records,
            table = self.generate_table(view),
            chart = chart,
            summary = self.generate_summary_table(view),
            footer = self.generate_footer(view),
        ))
    }
}

/// Escape text for HTML element content and attribute values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
