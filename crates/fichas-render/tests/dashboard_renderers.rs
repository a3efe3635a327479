//! Integration tests for the dashboard renderers

use fichas_core::filter::RowFilter;
use fichas_core::status::StatusCategory;
use fichas_core::{AuthContext, Dataset, DashboardView, Field, Record, Renderer, Tab};
use fichas_render::{
    CsvRenderer, DashboardTheme, ExcelRenderer, HtmlDashboardRenderer, SvgPieRenderer,
    TextRenderer,
};
use pretty_assertions::assert_eq;

fn admin() -> AuthContext {
    AuthContext::new("admin", "Admin")
}

fn create_general_dataset() -> Dataset {
    Dataset::new(
        Tab::General,
        vec![Field::Name, Field::Neighborhood, Field::Status],
        vec![
            Record::new()
                .with(Field::Name, "Ana Paula Souza")
                .with(Field::Neighborhood, "Centro")
                .with(Field::Status, "Solucionado"),
            Record::new()
                .with(Field::Name, "Bruno <b>Lima</b>")
                .with(Field::Neighborhood, "Vila & Jardim")
                .with(Field::Status, "Em andamento"),
            Record::new()
                .with(Field::Name, "Carla Dias")
                .with(Field::Neighborhood, "Centro")
                .with(Field::Status, "PREJUDICADO"),
            Record::new()
                .with(Field::Name, "Daniel Rocha")
                .with(Field::Status, "Aguardando documentos"),
            Record::new().with(Field::Neighborhood, "Centro").with(Field::Status, "Solucionado"),
        ],
    )
}

fn view(filter: &RowFilter) -> DashboardView {
    DashboardView::build(&admin(), &create_general_dataset(), filter)
}

// =============================================================================
// HTML
// =============================================================================

#[test]
fn html_status_cells_carry_category_colors() {
    let html = HtmlDashboardRenderer::new().render(&view(&RowFilter::default())).unwrap();

    assert!(html.contains(
        r#"<td style="background-color:#33cc33;color:#ffffff;font-weight:bold;text-align:center;">Solucionado</td>"#
    ));
    assert!(html.contains(
        r#"<td style="background-color:#ffd633;color:#000000;font-weight:bold;text-align:center;">Em andamento</td>"#
    ));
    assert!(html.contains(
        r#"<td style="background-color:#ff4d4d;color:#ffffff;font-weight:bold;text-align:center;">PREJUDICADO</td>"#
    ));
    assert!(html.contains(r#"<td style="text-align:center;">Aguardando documentos</td>"#));
}

#[test]
fn html_escapes_untrusted_text() {
    let html = HtmlDashboardRenderer::new().render(&view(&RowFilter::default())).unwrap();

    assert!(html.contains("Bruno &lt;b&gt;Lima&lt;/b&gt;"));
    assert!(html.contains("Vila &amp; Jardim"));
    assert!(!html.contains("<b>Lima</b>"));
}

#[test]
fn html_describes_filters_and_counts() {
    let filter = RowFilter::new()
        .query(Field::Neighborhood, "centro")
        .category(StatusCategory::Resolved);
    let html = HtmlDashboardRenderer::new().render(&view(&filter)).unwrap();

    assert!(html.contains("Bairro contém &quot;centro&quot; | Situação: Solucionado"));
    assert!(html.contains("1 de 5 fichas"));
    assert!(html.contains("Ana Paula Souza"));
    assert!(!html.contains("Carla Dias"));
}

#[test]
fn html_uses_custom_theme_and_title() {
    let theme = DashboardTheme {
        brand_color: "#112233".into(),
        ..DashboardTheme::default()
    };
    let html = HtmlDashboardRenderer::new()
        .title("Gabinete <Vereador>")
        .theme(theme)
        .render(&view(&RowFilter::default()))
        .unwrap();

    assert!(html.contains("background: #112233;"));
    assert!(html.contains("<h1>Gabinete &lt;Vereador&gt;</h1>"));
}

// =============================================================================
// SVG
// =============================================================================

#[test]
fn svg_chart_reflects_filtered_summary() {
    let svg = SvgPieRenderer::new().render(&view(&RowFilter::default())).unwrap();

    // Record without a name is excluded before counting
    assert_eq!(svg.matches("<path").count(), 4);
    assert!(svg.contains("Solucionado (1)"));
    assert!(svg.contains("Outros (1)"));
    assert!(svg.contains("Demandas Gerais"));
}

#[test]
fn svg_placeholder_when_nothing_matches() {
    let filter = RowFilter::new().query(Field::Name, "ninguém");
    let svg = SvgPieRenderer::new().render(&view(&filter)).unwrap();
    assert!(svg.contains(fichas_render::NO_CHART_DATA_MESSAGE));
}

// =============================================================================
// XLSX, text and CSV
// =============================================================================

#[test]
fn excel_workbook_is_a_zip_archive() {
    let bytes = ExcelRenderer::new().render(&view(&RowFilter::default())).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn text_summary_lines() {
    let text = TextRenderer::summary_only()
        .render(&view(&RowFilter::default()))
        .unwrap();
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(lines[0], "Fichas de Atendimento - Demandas Gerais");
    assert_eq!(lines[1], "4 de 5 fichas");
    assert_eq!(
        &lines[3..],
        &[
            "Situação da Demanda",
            "  Solucionado        1   25.0%",
            "  Em Andamento       1   25.0%",
            "  Prejudicado        1   25.0%",
            "  Outros             1   25.0%",
            "  Total              4",
        ]
    );
}

#[test]
fn csv_export_keeps_raw_values() {
    let csv = CsvRenderer.render(&view(&RowFilter::default())).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Nome,Bairro,Situação da Demanda"));
    assert_eq!(lines.next(), Some("Ana Paula Souza,Centro,Solucionado"));
    assert_eq!(lines.next(), Some("Bruno <b>Lima</b>,Vila & Jardim,Em andamento"));
}
