//! Line-oriented interactive session
//!
//! Each line is one interaction: the filter state is updated or the current
//! tab is reloaded, filtered and rendered. The session is checked for expiry
//! before every line.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::NaiveDateTime;
use fichas_core::filter::RowFilter;
use fichas_core::status::StatusCategory;
use fichas_core::{DashboardView, Field, Renderer, Tab};
use fichas_render::{describe_filter, TextRenderer};
use fichas_source::{DatasetLoader, SheetSource};
use tracing::debug;

use crate::auth::Session;
use crate::exit::ExitCode;

const HELP: &str = "\
Comandos:
  tab <nome>          muda de aba (gerais, oftalmologicas, saude, juridicas)
  field <campo>       campo pesquisado (ex.: name, neighborhood, street)
  query <texto>       pesquisa no campo; sem texto limpa a pesquisa
  toggle <situação>   marca/desmarca solucionado, andamento, prejudicado ou outros
  clear               remove pesquisa e situações
  show                mostra as fichas e o resumo
  summary             mostra apenas o resumo
  help                esta ajuda
  quit                sair";

/// Current selections of a browse session
#[derive(Clone, Debug)]
pub struct BrowseState {
    pub tab: Tab,
    pub field: Field,
    pub filter: RowFilter,
}

impl BrowseState {
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            field: Field::Name,
            filter: RowFilter::default(),
        }
    }

    fn set_field(&mut self, field: Field) {
        self.field = field;
        if let Some(query) = &mut self.filter.query {
            query.field = field;
        }
    }

    fn set_query(&mut self, text: &str) {
        self.filter.query = if text.is_empty() {
            None
        } else {
            Some(fichas_core::filter::TextQuery::new(self.field, text))
        };
    }

    fn clear(&mut self) {
        self.filter = RowFilter::default();
    }
}

/// Run a browse session until `quit` or end of input
pub fn run<S, R, W, C>(
    loader: &DatasetLoader<S>,
    session: &Session,
    tab: Tab,
    input: R,
    out: &mut W,
    clock: C,
) -> Result<ExitCode>
where
    S: SheetSource,
    R: BufRead,
    W: Write,
    C: Fn() -> NaiveDateTime,
{
    let mut state = BrowseState::new(tab);
    writeln!(
        out,
        "Bem-vindo(a), {}! Aba: {}. Digite help para ver os comandos.",
        session.context.display_name,
        state.tab.label()
    )?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(viewer) = session.active_context(clock()) else {
            writeln!(out, "Sessão expirada. Faça login novamente.")?;
            return Ok(ExitCode::Unauthenticated);
        };

        let (command, arg) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));
        debug!(command, arg, "browse command");

        match command {
            "quit" | "exit" | "sair" => break,
            "help" | "ajuda" => writeln!(out, "{HELP}")?,
            "tab" | "aba" => match arg.parse::<Tab>() {
                Ok(tab) => {
                    state.tab = tab;
                    writeln!(out, "Aba: {}", tab.label())?;
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            "field" | "campo" => match arg.parse::<Field>() {
                Ok(field) => {
                    state.set_field(field);
                    writeln!(out, "Campo de pesquisa: {}", field.label())?;
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            "query" | "pesquisa" => {
                state.set_query(arg);
                write_filters(out, &state.filter)?;
            }
            "toggle" | "situacao" => match arg.parse::<StatusCategory>() {
                Ok(category) => {
                    let selected = state.filter.toggle(category);
                    let mark = if selected { "marcada" } else { "desmarcada" };
                    writeln!(out, "Situação {category} {mark}")?;
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            "clear" | "limpar" => {
                state.clear();
                write_filters(out, &state.filter)?;
            }
            "show" | "summary" | "mostrar" | "resumo" => {
                let dataset = match loader.load(state.tab) {
                    Ok(dataset) => dataset,
                    Err(e) => {
                        writeln!(out, "Erro: {e}")?;
                        continue;
                    }
                };
                let view = DashboardView::build(viewer, &dataset, &state.filter)
                    .generated_at(clock());
                let renderer = if matches!(command, "summary" | "resumo") {
                    TextRenderer::summary_only()
                } else {
                    TextRenderer::new()
                };
                write!(out, "{}", renderer.render(&view)?)?;
            }
            other => writeln!(out, "Comando desconhecido: {other} (digite help)")?,
        }
    }

    Ok(ExitCode::Success)
}

fn write_filters<W: Write>(out: &mut W, filter: &RowFilter) -> std::io::Result<()> {
    let parts = describe_filter(filter);
    if parts.is_empty() {
        writeln!(out, "Sem filtros aplicados")
    } else {
        writeln!(out, "Filtros: {}", parts.join(" | "))
    }
}
