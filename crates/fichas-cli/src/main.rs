//! fichas CLI - Service Record Dashboard
//!
//! Command-line interface for loading, filtering, summarizing and exporting
//! the service record spreadsheet.

mod auth;
mod browse;
mod exit;
mod settings;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fichas_core::filter::RowFilter;
use fichas_core::status::{StatusCategory, StatusSummary};
use fichas_core::{AuthContext, DashboardView, Field, Renderer, Tab};
use fichas_render::{CsvRenderer, ExcelRenderer, HtmlDashboardRenderer, SvgPieRenderer, TextRenderer};
use fichas_source::{CsvDirectory, CsvFile, DatasetLoader, SheetExport, SheetSource};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::auth::{Authenticator, LoginOutcome, Session};
use crate::exit::ExitCode;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "fichas")]
#[command(author, version, about = "Service record dashboard", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", env = "FICHAS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Username
    #[arg(short, long, env = "FICHAS_USER", global = true)]
    user: Option<String>,

    /// Password
    #[arg(long, env = "FICHAS_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Read `<DIR>/<tab>.csv` instead of fetching the spreadsheet
    #[arg(long, value_name = "DIR", global = true, conflicts_with = "csv_file")]
    csv_dir: Option<PathBuf>,

    /// Read one CSV file for every tab
    #[arg(long, value_name = "FILE", global = true)]
    csv_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the spreadsheet tabs and where their data comes from
    Tabs,

    /// Show the filtered records of a tab
    Show {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Text)]
        format: ShowFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the status summary of a tab
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,
    },

    /// Export the dashboard of a tab to a file
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Html)]
        format: ExportFormat,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Interactive session reading commands from stdin
    Browse {
        /// Initial tab
        #[arg(short, long, default_value = "gerais")]
        tab: Tab,
    },
}

#[derive(Args, Clone, Debug)]
struct FilterArgs {
    /// Tab: gerais, oftalmologicas, saude or juridicas
    #[arg(short, long, default_value = "gerais")]
    tab: Tab,

    /// Field searched by --query
    #[arg(long, default_value = "name")]
    field: Field,

    /// Case-insensitive substring searched in --field
    #[arg(short, long)]
    query: Option<String>,

    /// Only "Solucionado"
    #[arg(long)]
    resolved: bool,

    /// Only "Em Andamento"
    #[arg(long)]
    in_progress: bool,

    /// Only "Prejudicado"
    #[arg(long)]
    harmed: bool,

    /// Only statuses outside the three known categories
    #[arg(long)]
    unclassified: bool,
}

impl FilterArgs {
    fn row_filter(&self) -> RowFilter {
        let mut filter = RowFilter::new();
        if let Some(query) = &self.query {
            filter = filter.query(self.field, query.as_str());
        }
        let selected = [
            (self.resolved, StatusCategory::Resolved),
            (self.in_progress, StatusCategory::InProgress),
            (self.harmed, StatusCategory::Harmed),
            (self.unclassified, StatusCategory::Unclassified),
        ];
        filter.categories(selected.into_iter().filter(|(on, _)| *on).map(|(_, c)| c))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Text,
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Html,
    Svg,
    Xlsx,
}

/// JSON shape of the `summary` command
#[derive(Serialize)]
struct SummaryReport<'a> {
    tab: Tab,
    tab_label: &'static str,
    viewer: &'a str,
    shown_records: usize,
    total_records: usize,
    counts: StatusSummary,
    percentages: Vec<CategoryShare>,
}

#[derive(Serialize)]
struct CategoryShare {
    category: StatusCategory,
    label: &'static str,
    count: usize,
    percentage: f64,
}

impl<'a> SummaryReport<'a> {
    fn from_view(view: &'a DashboardView) -> Self {
        let percentages = view
            .summary
            .iter()
            .map(|(category, count)| CategoryShare {
                category,
                label: category.label(fichas_core::status::LabelContext::Chart),
                count,
                percentage: view.summary.percentage(category),
            })
            .collect();
        Self {
            tab: view.tab,
            tab_label: view.tab.label(),
            viewer: &view.viewer.display_name,
            shown_records: view.records.len(),
            total_records: view.total_records,
            counts: view.summary,
            percentages,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::Failure.into()
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?;
    let loader = build_loader(&cli, &settings);

    // Listing tabs exposes no records and needs no login
    if matches!(cli.command, Commands::Tabs) {
        return cmd_tabs(loader.source());
    }

    let session = match Authenticator::from_settings(&settings).login(
        cli.user.as_deref(),
        cli.password.as_deref(),
        now(),
    ) {
        LoginOutcome::Authenticated(session) => session,
        outcome => {
            eprintln!("{}", outcome.message());
            return Ok(ExitCode::Unauthenticated);
        }
    };
    info!(user = %session.context.username, "logged in");

    match cli.command {
        Commands::Tabs => cmd_tabs(loader.source()),
        Commands::Show {
            filter,
            format,
            output,
        } => cmd_show(&loader, &session.context, &filter, format, output.as_deref()),
        Commands::Summary { filter, format } => {
            cmd_summary(&loader, &session.context, &filter, format)
        }
        Commands::Export {
            filter,
            format,
            output,
        } => cmd_export(&loader, &session.context, &settings, &filter, format, &output),
        Commands::Browse { tab } => cmd_browse(&loader, &session, tab),
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Pick the data source: command-line flags first, then the config file,
/// then the remote spreadsheet export
fn build_loader(cli: &Cli, settings: &Settings) -> DatasetLoader<Box<dyn SheetSource>> {
    let source: Box<dyn SheetSource> = if let Some(file) = &cli.csv_file {
        Box::new(CsvFile::new(file))
    } else if let Some(dir) = &cli.csv_dir {
        Box::new(CsvDirectory::new(dir))
    } else if let Some(file) = &settings.source.csv_file {
        Box::new(CsvFile::new(file))
    } else if let Some(dir) = &settings.source.csv_dir {
        Box::new(CsvDirectory::new(dir))
    } else {
        Box::new(
            SheetExport::new()
                .spreadsheet_id(settings.source.spreadsheet_id.as_str())
                .url_template(settings.source.url_template.as_str()),
        )
    };

    let loader = DatasetLoader::new(source);
    if settings.source.cache {
        loader.cached()
    } else {
        loader
    }
}

fn build_view(
    loader: &DatasetLoader<Box<dyn SheetSource>>,
    viewer: &AuthContext,
    args: &FilterArgs,
) -> Result<DashboardView> {
    let dataset = loader.load(args.tab)?;
    Ok(DashboardView::build(viewer, &dataset, &args.row_filter()).generated_at(now()))
}

/// Write to a file, or to stdout when no path is given
fn emit(output: Option<&Path>, content: &[u8]) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn cmd_tabs(source: &dyn SheetSource) -> Result<ExitCode> {
    for tab in Tab::ALL {
        println!(
            "{:<15} {:<11} {:<24} {}",
            tab.slug(),
            tab.gid(),
            tab.label(),
            source.source_id(tab)
        );
    }
    Ok(ExitCode::Success)
}

fn cmd_show(
    loader: &DatasetLoader<Box<dyn SheetSource>>,
    viewer: &AuthContext,
    args: &FilterArgs,
    format: ShowFormat,
    output: Option<&Path>,
) -> Result<ExitCode> {
    let view = build_view(loader, viewer, args)?;
    let content = match format {
        ShowFormat::Text => TextRenderer::new().render(&view)?,
        ShowFormat::Csv => CsvRenderer.render(&view)?,
        ShowFormat::Json => {
            let mut json = serde_json::to_string_pretty(&view)?;
            json.push('\n');
            json
        }
    };
    emit(output, content.as_bytes())?;
    Ok(ExitCode::Success)
}

fn cmd_summary(
    loader: &DatasetLoader<Box<dyn SheetSource>>,
    viewer: &AuthContext,
    args: &FilterArgs,
    format: SummaryFormat,
) -> Result<ExitCode> {
    let view = build_view(loader, viewer, args)?;
    let content = match format {
        SummaryFormat::Text => TextRenderer::summary_only().render(&view)?,
        SummaryFormat::Json => {
            let mut json = serde_json::to_string_pretty(&SummaryReport::from_view(&view))?;
            json.push('\n');
            json
        }
    };
    emit(None, content.as_bytes())?;
    Ok(ExitCode::Success)
}

fn cmd_export(
    loader: &DatasetLoader<Box<dyn SheetSource>>,
    viewer: &AuthContext,
    settings: &Settings,
    args: &FilterArgs,
    format: ExportFormat,
    output: &Path,
) -> Result<ExitCode> {
    let view = build_view(loader, viewer, args)?;
    let theme = settings.theme.clone();

    let bytes = match format {
        ExportFormat::Html => {
            let mut renderer = HtmlDashboardRenderer::new()
                .title(settings.display.title.as_str())
                .theme(theme);
            if let Some(footer) = &settings.display.footer {
                renderer = renderer.footer(footer.as_str());
            }
            if let Some(logo) = &settings.display.logo_url {
                renderer = renderer.logo_url(logo.as_str());
            }
            renderer.render(&view)?.into_bytes()
        }
        ExportFormat::Svg => SvgPieRenderer::new().theme(theme).render(&view)?.into_bytes(),
        ExportFormat::Xlsx => ExcelRenderer::new().theme(theme).render(&view)?,
    };

    emit(Some(output), &bytes)?;
    info!(path = %output.display(), bytes = bytes.len(), "export written");
    eprintln!(
        "Exported {} de {} fichas ({}) to {}",
        view.records.len(),
        view.total_records,
        view.tab.label(),
        output.display()
    );
    Ok(ExitCode::Success)
}

fn cmd_browse(
    loader: &DatasetLoader<Box<dyn SheetSource>>,
    session: &Session,
    tab: Tab,
) -> Result<ExitCode> {
    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    browse::run(loader, session, tab, stdin, &mut stdout, now)
}
