//! Printing rendered views and writing their charts and exports.

use super::commands::{CompareArgs, ScoreArgs, TableArgs};
use crate::OutputFormat;
use credence::{ComparisonView, DashboardContext, ScoreView, TableView, View};
use credence_data::FilterColumn;
use credence_output::{ClientCard, ExportFormat, Exporter, ReportBuilder, ScoreSummary};
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Where and how results are written.
#[derive(Debug, Clone)]
pub(crate) struct OutputSettings {
    /// Directory for chart files
    pub(crate) dir: PathBuf,
    /// Console format
    pub(crate) format: OutputFormat,
}

impl OutputSettings {
    /// Write an SVG document into the output directory.
    pub(crate) fn write_svg(&self, name: &str, svg: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, svg)?;
        tracing::debug!(path = %path.display(), "chart written");
        Ok(path)
    }
}

fn banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

fn export_to(item: &impl Exporter, path: &Path) -> Result<(), Box<dyn Error>> {
    let format = ExportFormat::from_path(path)?;
    item.export_to_file(path, format)?;
    eprintln!("Exported to {}", path.display());
    Ok(())
}

fn print_report(
    ctx: &DashboardContext,
    view: View,
    client_id: Option<i64>,
    contents: serde_json::Value,
) -> Result<(), Box<dyn Error>> {
    let report = ReportBuilder::new()
        .view(view.command())
        .client_id(client_id)
        .revision(ctx.revision().map(str::to_string))
        .contents(contents)
        .build()?;
    println!("{}", report.to_json()?);
    Ok(())
}

/// Present the client table.
pub(crate) fn table(
    ctx: &DashboardContext,
    view: &TableView,
    args: &TableArgs,
    settings: &OutputSettings,
) -> Result<(), Box<dyn Error>> {
    let filters = args.filters();
    let listing = view.listing()?;

    match settings.format {
        OutputFormat::Text => {
            banner(View::ClientTable.label());
            for column in FilterColumn::ALL {
                println!("  {:<16} {}", format!("{}:", column.label()), filters.get(column));
            }
            println!("\nMatching clients: {}\n", view.count);
            println!("{}", view.frame.head(Some(args.limit)));
        }
        OutputFormat::Json => {
            let choices: serde_json::Map<String, serde_json::Value> = view
                .choices
                .iter()
                .map(|(column, choices)| (column.label().to_string(), json!(choices)))
                .collect();
            print_report(
                ctx,
                View::ClientTable,
                None,
                json!({
                    "filters": filters,
                    "count": view.count,
                    "choices": choices,
                    "listing": listing,
                }),
            )?;
        }
    }

    if let Some(path) = &args.export {
        export_to(&listing, path)?;
    }
    Ok(())
}

/// Present a client's score.
pub(crate) fn score(
    ctx: &DashboardContext,
    view: &ScoreView,
    args: &ScoreArgs,
    settings: &OutputSettings,
) -> Result<(), Box<dyn Error>> {
    let id = view.client.id;
    let gauge = settings.write_svg(&format!("score-{id}-gauge.svg"), &view.gauge_svg)?;
    let attribution =
        settings.write_svg(&format!("score-{id}-attribution.svg"), &view.attribution_svg)?;
    let export = view.export();

    match settings.format {
        OutputFormat::Text => {
            banner(&format!("{}: {}", View::ScoreVisualization.label(), id));
            print!("{}", ClientCard::new(view.client.clone()));
            let summary = ScoreSummary {
                client_id: id,
                score: view.score,
                baseline: view.baseline,
                margin: view.margin,
                contributions: view.contributions.clone(),
            };
            println!("{}", summary.to_ascii_table(args.top));
            println!("Gauge:        {}", gauge.display());
            println!("Attribution:  {}", attribution.display());
        }
        OutputFormat::Json => {
            print_report(
                ctx,
                View::ScoreVisualization,
                Some(id),
                json!({
                    "client": view.client,
                    "score": export,
                    "charts": {
                        "gauge": gauge,
                        "attribution": attribution,
                    },
                }),
            )?;
        }
    }

    if let Some(path) = &args.export {
        export_to(&export, path)?;
    }
    Ok(())
}

/// Present a client against its cohort.
pub(crate) fn comparison(
    ctx: &DashboardContext,
    view: &ComparisonView,
    args: &CompareArgs,
    settings: &OutputSettings,
) -> Result<(), Box<dyn Error>> {
    let id = view.client.id;
    let panel = settings.write_svg(&format!("compare-{id}.svg"), &view.panel_svg)?;
    let listing = view.listing()?;

    match settings.format {
        OutputFormat::Text => {
            banner(&format!("{}: {}", View::ClientComparison.label(), id));
            print!("{}", ClientCard::new(view.client.clone()));
            println!(
                "\nCohort: {} ({} rows)\n",
                view.cohort.scope,
                view.cohort.len()
            );
            println!("{}", view.frame.head(Some(args.limit)));
            println!("\nCharts:  {}", panel.display());
        }
        OutputFormat::Json => {
            let ids: Vec<i64> = view
                .cohort
                .indices
                .iter()
                .map(|&row| ctx.clients().ids()[row])
                .collect();
            let titles: Vec<&str> = view.charts.iter().map(|chart| chart.title()).collect();
            print_report(
                ctx,
                View::ClientComparison,
                Some(id),
                json!({
                    "scope": view.cohort.scope,
                    "rows": view.cohort.indices,
                    "client_ids": ids,
                    "charts": titles,
                    "panel": panel,
                    "listing": listing,
                }),
            )?;
        }
    }

    if let Some(path) = &args.export {
        export_to(&listing, path)?;
    }
    Ok(())
}

/// Present the selectable client identifiers.
pub(crate) fn clients(
    ctx: &DashboardContext,
    limit: usize,
    settings: &OutputSettings,
) -> Result<(), Box<dyn Error>> {
    let ids = ctx.clients().ids();
    match settings.format {
        OutputFormat::Text => {
            println!("Clients: {}", ids.len());
            for id in ids.iter().take(limit) {
                println!("  {}", id);
            }
            if ids.len() > limit {
                println!("  ... {} more", ids.len() - limit);
            }
        }
        OutputFormat::Json => {
            let report = ReportBuilder::new()
                .view("clients")
                .revision(ctx.revision().map(str::to_string))
                .contents(json!({ "count": ids.len(), "ids": ids }))
                .build()?;
            println!("{}", report.to_json()?);
        }
    }
    Ok(())
}
