//! Views and the `render` entry point.
//!
//! A view is rendered from the immutable [`DashboardContext`] and the
//! operator's [`SelectionState`] only; nothing is cached between calls.

use crate::context::DashboardContext;
use crate::error::{DashboardError, Result};
use credence_cohort::{Cohort, CohortScope, NeighborCount};
use credence_data::clients::columns;
use credence_data::filter::filter_choices;
use credence_data::{ClientRecord, FilterColumn, TableFilters};
use credence_model::{FeatureContribution, Score, score};
use credence_output::charts::{self, ComparisonChart, CountChart, DensityChart};
use credence_output::{AttributionChart, ClientListing, GaugeChart, ScoreExport};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    /// Filterable client listing
    ClientTable,
    /// Score, gauge and attribution of one client
    ScoreVisualization,
    /// One client against its cohort
    ClientComparison,
}

impl View {
    /// Every view, in navigation order.
    pub const ALL: [Self; 3] = [
        Self::ClientTable,
        Self::ScoreVisualization,
        Self::ClientComparison,
    ];

    /// Page title.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ClientTable => "Client Table",
            Self::ScoreVisualization => "Score Visualization",
            Self::ClientComparison => "Client Comparison",
        }
    }

    /// Short name used on the command line.
    pub const fn command(&self) -> &'static str {
        match self {
            Self::ClientTable => "table",
            Self::ScoreVisualization => "score",
            Self::ClientComparison => "compare",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.command() == s || v.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown view {s}"))
    }
}

/// Operator input of one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Selected client identifier
    pub client: Option<i64>,
    /// Client table filters
    pub filters: TableFilters,
    /// Neighbour cohort size
    pub neighbors: NeighborCount,
    /// Compare against every client instead of the neighbours
    pub full_population: bool,
}

impl SelectionState {
    /// Select a client.
    pub fn with_client(mut self, client_id: i64) -> Self {
        self.client = Some(client_id);
        self
    }

    /// Replace the filters.
    pub fn with_filters(mut self, filters: TableFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Set the neighbour cohort size.
    pub const fn with_neighbors(mut self, neighbors: NeighborCount) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Set the population toggle.
    pub const fn with_full_population(mut self, full_population: bool) -> Self {
        self.full_population = full_population;
        self
    }

    /// Cohort scope selected by the neighbour controls.
    pub const fn scope(&self) -> CohortScope {
        CohortScope::from_toggle(self.full_population, self.neighbors)
    }

    fn require_client(&self, view: View) -> Result<i64> {
        self.client
            .ok_or(DashboardError::NoClientSelected(view.label()))
    }
}

/// Output of the client table view.
#[derive(Debug, Clone)]
pub struct TableView {
    /// Matching rows, display columns only
    pub frame: DataFrame,
    /// Number of matching rows
    pub count: usize,
    /// Choices offered by each filter
    pub choices: Vec<(FilterColumn, Vec<String>)>,
}

impl TableView {
    /// Detached copy of the listing for export.
    pub fn listing(&self) -> Result<ClientListing> {
        Ok(ClientListing::from_frame(&self.frame)?)
    }
}

/// Output of the score view.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreView {
    /// Selected client
    pub client: ClientRecord,
    /// Probability and decision
    pub score: Score,
    /// Expected margin
    pub baseline: f64,
    /// Client's raw margin
    pub margin: f64,
    /// Contributions, largest magnitude first
    pub contributions: Vec<FeatureContribution>,
    /// Probability gauge
    pub gauge_svg: String,
    /// Attribution bar chart
    pub attribution_svg: String,
}

impl ScoreView {
    /// Export form of the score.
    pub fn export(&self) -> ScoreExport {
        ScoreExport::new(
            self.client.id,
            self.score,
            self.baseline,
            self.margin,
            self.contributions.clone(),
        )
    }
}

/// Output of the comparison view.
#[derive(Debug, Clone)]
pub struct ComparisonView {
    /// Selected client
    pub client: ClientRecord,
    /// Cohort rows
    pub cohort: Cohort,
    /// Cohort listing, display columns only, in row order
    pub frame: DataFrame,
    /// The six comparison charts
    pub charts: Vec<ComparisonChart>,
    /// The charts tiled two by three
    pub panel_svg: String,
}

impl ComparisonView {
    /// Detached copy of the cohort listing for export.
    pub fn listing(&self) -> Result<ClientListing> {
        Ok(ClientListing::from_frame(&self.frame)?)
    }
}

/// A rendered view.
#[derive(Debug, Clone)]
pub enum RenderedView {
    /// Client table
    Table(TableView),
    /// Score visualization
    Score(Box<ScoreView>),
    /// Client comparison
    Comparison(Box<ComparisonView>),
}

impl RenderedView {
    /// Which view this is.
    pub const fn view(&self) -> View {
        match self {
            Self::Table(_) => View::ClientTable,
            Self::Score(_) => View::ScoreVisualization,
            Self::Comparison(_) => View::ClientComparison,
        }
    }
}

/// How a comparison column is charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartKind {
    Density,
    Count,
}

/// Comparison charts: title, client column, chart kind.
const COMPARISON_CHARTS: [(&str, &str, ChartKind); 6] = [
    ("Age (years)", columns::YEARS_BIRTH, ChartKind::Density),
    ("Total income", columns::INCOME_TOTAL, ChartKind::Density),
    ("Children", columns::CHILDREN, ChartKind::Count),
    ("Income type", columns::INCOME_TYPE, ChartKind::Count),
    ("Education", columns::EDUCATION, ChartKind::Count),
    ("Housing type", columns::HOUSING, ChartKind::Count),
];

/// Render one view for a selection.
pub fn render(ctx: &DashboardContext, view: View, selection: &SelectionState) -> Result<RenderedView> {
    tracing::debug!(%view, client = ?selection.client, "rendering view");
    match view {
        View::ClientTable => render_table(ctx, &selection.filters).map(RenderedView::Table),
        View::ScoreVisualization => {
            let client_id = selection.require_client(view)?;
            render_score(ctx, client_id).map(|v| RenderedView::Score(Box::new(v)))
        }
        View::ClientComparison => {
            let client_id = selection.require_client(view)?;
            render_comparison(ctx, client_id, selection.scope())
                .map(|v| RenderedView::Comparison(Box::new(v)))
        }
    }
}

fn render_table(ctx: &DashboardContext, filters: &TableFilters) -> Result<TableView> {
    let listing = ctx.clients().display_frame()?;
    let choices = FilterColumn::ALL
        .iter()
        .map(|&column| -> Result<_> { Ok((column, filter_choices(&listing, column)?)) })
        .collect::<Result<Vec<_>>>()?;
    let filtered = filters.apply(&listing)?;
    Ok(TableView {
        frame: filtered.frame,
        count: filtered.count,
        choices,
    })
}

fn render_score(ctx: &DashboardContext, client_id: i64) -> Result<ScoreView> {
    let row = ctx.row_of(client_id)?;
    let client = ctx.clients().record(row)?;
    let score = score(ctx.model(), ctx.features(), row)?;
    let margin = ctx.model().margin(ctx.features().row(row)?);
    let contributions = ctx.attributions().contributions(ctx.features(), row)?;

    let gauge_svg = GaugeChart::new(score).to_svg()?;
    let attribution_svg =
        AttributionChart::new(contributions.clone(), ctx.baseline(), margin).to_svg()?;

    Ok(ScoreView {
        client,
        score,
        baseline: ctx.baseline(),
        margin,
        contributions,
        gauge_svg,
        attribution_svg,
    })
}

fn render_comparison(ctx: &DashboardContext, client_id: i64, scope: CohortScope) -> Result<ComparisonView> {
    let row = ctx.row_of(client_id)?;
    let client = ctx.clients().record(row)?;
    let cohort = ctx.neighbor_finder().cohort(row, scope)?;
    let frame = ctx.clients().display_rows(&cohort.indices)?;
    let selected = cohort.target_position().unwrap_or_default();

    let charts = COMPARISON_CHARTS
        .iter()
        .map(|&(title, column, kind)| -> Result<_> {
            Ok(match kind {
                ChartKind::Density => ComparisonChart::Density(DensityChart::from_column(
                    title, &frame, column, selected,
                )?),
                ChartKind::Count => ComparisonChart::Count(CountChart::from_column(
                    title, &frame, column, selected,
                )?),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let panel_svg = charts::panel_svg(&charts)?;

    tracing::debug!(client = client_id, cohort = cohort.len(), %scope, "comparison rendered");
    Ok(ComparisonView {
        client,
        cohort,
        frame,
        charts,
        panel_svg,
    })
}
