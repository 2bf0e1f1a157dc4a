//! SVG charts.
//!
//! Every chart draws onto any plotters [`DrawingArea`], so charts can be
//! rendered alone or tiled into a panel. The `*_svg` helpers render onto an
//! in-memory SVG document.

mod attribution;
mod count;
mod density;
mod gauge;

pub use attribution::{AttributionChart, DEFAULT_TOP_FEATURES};
pub use count::{CountChart, count_categories};
pub use density::{DensityChart, DensityCurve, gaussian_kde};
pub use gauge::GaugeChart;

use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

/// Result type for chart rendering.
pub type Result<T> = std::result::Result<T, ChartError>;

/// Errors raised while drawing.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Backend or layout failure
    #[error("Drawing error: {0}")]
    Drawing(String),

    /// Chart input cannot be drawn
    #[error("Invalid chart input: {0}")]
    InvalidInput(String),

    /// Source column cannot be read
    #[error("Table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Self::Drawing(e.to_string())
    }
}

/// Size of a standalone chart, in pixels.
pub const CHART_SIZE: (u32, u32) = (640, 400);

/// Size of the six-chart comparison panel, in pixels.
pub const PANEL_SIZE: (u32, u32) = (1500, 860);

/// Color of the selected-client marker.
pub const MARKER_COLOR: RGBColor = RED;

/// Share of the axis the marker line spans.
pub const MARKER_EXTENT: f64 = 0.95;

/// One chart of the comparison panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonChart {
    /// Continuous column
    Density(DensityChart),
    /// Categorical or small-integer column
    Count(CountChart),
}

impl ComparisonChart {
    /// Draw onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        match self {
            Self::Density(chart) => chart.draw(area),
            Self::Count(chart) => chart.draw(area),
        }
    }

    /// Chart title.
    pub fn title(&self) -> &str {
        match self {
            Self::Density(chart) => &chart.title,
            Self::Count(chart) => &chart.title,
        }
    }
}

/// Render a drawing closure to an SVG document.
pub fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String>
where
    F: for<'a> FnOnce(&DrawingArea<SVGBackend<'a>, Shift>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

/// Tile charts into a grid, three per row.
pub fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    charts: &[ComparisonChart],
) -> Result<()> {
    let rows = charts.len().div_ceil(3).max(1);
    let cells = area.split_evenly((rows, 3));
    for (chart, cell) in charts.iter().zip(cells.iter()) {
        chart.draw(cell)?;
    }
    Ok(())
}

/// Render the comparison panel as SVG.
pub fn panel_svg(charts: &[ComparisonChart]) -> Result<String> {
    render_svg(PANEL_SIZE, |root| draw_panel(root, charts))
}
