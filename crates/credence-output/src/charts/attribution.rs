//! Feature attribution bar chart.

use super::{ChartError, Result};
use credence_model::FeatureContribution;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Contributions shown by default.
pub const DEFAULT_TOP_FEATURES: usize = 12;

/// Largest contributions of one prediction, pushing towards default (red)
/// or repayment (blue).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionChart {
    /// Contributions, largest magnitude first
    pub contributions: Vec<FeatureContribution>,
    /// Expected margin
    pub baseline: f64,
    /// Client's margin
    pub margin: f64,
    /// Number of bars
    pub top: usize,
}

impl AttributionChart {
    /// Create a chart showing the [`DEFAULT_TOP_FEATURES`] largest contributions.
    pub fn new(contributions: Vec<FeatureContribution>, baseline: f64, margin: f64) -> Self {
        Self {
            contributions,
            baseline,
            margin,
            top: DEFAULT_TOP_FEATURES,
        }
    }

    /// Change the number of bars.
    pub const fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Draw onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let shown: Vec<&FeatureContribution> =
            self.contributions.iter().take(self.top.max(1)).collect();
        if shown.is_empty() {
            return Err(ChartError::InvalidInput("no contributions".to_string()));
        }
        let n = shown.len() as i32;
        let extent = shown
            .iter()
            .map(|c| c.contribution.abs())
            .fold(0.0, f64::max)
            .max(1e-6)
            * 1.1;

        let caption = format!(
            "Baseline {:.3}, client margin {:.3}",
            self.baseline, self.margin
        );
        let mut chart = ChartBuilder::on(area)
            .caption(caption, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(220)
            .build_cartesian_2d(-extent..extent, (0..n).into_segmented())?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Contribution to margin")
            .y_labels(shown.len())
            .y_label_formatter(&|v| match v {
                // Largest contribution at the top.
                SegmentValue::CenterOf(i) => shown
                    .get((n - 1 - *i) as usize)
                    .map(|c| c.feature.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(shown.iter().enumerate().map(|(rank, c)| {
            let row = n - 1 - rank as i32;
            let color = if c.contribution >= 0.0 { RED } else { BLUE };
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (c.contribution, SegmentValue::Exact(row + 1)),
                ],
                color.mix(0.8).filled(),
            );
            bar.set_margin(2, 2, 0, 0);
            bar
        }))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, SegmentValue::Exact(0)), (0.0, SegmentValue::Last)],
            BLACK,
        )))?;
        Ok(())
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> Result<String> {
        let height = 120 + 28 * self.top.clamp(1, self.contributions.len().max(1)) as u32;
        super::render_svg((760, height), |root| self.draw(root))
    }
}
