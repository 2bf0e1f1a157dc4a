//! Default-probability gauge.
//!
//! A horizontal 0..1 scale split at the decision threshold into a green
//! (approve) and a red (reject) band, with a bar for the client's probability
//! and a black line at the threshold. The signed distance from the threshold
//! is printed above the bar, red when above it and green when below.

use super::Result;
use credence_model::{DECISION_THRESHOLD, Decision, Score};
use plotters::coord::Shift;
use plotters::prelude::*;

const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);
const APPROVED: RGBColor = RGBColor(0, 128, 0);
const REJECTED: RGBColor = RGBColor(200, 0, 0);
const DELTA_UP: RGBColor = RGBColor(255, 0, 0);
const DELTA_DOWN: RGBColor = RGBColor(34, 139, 34);

/// Gauge of one client's default probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeChart {
    /// Score to show
    pub score: Score,
}

impl GaugeChart {
    /// Create a gauge.
    pub const fn new(score: Score) -> Self {
        Self { score }
    }

    /// Bar color for the decision.
    pub const fn color(&self) -> RGBColor {
        match self.score.decision {
            Decision::Approved => APPROVED,
            Decision::Rejected => REJECTED,
        }
    }

    /// Probability minus the decision threshold.
    pub const fn delta(&self) -> f64 {
        self.score.probability - DECISION_THRESHOLD
    }

    /// Delta as shown on the gauge, e.g. `+0.230 vs 0.5`.
    pub fn delta_label(&self) -> String {
        format!("{:+.3} vs {}", self.delta(), DECISION_THRESHOLD)
    }

    /// Red for a probability above the threshold, green below.
    pub const fn delta_color(&self) -> RGBColor {
        let delta = self.delta();
        if delta > 0.0 {
            DELTA_UP
        } else if delta < 0.0 {
            DELTA_DOWN
        } else {
            BLACK
        }
    }

    /// Draw onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let probability = self.score.probability.clamp(0.0, 1.0);
        let caption = format!(
            "Default probability {:.1}% ({})",
            self.score.percent(),
            self.score.decision
        );

        let mut chart = ChartBuilder::on(area)
            .caption(caption, ("sans-serif", 22))
            .margin(20)
            .x_label_area_size(30)
            .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_y_axis()
            .x_labels(11)
            .x_label_formatter(&|x| format!("{x:.1}"))
            .draw()?;

        chart.draw_series([
            Rectangle::new([(0.0, 0.2), (DECISION_THRESHOLD, 0.8)], LIGHT_GREEN.filled()),
            Rectangle::new([(DECISION_THRESHOLD, 0.2), (1.0, 0.8)], LIGHT_CORAL.filled()),
            Rectangle::new([(0.0, 0.35), (probability, 0.65)], self.color().filled()),
        ])?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(DECISION_THRESHOLD, 0.1), (DECISION_THRESHOLD, 0.9)],
            BLACK.stroke_width(4),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            self.delta_label(),
            (0.01, 0.97),
            ("sans-serif", 18).into_font().color(&self.delta_color()),
        )))?;
        Ok(())
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> Result<String> {
        super::render_svg((640, 220), |root| self.draw(root))
    }
}
