//! Gaussian kernel density chart.

use super::{ChartError, MARKER_COLOR, MARKER_EXTENT, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType};

/// Evaluation points of a density curve.
const GRID_POINTS: usize = 200;

/// The curve extends this many bandwidths past the data.
const CUT: f64 = 3.0;

/// A sampled density estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    /// Grid locations
    pub xs: Vec<f64>,
    /// Density at each location
    pub ys: Vec<f64>,
    /// Kernel bandwidth (Scott's rule)
    pub bandwidth: f64,
}

/// Gaussian KDE of the finite values in `values`.
///
/// Uses Scott's bandwidth `sd * n^(-1/5)`. Returns `None` when fewer than
/// two finite values remain or they are all equal.
pub fn gaussian_kde(values: &[f64]) -> Option<DensityCurve> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = data.len();
    if n < 2 {
        return None;
    }
    let mean = data.iter().sum::<f64>() / n as f64;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
    if bandwidth.is_nan() || bandwidth <= 0.0 {
        return None;
    }

    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let start = lo - CUT * bandwidth;
    let step = (hi - lo + 2.0 * CUT * bandwidth) / (GRID_POINTS - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let xs: Vec<f64> = (0..GRID_POINTS).map(|i| start + step * i as f64).collect();
    let ys = xs
        .iter()
        .map(|x| {
            data.iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect();

    Some(DensityCurve { xs, ys, bandwidth })
}

/// Density of a continuous column with the selected client's value marked.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityChart {
    /// Title
    pub title: String,
    /// Cohort values
    pub values: Vec<f64>,
    /// Selected client's value
    pub marker: Option<f64>,
}

impl DensityChart {
    /// Create a chart.
    pub fn new(title: impl Into<String>, values: Vec<f64>, marker: Option<f64>) -> Self {
        Self {
            title: title.into(),
            values,
            marker,
        }
    }

    /// Chart of `column` with the value at row `selected` marked.
    pub fn from_column(
        title: impl Into<String>,
        frame: &DataFrame,
        column: &str,
        selected: usize,
    ) -> Result<Self> {
        let values: Vec<f64> = frame
            .column(column)?
            .cast(&DataType::Float64)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let marker = values.get(selected).copied().filter(|v| v.is_finite());
        Ok(Self::new(title, values, marker))
    }

    /// Draw onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let curve = gaussian_kde(&self.values);
        if curve.is_none() {
            tracing::warn!(chart = %self.title, "density undefined, drawing marker only");
        }

        let marker = self.marker.filter(|m| m.is_finite());
        let (mut x_lo, mut x_hi) = match &curve {
            Some(c) => (c.xs[0], c.xs[c.xs.len() - 1]),
            None => self
                .values
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                }),
        };
        if let Some(m) = marker {
            x_lo = x_lo.min(m);
            x_hi = x_hi.max(m);
        }
        if !x_lo.is_finite() || !x_hi.is_finite() {
            return Err(ChartError::InvalidInput(format!(
                "no finite values for {}",
                self.title
            )));
        }
        if x_hi - x_lo < f64::EPSILON {
            x_lo -= 1.0;
            x_hi += 1.0;
        }

        let y_max = curve
            .as_ref()
            .map(|c| c.ys.iter().copied().fold(0.0, f64::max))
            .filter(|y| *y > 0.0)
            .unwrap_or(1.0);
        let y_top = y_max * 1.05;

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0f64..y_top)?;
        chart
            .configure_mesh()
            .y_desc("Density")
            .y_label_formatter(&|y| format!("{y:.1e}"))
            .draw()?;

        if let Some(curve) = &curve {
            chart.draw_series(AreaSeries::new(
                curve.xs.iter().copied().zip(curve.ys.iter().copied()),
                0.0,
                BLUE.mix(0.15),
            ))?;
            chart.draw_series(LineSeries::new(
                curve.xs.iter().copied().zip(curve.ys.iter().copied()),
                &BLUE,
            ))?;
        }

        if let Some(m) = marker {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(m, 0.0), (m, y_top * MARKER_EXTENT)],
                MARKER_COLOR.stroke_width(2),
            )))?;
        }
        Ok(())
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> Result<String> {
        super::render_svg(super::CHART_SIZE, |root| self.draw(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [21.0, 25.0, 25.0, 33.0, 40.0, 47.0, 58.0, 61.0];
        let curve = gaussian_kde(&values).unwrap();
        assert_eq!(curve.xs.len(), GRID_POINTS);
        let step = curve.xs[1] - curve.xs[0];
        let area: f64 = curve.ys.iter().sum::<f64>() * step;
        assert_relative_eq!(area, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_kde_bandwidth_scott() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let curve = gaussian_kde(&values).unwrap();
        let sd = (5.0f64 / 3.0).sqrt();
        assert_relative_eq!(curve.bandwidth, sd * 4f64.powf(-0.2), epsilon = 1e-12);
    }

    #[test]
    fn test_kde_degenerate() {
        assert!(gaussian_kde(&[5.0, 5.0, 5.0]).is_none());
        assert!(gaussian_kde(&[5.0]).is_none());
        assert!(gaussian_kde(&[f64::NAN, 1.0]).is_none());
    }

    #[test]
    fn test_svg_has_marker_line() {
        let chart = DensityChart::new("Income", vec![1.0e5, 1.5e5, 2.2e5, 9.0e4], Some(1.5e5));
        let svg = chart.to_svg().unwrap();
        assert!(svg.contains("Income"));
        assert!(svg.contains("#FF0000"));
    }

    #[test]
    fn test_constant_column_still_renders() {
        let chart = DensityChart::new("Age", vec![30.0, 30.0], Some(30.0));
        assert!(chart.to_svg().is_ok());
    }

    #[test]
    fn test_from_column() {
        let frame = polars::prelude::df!["AMT" => [Some(1.0f64), None, Some(3.0)]].unwrap();
        let chart = DensityChart::from_column("Amount", &frame, "AMT", 2).unwrap();
        assert_eq!(chart.marker, Some(3.0));
        assert!(chart.values[1].is_nan());
        assert!(DensityChart::from_column("Amount", &frame, "MISSING", 0).is_err());
    }

    #[test]
    fn test_empty_column_is_rejected() {
        let chart = DensityChart::new("Age", vec![], None);
        assert!(matches!(chart.to_svg(), Err(ChartError::InvalidInput(_))));
    }
}
