//! Horizontal category count chart.

use super::{ChartError, MARKER_COLOR, MARKER_EXTENT, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType};
use std::collections::HashMap;

/// Count occurrences of each category.
///
/// Text categories keep first-appearance order; numeric categories are
/// sorted by value. Empty strings are skipped.
pub fn count_categories(values: &[String], numeric: bool) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().map(String::as_str).filter(|v| !v.is_empty()) {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    if numeric {
        order.sort_by(|a, b| {
            let key = |s: &str| s.parse::<f64>().unwrap_or(f64::INFINITY);
            key(a).total_cmp(&key(b)).then_with(|| a.cmp(b))
        });
    }

    order
        .into_iter()
        .map(|category| (category.to_string(), counts[category]))
        .collect()
}

/// Category counts with the selected client's category marked.
#[derive(Debug, Clone, PartialEq)]
pub struct CountChart {
    /// Title
    pub title: String,
    /// Cohort values, rendered as text
    pub values: Vec<String>,
    /// Whether categories are numbers
    pub numeric: bool,
    /// Selected client's category
    pub marker: Option<String>,
}

impl CountChart {
    /// Create a chart.
    pub fn new(
        title: impl Into<String>,
        values: Vec<String>,
        numeric: bool,
        marker: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            values,
            numeric,
            marker,
        }
    }

    /// Chart of `column` with the category at row `selected` marked.
    ///
    /// Integer columns are treated as numeric categories.
    pub fn from_column(
        title: impl Into<String>,
        frame: &DataFrame,
        column: &str,
        selected: usize,
    ) -> Result<Self> {
        let source = frame.column(column)?;
        let numeric = source.dtype().is_integer();
        let values: Vec<String> = source
            .cast(&DataType::String)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        let marker = values.get(selected).filter(|v| !v.is_empty()).cloned();
        Ok(Self::new(title, values, numeric, marker))
    }

    /// Draw onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let counts = count_categories(&self.values, self.numeric);
        if counts.is_empty() {
            return Err(ChartError::InvalidInput(format!(
                "no categories for {}",
                self.title
            )));
        }
        let labels: Vec<&str> = counts.iter().map(|(c, _)| c.as_str()).collect();
        let n = counts.len() as i32;
        let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64;
        let x_top = max_count * 1.1;

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(140)
            .build_cartesian_2d(0f64..x_top, (0..n).into_segmented())?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Count")
            .y_labels(counts.len())
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels
                    .get(*i as usize)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (*count as f64, SegmentValue::Exact(i + 1)),
                ],
                BLUE.mix(0.6).filled(),
            );
            bar.set_margin(3, 3, 0, 0);
            bar
        }))?;

        if let Some(marker) = &self.marker {
            match labels.iter().position(|l| *l == marker.as_str()) {
                Some(i) => {
                    let y = SegmentValue::CenterOf(i as i32);
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(0.0, y.clone()), (x_top * MARKER_EXTENT, y)],
                        MARKER_COLOR.stroke_width(2),
                    )))?;
                }
                None => {
                    tracing::warn!(chart = %self.title, marker = %marker, "selected category not in cohort");
                }
            }
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
    use rstest::rstest;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(
        &["Working", "Pensioner", "Working", "State servant"],
        false,
        vec![("Working", 2), ("Pensioner", 1), ("State servant", 1)]
    )]
    #[case(&["2", "0", "10", "0", "1"], true, vec![("0", 2), ("1", 1), ("2", 1), ("10", 1)])]
    #[case(&["", "a", ""], false, vec![("a", 1)])]
    fn test_count_categories(
        #[case] values: &[&str],
        #[case] numeric: bool,
        #[case] expected: Vec<(&str, usize)>,
    ) {
        let counts = count_categories(&strings(values), numeric);
        let counts: Vec<(&str, usize)> = counts.iter().map(|(c, n)| (c.as_str(), *n)).collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_svg_labels_and_marker() {
        let chart = CountChart::new(
            "Housing type",
            strings(&["House / apartment", "With parents", "House / apartment"]),
            false,
            Some("With parents".into()),
        );
        let svg = chart.to_svg().unwrap();
        assert!(svg.contains("House / apartment"));
        assert!(svg.contains("With parents"));
        assert!(svg.contains("#FF0000"));
    }

    #[test]
    fn test_from_column() {
        let frame = polars::prelude::df![
            "CNT_CHILDREN" => [0i64, 2, 1],
            "NAME_HOUSING_TYPE" => ["House / apartment", "With parents", "House / apartment"],
        ]
        .unwrap();
        let children = CountChart::from_column("Children", &frame, "CNT_CHILDREN", 1).unwrap();
        assert!(children.numeric);
        assert_eq!(children.marker.as_deref(), Some("2"));
        let housing = CountChart::from_column("Housing", &frame, "NAME_HOUSING_TYPE", 0).unwrap();
        assert!(!housing.numeric);
        assert_eq!(housing.marker.as_deref(), Some("House / apartment"));
    }

    #[test]
    fn test_empty_is_rejected() {
        let chart = CountChart::new("Children", vec![], true, None);
        assert!(matches!(chart.to_svg(), Err(ChartError::InvalidInput(_))));
    }
}
