//! Rendering the six comparison charts end to end.

use credence_output::charts::{ComparisonChart, CountChart, DensityChart, panel_svg};
use credence_output::{AttributionChart, GaugeChart};
use credence_model::{FeatureContribution, Score};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_comparison_panel() {
    let charts = vec![
        ComparisonChart::Density(DensityChart::new(
            "Age (years)",
            vec![22.0, 35.0, 41.0, 29.0, 58.0, 47.0],
            Some(35.0),
        )),
        ComparisonChart::Density(DensityChart::new(
            "Total income",
            vec![90000.0, 135000.0, 202500.0, 112500.0],
            Some(135000.0),
        )),
        ComparisonChart::Count(CountChart::new(
            "Children",
            strings(&["0", "2", "1", "0"]),
            true,
            Some("2".into()),
        )),
        ComparisonChart::Count(CountChart::new(
            "Income type",
            strings(&["Working", "Pensioner", "Working", "Commercial associate"]),
            false,
            Some("Working".into()),
        )),
        ComparisonChart::Count(CountChart::new(
            "Education",
            strings(&["Higher education", "Secondary / secondary special"]),
            false,
            Some("Higher education".into()),
        )),
        ComparisonChart::Count(CountChart::new(
            "Housing type",
            strings(&["House / apartment", "With parents", "House / apartment"]),
            false,
            Some("House / apartment".into()),
        )),
    ];

    let svg = panel_svg(&charts).unwrap();
    for chart in &charts {
        assert!(svg.contains(chart.title()), "missing {}", chart.title());
    }
    assert!(svg.contains("Commercial associate"));
}

#[test]
fn test_score_charts() {
    let score = Score::from_probability(0.31);
    let gauge = GaugeChart::new(score).to_svg().unwrap();
    assert!(gauge.contains("Approved"));

    let attribution = AttributionChart::new(
        vec![FeatureContribution {
            feature: "EXT_SOURCE_3".into(),
            value: 0.55,
            contribution: -0.61,
        }],
        -2.3,
        -2.91,
    )
    .to_svg()
    .unwrap();
    assert!(attribution.contains("EXT_SOURCE_3"));
}
