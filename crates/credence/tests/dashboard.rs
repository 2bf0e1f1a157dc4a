//! Loading a context from raw artifacts and rendering every view.

use approx::assert_relative_eq;
use credence::cohort::NeighborCount;
use credence::data::{DataError, FilterColumn, FilterValue, RawArtifacts, TableFilters};
use credence::model::Decision;
use credence::{DashboardContext, DashboardError, RenderedView, SelectionState, View, render};
use rstest::rstest;

const POPULATION: usize = 40;

const MODEL: &str = r#"{
    "max_feature_idx": 2,
    "objective": "binary sigmoid:1",
    "feature_names": ["EXT_SOURCE_2", "DAYS_EMPLOYED", "CODE_GENDER"],
    "tree_info": [
        {"tree_structure": {
            "split_feature": 0, "threshold": 0.5, "decision_type": "<=",
            "default_left": true, "missing_type": "NaN", "internal_count": 100,
            "left_child": {
                "split_feature": 1, "threshold": -1000, "decision_type": "<=",
                "default_left": false, "missing_type": "None", "internal_count": 60,
                "left_child": {"leaf_value": 0.8, "leaf_count": 20},
                "right_child": {"leaf_value": 0.3, "leaf_count": 40}
            },
            "right_child": {
                "split_feature": 0, "threshold": 0.75, "decision_type": "<=",
                "default_left": true, "missing_type": "None", "internal_count": 40,
                "left_child": {"leaf_value": -0.2, "leaf_count": 25},
                "right_child": {"leaf_value": -0.9, "leaf_count": 15}
            }
        }},
        {"tree_structure": {
            "split_feature": 2, "threshold": "1||3", "decision_type": "==",
            "default_left": false, "missing_type": "NaN", "internal_count": 100,
            "left_child": {"leaf_value": 0.25, "leaf_count": 30},
            "right_child": {
                "split_feature": 1, "threshold": -3000, "decision_type": "<=",
                "default_left": true, "missing_type": "Zero", "internal_count": 70,
                "left_child": {"leaf_value": -0.1, "leaf_count": 35},
                "right_child": {"leaf_value": 0.05, "leaf_count": 35}
            }
        }}
    ]
}"#;

fn clients_csv(n: usize) -> String {
    let mut csv = String::from(
        "SK_ID_CURR,CODE_GENDER,DAYS_BIRTH,NAME_FAMILY_STATUS,CNT_CHILDREN,\
         NAME_EDUCATION_TYPE,FLAG_OWN_CAR,FLAG_OWN_REALTY,NAME_HOUSING_TYPE,\
         NAME_INCOME_TYPE,AMT_INCOME_TOTAL,AMT_CREDIT,AMT_ANNUITY\n",
    );
    for i in 0..n {
        let gender = if i % 2 == 0 { "F" } else { "M" };
        let family = if i % 3 == 0 { "Married" } else { "Single / not married" };
        let education = if i % 4 == 0 {
            "Higher education"
        } else {
            "Secondary / secondary special"
        };
        let housing = if i % 5 == 0 { "With parents" } else { "House / apartment" };
        let income_type = ["Working", "Pensioner", "Commercial associate"][i % 3];
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            1000 + i,
            gender,
            -7300 - 365 * i as i64,
            family,
            i % 3,
            education,
            if i % 2 == 0 { "Y" } else { "N" },
            "Y",
            housing,
            income_type,
            90000.0 + 4500.0 * i as f64,
            250000.5 + 1000.0 * i as f64,
            if i % 7 == 0 { String::new() } else { format!("{}", 12000.0 + i as f64) },
        ));
    }
    csv
}

fn features_csv(n: usize) -> String {
    let mut csv = String::from("SK_ID_CURR,CODE_GENDER,DAYS_EMPLOYED,EXT_SOURCE_2\n");
    for i in 0..n {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            1000 + i,
            i % 4,
            -100 * i as i64,
            i as f64 / n as f64
        ));
    }
    csv
}

fn artifacts(clients: usize, features: usize) -> RawArtifacts {
    RawArtifacts {
        model: MODEL.as_bytes().to_vec(),
        clients: clients_csv(clients).into_bytes(),
        features: features_csv(features).into_bytes(),
    }
}

fn context() -> DashboardContext {
    DashboardContext::from_artifacts(&artifacts(POPULATION, POPULATION)).unwrap()
}

#[test]
fn test_context_alignment_and_additivity() {
    let ctx = context();
    assert_eq!(ctx.len(), POPULATION);
    assert_eq!(ctx.features().nrows(), POPULATION);
    assert_eq!(ctx.attributions().nrows(), POPULATION);
    // Feature columns follow the model, not the file.
    assert_eq!(ctx.features().names()[0], "EXT_SOURCE_2");

    for row in 0..POPULATION {
        let margin = ctx.model().margin(ctx.features().row(row).unwrap());
        assert_relative_eq!(
            ctx.attributions().reconstructed_margin(row).unwrap(),
            margin,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_row_count_mismatch_is_fatal() {
    let err = DashboardContext::from_artifacts(&artifacts(POPULATION, POPULATION - 1)).unwrap_err();
    assert!(matches!(
        err,
        DashboardError::Data(DataError::RowCountMismatch {
            clients: 40,
            features: 39
        })
    ));
}

#[test]
fn test_malformed_model_is_fatal() {
    let mut raw = artifacts(POPULATION, POPULATION);
    raw.model = b"{\"tree_info\": []}".to_vec();
    assert!(DashboardContext::from_artifacts(&raw).is_err());
}

#[rstest]
#[case(TableFilters::default(), 40)]
#[case(TableFilters { gender: FilterValue::equals("F"), ..Default::default() }, 20)]
#[case(TableFilters { children: FilterValue::equals("0"), ..Default::default() }, 14)]
#[case(
    TableFilters {
        gender: FilterValue::equals("F"),
        family_status: FilterValue::equals("Married"),
        ..Default::default()
    },
    7
)]
#[case(TableFilters { age: FilterValue::equals("200"), ..Default::default() }, 0)]
fn test_table_view(#[case] filters: TableFilters, #[case] expected: usize) {
    let ctx = context();
    let selection = SelectionState::default().with_filters(filters);
    let RenderedView::Table(table) = render(&ctx, View::ClientTable, &selection).unwrap() else {
        panic!("expected the table view");
    };
    assert_eq!(table.count, expected);
    assert_eq!(table.frame.height(), expected);
    assert_eq!(table.listing().unwrap().len(), expected);
}

#[test]
fn test_table_choices() {
    let ctx = context();
    let RenderedView::Table(table) =
        render(&ctx, View::ClientTable, &SelectionState::default()).unwrap()
    else {
        panic!("expected the table view");
    };
    let gender = table
        .choices
        .iter()
        .find(|(column, _)| *column == FilterColumn::Gender)
        .map(|(_, choices)| choices.clone())
        .unwrap();
    assert_eq!(gender, vec!["All", "F", "M"]);
}

#[test]
fn test_score_view() {
    let ctx = context();
    let selection = SelectionState::default().with_client(1000);
    let RenderedView::Score(view) = render(&ctx, View::ScoreVisualization, &selection).unwrap()
    else {
        panic!("expected the score view");
    };

    // Row 0 is [0.0, 0.0, 0.0]: leaves 0.3 and -0.1.
    assert_relative_eq!(view.margin, 0.2, epsilon = 1e-12);
    assert_relative_eq!(
        view.score.probability,
        1.0 / (1.0 + (-0.2f64).exp()),
        epsilon = 1e-12
    );
    assert_eq!(view.score.decision, Decision::Rejected);
    assert_eq!(view.client.age_years, 20);

    let total: f64 = view.contributions.iter().map(|c| c.contribution).sum();
    assert_relative_eq!(view.baseline + total, view.margin, epsilon = 1e-9);
    assert!(view.gauge_svg.contains("Rejected"));
    assert!(view.attribution_svg.contains("<svg"));
    assert_eq!(view.export().client_id, 1000);
}

#[test]
fn test_comparison_view() {
    let ctx = context();
    let selection = SelectionState::default()
        .with_client(1005)
        .with_neighbors(NeighborCount::new(10).unwrap());
    let RenderedView::Comparison(view) =
        render(&ctx, View::ClientComparison, &selection).unwrap()
    else {
        panic!("expected the comparison view");
    };

    assert_eq!(view.cohort.len(), 10);
    assert!(view.cohort.contains(5));
    assert!(view.cohort.indices.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(view.frame.height(), 10);
    assert_eq!(view.charts.len(), 6);
    assert!(view.panel_svg.contains("Housing type"));
    assert_eq!(view.listing().unwrap().len(), 10);

    let everyone = render(
        &ctx,
        View::ClientComparison,
        &selection.clone().with_full_population(true),
    )
    .unwrap();
    let RenderedView::Comparison(everyone) = everyone else {
        panic!("expected the comparison view");
    };
    assert_eq!(everyone.cohort.len(), POPULATION);
}

#[test]
fn test_views_need_a_client() {
    let ctx = context();
    for view in [View::ScoreVisualization, View::ClientComparison] {
        assert!(matches!(
            render(&ctx, view, &SelectionState::default()),
            Err(DashboardError::NoClientSelected(_))
        ));
    }
}

#[test]
fn test_unknown_client() {
    let ctx = context();
    let selection = SelectionState::default().with_client(9999);
    assert!(matches!(
        render(&ctx, View::ScoreVisualization, &selection),
        Err(DashboardError::Data(DataError::UnknownClient(9999)))
    ));
}

#[test]
fn test_view_names() {
    assert_eq!("score".parse::<View>().unwrap(), View::ScoreVisualization);
    assert_eq!(
        "client comparison".parse::<View>().unwrap(),
        View::ClientComparison
    );
    assert!("settings".parse::<View>().is_err());
}
