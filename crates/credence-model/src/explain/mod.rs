//! Per-client feature attributions.
//!
//! [`TreeExplainer`] computes SHAP values of a [`TreeEnsemble`] on the raw
//! margin scale, for the positive class. The matrix is computed once for the
//! whole population and then only read.

mod tree_shap;

use crate::error::{ModelError, Result};
use crate::gbdt::TreeEnsemble;
use credence_data::FeatureTable;
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// Signed contribution of one feature to one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Feature name
    pub feature: String,
    /// Feature value of the client
    pub value: f64,
    /// Attribution on the margin scale
    pub contribution: f64,
}

/// Attribution matrix and its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributions {
    values: Array2<f64>,
    baseline: f64,
    feature_names: Vec<String>,
}

impl Attributions {
    /// Full matrix, rows aligned with the feature table.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Expected model margin the attributions are measured against.
    pub const fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Feature names in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of explained rows.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Attributions of one client.
    pub fn row(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        if index >= self.nrows() {
            return Err(ModelError::RowOutOfRange {
                index,
                len: self.nrows(),
            });
        }
        Ok(self.values.row(index))
    }

    /// Baseline plus the attributions of one client, i.e. its raw margin.
    pub fn reconstructed_margin(&self, index: usize) -> Result<f64> {
        Ok(self.baseline + self.row(index)?.sum())
    }

    /// Contributions of one client, largest magnitude first.
    pub fn contributions(&self, features: &FeatureTable, index: usize) -> Result<Vec<FeatureContribution>> {
        let attributions = self.row(index)?;
        let values = features.row(index)?;
        let mut out: Vec<FeatureContribution> = self
            .feature_names
            .iter()
            .zip(attributions.iter().zip(values.iter()))
            .map(|(name, (&contribution, &value))| FeatureContribution {
                feature: name.clone(),
                value,
                contribution,
            })
            .collect();
        out.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        Ok(out)
    }
}

/// TreeSHAP explainer over a tree ensemble.
#[derive(Debug, Clone, Copy)]
pub struct TreeExplainer<'a> {
    model: &'a TreeEnsemble,
}

impl<'a> TreeExplainer<'a> {
    /// Wrap a model.
    pub const fn new(model: &'a TreeEnsemble) -> Self {
        Self { model }
    }

    /// Expected raw margin under the training distribution.
    pub fn expected_value(&self) -> f64 {
        let sum: f64 = self.model.trees().iter().map(|t| t.expected_value()).sum();
        sum * self.model.tree_weight()
    }

    /// SHAP values of a single feature vector.
    pub fn explain_row(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        let mut phi = ndarray::Array1::<f64>::zeros(row.len());
        let scale = self.model.tree_weight();
        let mut view = phi.view_mut();
        for tree in self.model.trees() {
            tree_shap::accumulate(tree, row, &mut view, scale);
        }
        phi.to_vec()
    }

    /// SHAP values for every row of `x`, computed in parallel.
    pub fn shap_values(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let scale = self.model.tree_weight();
        let mut out = Array2::<f64>::zeros(x.raw_dim());
        Zip::from(out.rows_mut())
            .and(x.rows())
            .par_for_each(|mut phi, row| {
                for tree in self.model.trees() {
                    tree_shap::accumulate(tree, row, &mut phi, scale);
                }
            });
        out
    }

    /// Explain a whole feature table.
    pub fn explain(&self, features: &FeatureTable) -> Result<Attributions> {
        let expected = crate::classifier::Classifier::num_features(self.model);
        if features.ncols() != expected {
            return Err(ModelError::FeatureCountMismatch {
                model: expected,
                table: features.ncols(),
            });
        }

        let values = self.shap_values(features.values());
        let baseline = self.expected_value();
        tracing::info!(
            rows = values.nrows(),
            features = values.ncols(),
            baseline,
            "computed feature attributions"
        );

        Ok(Attributions {
            values,
            baseline,
            feature_names: features.names().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tests::sample_model;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_additivity_on_sample_model() {
        let model = sample_model();
        let explainer = TreeExplainer::new(&model);
        let x = array![
            [0.4, -2000.0, 3.0],
            [0.4, -500.0, 2.0],
            [f64::NAN, -5000.0, f64::NAN],
            [0.9, 0.0, 0.0],
        ];
        let phi = explainer.shap_values(x.view());
        for (i, row) in x.rows().into_iter().enumerate() {
            let total = explainer.expected_value() + phi.row(i).sum();
            assert_relative_eq!(total, model.margin(row), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_row_matches_batch() {
        let model = sample_model();
        let explainer = TreeExplainer::new(&model);
        let x = array![[0.6, -1500.0, 1.0]];
        let batch = explainer.shap_values(x.view());
        let single = explainer.explain_row(x.row(0));
        for (a, b) in batch.row(0).iter().zip(single) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_contributions_sorted_by_magnitude() {
        let model = sample_model();
        let features = FeatureTable::new(
            model.feature_names().to_vec(),
            array![[0.9, -4000.0, 1.0], [0.1, -100.0, 5.0]],
        )
        .unwrap();
        let attributions = TreeExplainer::new(&model).explain(&features).unwrap();
        let contributions = attributions.contributions(&features, 0).unwrap();
        assert_eq!(contributions.len(), 3);
        for pair in contributions.windows(2) {
            assert!(pair[0].contribution.abs() >= pair[1].contribution.abs());
        }
        assert!(matches!(
            attributions.row(2),
            Err(ModelError::RowOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_feature_width_checked() {
        let model = sample_model();
        let features = FeatureTable::new(vec!["a".into()], array![[1.0]]).unwrap();
        assert!(matches!(
            TreeExplainer::new(&model).explain(&features),
            Err(ModelError::FeatureCountMismatch { model: 3, table: 1 })
        ));
    }
}
