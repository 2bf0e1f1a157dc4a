//! Binary classifier seam.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Probability pair of a binary prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    /// Probability of class 0 (repayment)
    pub negative: f64,
    /// Probability of class 1 (default)
    pub positive: f64,
}

impl ClassProbabilities {
    /// Build the pair from the positive-class probability.
    pub fn from_positive(positive: f64) -> Self {
        Self {
            negative: 1.0 - positive,
            positive,
        }
    }
}

/// A fitted binary classifier over fixed-width feature vectors.
pub trait Classifier: Send + Sync {
    /// Width of the expected feature vector.
    fn num_features(&self) -> usize;

    /// Class probabilities of one feature vector.
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> ClassProbabilities;
}
