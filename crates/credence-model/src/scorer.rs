//! Default-probability scoring and the approval decision.

use crate::classifier::Classifier;
use crate::error::{ModelError, Result};
use credence_data::FeatureTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probabilities strictly above this are rejected.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Credit decision derived from the default probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Probability at or below the threshold
    Approved,
    /// Probability above the threshold
    Rejected,
}

impl Decision {
    /// Decision for a default probability.
    pub fn from_probability(probability: f64) -> Self {
        if probability > DECISION_THRESHOLD {
            Self::Rejected
        } else {
            Self::Approved
        }
    }

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Color used when rendering the decision.
    pub const fn color_name(&self) -> &'static str {
        match self {
            Self::Approved => "Green",
            Self::Rejected => "Red",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default probability of one client and the resulting decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Probability of default, in `[0, 1]`
    pub probability: f64,
    /// Decision at [`DECISION_THRESHOLD`]
    pub decision: Decision,
}

impl Score {
    /// Score for a probability.
    pub fn from_probability(probability: f64) -> Self {
        Self {
            probability,
            decision: Decision::from_probability(probability),
        }
    }

    /// Probability as a percentage, rounded to one decimal.
    pub fn percent(&self) -> f64 {
        (self.probability * 1000.0).round() / 10.0
    }
}

/// Score the client at `index` of the feature table.
pub fn score<C: Classifier + ?Sized>(model: &C, features: &FeatureTable, index: usize) -> Result<Score> {
    if index >= features.nrows() {
        return Err(ModelError::RowOutOfRange {
            index,
            len: features.nrows(),
        });
    }
    if model.num_features() != features.ncols() {
        return Err(ModelError::FeatureCountMismatch {
            model: model.num_features(),
            table: features.ncols(),
        });
    }
    let probabilities = model.predict_proba(features.row(index)?);
    Ok(Score::from_probability(probabilities.positive))
}
