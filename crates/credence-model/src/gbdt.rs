//! Gradient-boosted decision tree ensemble.
//!
//! Loads the JSON dump produced by LightGBM's `Booster.dump_model()` for a
//! binary objective. Leaf values in the dump already include shrinkage, so
//! the raw margin of a row is the sum of the leaves it reaches (divided by the
//! tree count when the ensemble averages its output).
//!
//! Split semantics follow LightGBM:
//! - numeric splits go left when `value <= threshold`;
//! - categorical splits go left when the integer value is in the category set;
//! - `NaN` is routed by `missing_type` and `default_left`.

use crate::classifier::{ClassProbabilities, Classifier};
use crate::error::{ModelError, Result};
use ndarray::ArrayView1;
use serde::Deserialize;

/// Values with magnitude at or below this are treated as zero by `Zero` splits.
const ZERO_THRESHOLD: f64 = 1e-35;

/// Handling of missing values at a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingType {
    /// No missing values during training; `NaN` is treated as zero.
    None,
    /// Zero (and `NaN`) follows the default branch.
    Zero,
    /// `NaN` follows the default branch.
    NaN,
}

impl MissingType {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "None" => Ok(Self::None),
            "Zero" => Ok(Self::Zero),
            "NaN" => Ok(Self::NaN),
            other => Err(ModelError::InvalidModel(format!(
                "unknown missing_type {other}"
            ))),
        }
    }
}

/// Split rule of an internal node.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule {
    /// `value <= threshold` goes left.
    Numeric {
        /// Split threshold
        threshold: f64,
    },
    /// Values in `categories` go left.
    Categorical {
        /// Left-branch categories
        categories: Vec<i64>,
    },
}

/// A tree node: either a leaf or a split.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Terminal node
    Leaf {
        /// Contribution to the raw margin
        value: f64,
    },
    /// Internal split
    Split {
        /// Feature column tested
        feature: usize,
        /// Rule applied to the feature value
        rule: SplitRule,
        /// Missing-value handling
        missing: MissingType,
        /// Branch taken by missing values
        default_left: bool,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
}

impl NodeKind {
    /// Child a split sends `row` to, `None` for a leaf.
    pub fn child(&self, row: ArrayView1<'_, f64>) -> Option<usize> {
        match self {
            Self::Split {
                feature,
                rule,
                missing,
                default_left,
                left,
                right,
            } => {
                let goes_left = decide(rule, *missing, *default_left, row[*feature]);
                Some(if goes_left { *left } else { *right })
            }
            Self::Leaf { .. } => None,
        }
    }
}

/// A node with its training cover (number of training rows reaching it).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Leaf or split
    pub kind: NodeKind,
    /// Training rows that reached this node
    pub cover: f64,
}

/// One decision tree, stored as a node arena rooted at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Nodes of the tree; index 0 is the root.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node at `index`; indices taken from this tree's splits are always valid.
    pub(crate) fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Child of node `index` taken by `row`, `None` for a leaf or an index
    /// outside the tree.
    pub fn next(&self, index: usize, row: ArrayView1<'_, f64>) -> Option<usize> {
        self.nodes.get(index)?.kind.child(row)
    }

    /// Leaf value reached by `row`.
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        while let Some(child) = self.nodes[index].kind.child(row) {
            index = child;
        }
        match self.nodes[index].kind {
            NodeKind::Leaf { value } => value,
            NodeKind::Split { .. } => f64::NAN,
        }
    }

    /// Share of training cover sent to the left and right children of a split.
    ///
    /// Children without cover split the parent evenly.
    pub fn child_fractions(&self, left: usize, right: usize) -> (f64, f64) {
        let cover_left = self.nodes[left].cover;
        let cover_right = self.nodes[right].cover;
        let total = cover_left + cover_right;
        if total > 0.0 {
            (cover_left / total, cover_right / total)
        } else {
            (0.5, 0.5)
        }
    }

    /// Cover-weighted mean leaf value, the tree's expected output.
    pub fn expected_value(&self) -> f64 {
        self.subtree_mean(0)
    }

    fn subtree_mean(&self, index: usize) -> f64 {
        match self.nodes[index].kind {
            NodeKind::Leaf { value } => value,
            NodeKind::Split { left, right, .. } => {
                let (wl, wr) = self.child_fractions(left, right);
                wl * self.subtree_mean(left) + wr * self.subtree_mean(right)
            }
        }
    }

    /// Maximum depth (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn walk(tree: &Tree, index: usize) -> usize {
            match tree.nodes[index].kind {
                NodeKind::Leaf { .. } => 0,
                NodeKind::Split { left, right, .. } => 1 + walk(tree, left).max(walk(tree, right)),
            }
        }
        walk(self, 0)
    }
}

fn decide(rule: &SplitRule, missing: MissingType, default_left: bool, value: f64) -> bool {
    match rule {
        SplitRule::Numeric { threshold } => {
            let value = if value.is_nan() && missing != MissingType::NaN {
                0.0
            } else {
                value
            };
            if (missing == MissingType::Zero && value.abs() <= ZERO_THRESHOLD)
                || (missing == MissingType::NaN && value.is_nan())
            {
                default_left
            } else {
                value <= *threshold
            }
        }
        SplitRule::Categorical { categories } => {
            if value.is_nan() && missing == MissingType::NaN {
                return false;
            }
            let value = if value.is_nan() { 0.0 } else { value };
            let category = value as i64;
            category >= 0 && categories.contains(&category)
        }
    }
}

/// Link from raw margin to probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    /// Logistic link `1 / (1 + exp(-sigmoid * margin))`
    Binary {
        /// Sigmoid scale parameter
        sigmoid: f64,
    },
}

impl Objective {
    fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("binary") => {
                let mut sigmoid = 1.0;
                for param in parts {
                    if let Some(v) = param.strip_prefix("sigmoid:") {
                        sigmoid = v.parse().map_err(|_| {
                            ModelError::InvalidModel(format!("bad sigmoid parameter {v}"))
                        })?;
                    }
                }
                Ok(Self::Binary { sigmoid })
            }
            _ => Err(ModelError::UnsupportedObjective(s.to_string())),
        }
    }

    /// Probability of the positive class for a raw margin.
    pub fn transform(&self, margin: f64) -> f64 {
        match self {
            Self::Binary { sigmoid } => 1.0 / (1.0 + (-sigmoid * margin).exp()),
        }
    }
}

/// A binary-classification tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    num_features: usize,
    objective: Objective,
    average_output: bool,
}

impl TreeEnsemble {
    /// Parse a LightGBM JSON model dump.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let dump: ModelDump = serde_json::from_slice(bytes)?;
        Self::from_dump(dump)
    }

    fn from_dump(dump: ModelDump) -> Result<Self> {
        if dump.num_class != 1 || dump.num_tree_per_iteration != 1 {
            return Err(ModelError::UnsupportedObjective(format!(
                "{} with {} classes",
                dump.objective, dump.num_class
            )));
        }
        let objective = Objective::parse(&dump.objective)?;
        let num_features = dump.max_feature_idx + 1;
        if !dump.feature_names.is_empty() && dump.feature_names.len() != num_features {
            return Err(ModelError::InvalidModel(format!(
                "{} feature names for {} features",
                dump.feature_names.len(),
                num_features
            )));
        }
        if dump.tree_info.is_empty() {
            return Err(ModelError::InvalidModel("model has no trees".to_string()));
        }

        let trees = dump
            .tree_info
            .into_iter()
            .map(|info| {
                let mut nodes = Vec::with_capacity(2 * info.num_leaves.max(1));
                flatten(info.tree_structure, num_features, &mut nodes)?;
                Ok(Tree { nodes })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            trees = trees.len(),
            features = num_features,
            max_depth = trees.iter().map(Tree::depth).max().unwrap_or(0),
            "loaded tree ensemble"
        );

        Ok(Self {
            trees,
            feature_names: dump.feature_names,
            num_features,
            objective,
            average_output: dump.average_output,
        })
    }

    /// Trees of the ensemble.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Feature names recorded at training time (may be empty).
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Link function.
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Weight applied to each tree's output.
    pub fn tree_weight(&self) -> f64 {
        if self.average_output {
            1.0 / self.trees.len() as f64
        } else {
            1.0
        }
    }

    /// Raw positive-class margin of a feature vector.
    pub fn margin(&self, row: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        sum * self.tree_weight()
    }
}

impl Classifier for TreeEnsemble {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> ClassProbabilities {
        ClassProbabilities::from_positive(self.objective.transform(self.margin(row)))
    }
}

fn flatten(dump: NodeDump, num_features: usize, nodes: &mut Vec<Node>) -> Result<usize> {
    let index = nodes.len();
    match dump {
        NodeDump::Leaf(leaf) => {
            nodes.push(Node {
                kind: NodeKind::Leaf {
                    value: leaf.leaf_value,
                },
                cover: leaf.leaf_count,
            });
        }
        NodeDump::Split(split) => {
            if split.split_feature >= num_features {
                return Err(ModelError::InvalidModel(format!(
                    "split on feature {} but model has {} features",
                    split.split_feature, num_features
                )));
            }
            let rule = match (split.decision_type.as_str(), split.threshold) {
                ("<=", ThresholdDump::Numeric(threshold)) => SplitRule::Numeric { threshold },
                ("==", ThresholdDump::Categories(set)) => SplitRule::Categorical {
                    categories: parse_categories(&set)?,
                },
                ("==", ThresholdDump::Numeric(category)) => SplitRule::Categorical {
                    categories: vec![category as i64],
                },
                (decision, _) => {
                    return Err(ModelError::InvalidModel(format!(
                        "unsupported decision type {decision}"
                    )));
                }
            };
            let missing = MissingType::parse(&split.missing_type)?;

            // Reserve the slot, children are appended after it.
            nodes.push(Node {
                kind: NodeKind::Leaf { value: 0.0 },
                cover: split.internal_count,
            });
            let left = flatten(*split.left_child, num_features, nodes)?;
            let right = flatten(*split.right_child, num_features, nodes)?;
            nodes[index].kind = NodeKind::Split {
                feature: split.split_feature,
                rule,
                missing,
                default_left: split.default_left,
                left,
                right,
            };
        }
    }
    Ok(index)
}

fn parse_categories(set: &str) -> Result<Vec<i64>> {
    set.split("||")
        .map(|c| {
            c.trim()
                .parse::<i64>()
                .map_err(|_| ModelError::InvalidModel(format!("bad category {c}")))
        })
        .collect()
}

const fn one() -> usize {
    1
}

fn none() -> String {
    "None".to_string()
}

#[derive(Debug, Deserialize)]
struct ModelDump {
    #[serde(default = "one")]
    num_class: usize,
    #[serde(default = "one")]
    num_tree_per_iteration: usize,
    max_feature_idx: usize,
    objective: String,
    #[serde(default)]
    average_output: bool,
    #[serde(default)]
    feature_names: Vec<String>,
    tree_info: Vec<TreeDump>,
}

#[derive(Debug, Deserialize)]
struct TreeDump {
    #[serde(default)]
    num_leaves: usize,
    tree_structure: NodeDump,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeDump {
    Split(SplitDump),
    Leaf(LeafDump),
}

#[derive(Debug, Deserialize)]
struct SplitDump {
    split_feature: usize,
    threshold: ThresholdDump,
    decision_type: String,
    #[serde(default)]
    default_left: bool,
    #[serde(default = "none")]
    missing_type: String,
    #[serde(default)]
    internal_count: f64,
    left_child: Box<NodeDump>,
    right_child: Box<NodeDump>,
}

#[derive(Debug, Deserialize)]
struct LeafDump {
    leaf_value: f64,
    #[serde(default)]
    leaf_count: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ThresholdDump {
    Numeric(f64),
    Categories(String),
}
