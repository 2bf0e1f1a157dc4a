//! Exact path-dependent TreeSHAP.
//!
//! Each tree is walked once per row. Along every root-to-leaf path the
//! algorithm tracks, for each distinct feature seen so far, the fraction of
//! training cover that flows through the path when the feature is unknown
//! (`zero_fraction`) and whether the row itself follows the path
//! (`one_fraction`). The permutation weights of all feature subsets are kept
//! in `pweight` and updated incrementally as features enter and leave the
//! path, which makes the whole pass polynomial in depth.
//!
//! Unknown features are marginalised with the same cover fractions used by
//! [`Tree::expected_value`], so the baseline plus the attributions of a row
//! add up to its raw margin.

use crate::gbdt::{NodeKind, Tree};
use ndarray::{ArrayView1, ArrayViewMut1};

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    pweight: f64,
}

/// Add the attributions of `tree` for `row` into `phi`, scaled by `scale`.
pub(crate) fn accumulate(
    tree: &Tree,
    row: ArrayView1<'_, f64>,
    phi: &mut ArrayViewMut1<'_, f64>,
    scale: f64,
) {
    let path = Vec::with_capacity(tree.depth() + 2);
    recurse(tree, row, phi, 0, path, 1.0, 1.0, None, scale);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    row: ArrayView1<'_, f64>,
    phi: &mut ArrayViewMut1<'_, f64>,
    index: usize,
    mut path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
    scale: f64,
) {
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    let kind = &tree.node(index).kind;
    match *kind {
        NodeKind::Leaf { value } => {
            for i in 1..path.len() {
                let element = path[i];
                if let Some(feature) = element.feature {
                    let weight = unwound_path_sum(&path, i);
                    phi[feature] +=
                        weight * (element.one_fraction - element.zero_fraction) * value * scale;
                }
            }
        }
        NodeKind::Split {
            feature: split,
            left,
            right,
            ..
        } => {
            let hot = kind.child(row).unwrap_or(left);
            let cold = if hot == left { right } else { left };
            let (left_fraction, right_fraction) = tree.child_fractions(left, right);
            let (hot_zero, cold_zero) = if hot == left {
                (left_fraction, right_fraction)
            } else {
                (right_fraction, left_fraction)
            };

            // A feature already on the path is removed and re-entered with
            // its fractions carried into the children.
            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(k) = path
                .iter()
                .skip(1)
                .position(|e| e.feature == Some(split))
                .map(|k| k + 1)
            {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind_path(&mut path, k);
            }

            let hot_zero = hot_zero * incoming_zero;
            let cold_zero = cold_zero * incoming_zero;
            if hot_zero != 0.0 || incoming_one != 0.0 {
                recurse(
                    tree,
                    row,
                    phi,
                    hot,
                    path.clone(),
                    hot_zero,
                    incoming_one,
                    Some(split),
                    scale,
                );
            }
            if cold_zero != 0.0 {
                recurse(tree, row, phi, cold, path, cold_zero, 0.0, Some(split), scale);
            }
        }
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i + 1) as f64 / denom;
        path[i].pweight = zero_fraction * path[i].pweight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next = path[depth].pweight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next * denom / ((i + 1) as f64 * one_fraction);
            next = tmp - path[i].pweight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].pweight = path[i].pweight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed.
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next = path[depth].pweight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next * denom / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next = path[i].pweight - tmp * zero_fraction * (depth - i) as f64 / denom;
        } else if zero_fraction != 0.0 {
            total += path[i].pweight / zero_fraction / ((depth - i) as f64 / denom);
        }
    }
    total
}
