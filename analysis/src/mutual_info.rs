//! Mutual information between each feature and the target.
//!
//! Continuous/continuous pairs use the Kraskov (KSG) k-NN estimator,
//! continuous/discrete pairs the Ross k-NN estimator and discrete/discrete
//! pairs the plug-in estimate from the contingency table. Scores are in
//! nats and never negative.

use std::collections::HashMap;

use eda_dataset::{Column, Frame};
use eda_types::{AnalysisSettings, FeatureRanking, FeatureScore, ProblemType};

use crate::AnalysisError;

pub const NOT_APPLICABLE: &str =
    "Feature ranking not applicable for clustering or unknown problem types.";

/// One variable restricted to the rows used for a single estimate.
#[derive(Debug, Clone)]
enum Variable {
    Continuous(Vec<f64>),
    Discrete(Vec<usize>),
}

/// Rank every non-target column by its mutual information with `target`.
pub fn rank_features(
    frame: &Frame,
    target: Option<&str>,
    problem_type: ProblemType,
    settings: &AnalysisSettings,
) -> Result<FeatureRanking, AnalysisError> {
    let target = match (problem_type.is_supervised(), target) {
        (true, Some(target)) => target,
        _ => {
            return Ok(FeatureRanking::NotApplicable {
                reason: NOT_APPLICABLE.to_string(),
            });
        }
    };
    let target_column = frame
        .column(target)
        .ok_or_else(|| AnalysisError::UnknownColumn(target.to_string()))?;
    let discrete_target = problem_type == ProblemType::Classification;
    if !discrete_target && !target_column.is_numeric() {
        return Err(AnalysisError::NonNumericTarget(target.to_string()));
    }

    let rows = sample_rows(frame.n_rows(), settings.mi_max_rows);
    let neighbors = settings.mi_neighbors.max(1);

    let mut scores: Vec<FeatureScore> = frame
        .columns()
        .iter()
        .filter(|c| c.name() != target)
        .map(|feature| {
            let score = score_pair(feature, target_column, discrete_target, &rows, neighbors);
            FeatureScore {
                feature: feature.name().to_string(),
                score,
            }
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        target,
        features = scores.len(),
        rows = rows.len(),
        "Ranked features by mutual information"
    );
    Ok(FeatureRanking::Ranked { scores })
}

/// Evenly spaced row indices, at most `max_rows` of them.
fn sample_rows(n_rows: usize, max_rows: usize) -> Vec<usize> {
    if max_rows == 0 || n_rows <= max_rows {
        return (0..n_rows).collect();
    }
    (0..max_rows).map(|i| i * n_rows / max_rows).collect()
}

fn score_pair(
    feature: &Column,
    target: &Column,
    discrete_target: bool,
    rows: &[usize],
    neighbors: usize,
) -> f64 {
    let kept: Vec<usize> = rows
        .iter()
        .copied()
        .filter(|&row| present(feature, row, !feature.is_numeric()))
        .filter(|&row| present(target, row, discrete_target))
        .collect();
    if kept.len() < 2 {
        return 0.0;
    }

    let x = extract(feature, &kept, !feature.is_numeric());
    let y = extract(target, &kept, discrete_target);
    let mi = match (x, y) {
        (Variable::Continuous(x), Variable::Continuous(y)) => mi_continuous(&x, &y, neighbors),
        (Variable::Continuous(c), Variable::Discrete(d))
        | (Variable::Discrete(d), Variable::Continuous(c)) => mi_mixed(&c, &d, neighbors),
        (Variable::Discrete(x), Variable::Discrete(y)) => mi_discrete(&x, &y),
    };
    if mi.is_finite() { mi.max(0.0) } else { 0.0 }
}

fn present(column: &Column, row: usize, discrete: bool) -> bool {
    let value = &column.values()[row];
    if discrete {
        !value.is_missing()
    } else {
        value.as_f64().is_some()
    }
}

fn extract(column: &Column, rows: &[usize], discrete: bool) -> Variable {
    let values = column.values();
    if discrete {
        let mut codes = HashMap::new();
        Variable::Discrete(
            rows.iter()
                .map(|&row| {
                    let next = codes.len();
                    *codes.entry(values[row].key()).or_insert(next)
                })
                .collect(),
        )
    } else {
        let raw: Vec<f64> = rows
            .iter()
            .filter_map(|&row| values[row].as_f64())
            .collect();
        Variable::Continuous(scale(raw))
    }
}

/// Divide by the population standard deviation; constant data is left as is.
fn scale(mut values: Vec<f64>) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std > 0.0 && std.is_finite() {
        for v in &mut values {
            *v /= std;
        }
    }
    values
}

/// Digamma at positive integers: `psi(n) = -gamma + sum_{i<n} 1/i`.
struct Digamma(Vec<f64>);

impl Digamma {
    const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

    fn up_to(n: usize) -> Self {
        let mut table = Vec::with_capacity(n + 1);
        table.push(f64::NAN);
        let mut acc = -Self::EULER_GAMMA;
        for i in 1..=n {
            table.push(acc);
            acc += 1.0 / i as f64;
        }
        Self(table)
    }

    fn at(&self, n: usize) -> f64 {
        self.0[n]
    }

    fn mean_over(&self, counts: impl Iterator<Item = usize>) -> f64 {
        let (sum, len) = counts.fold((0.0, 0usize), |(s, l), c| (s + self.at(c), l + 1));
        if len == 0 { 0.0 } else { sum / len as f64 }
    }
}

/// Largest float strictly below a positive radius, so that neighbor counts
/// exclude points sitting exactly on the boundary.
fn shrink(radius: f64) -> f64 {
    if radius > 0.0 {
        f64::from_bits(radius.to_bits() - 1)
    } else {
        radius
    }
}

/// Distance from each point to its `k`-th nearest other point.
fn kth_neighbor_radius(n: usize, k: usize, distance: impl Fn(usize, usize) -> f64) -> Vec<f64> {
    let mut buf = Vec::with_capacity(n.saturating_sub(1));
    (0..n)
        .map(|i| {
            buf.clear();
            buf.extend((0..n).filter(|&j| j != i).map(|j| distance(i, j)));
            let (_, kth, _) = buf.select_nth_unstable_by(k - 1, f64::total_cmp);
            *kth
        })
        .collect()
}

/// Points of `sorted` within `radius` of `center`, inclusive, measured as
/// `|v - center|`. `center ± radius` can round onto a neighbor at the
/// boundary, so the binary search only brackets a widened window.
fn count_within(sorted: &[f64], center: f64, radius: f64) -> usize {
    let slack = radius * f64::EPSILON * 4.0 + center.abs() * f64::EPSILON * 4.0;
    let lo = sorted.partition_point(|v| *v < center - radius - slack);
    let hi = sorted.partition_point(|v| *v <= center + radius + slack);
    sorted[lo..hi.max(lo)]
        .iter()
        .filter(|v| (*v - center).abs() <= radius)
        .count()
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// KSG estimator (algorithm 1) with the Chebyshev norm in the joint space.
fn mi_continuous(x: &[f64], y: &[f64], neighbors: usize) -> f64 {
    let n = x.len();
    let k = neighbors.min(n - 1);
    let radius = kth_neighbor_radius(n, k, |i, j| (x[i] - x[j]).abs().max((y[i] - y[j]).abs()));

    let sorted_x = sorted_copy(x);
    let sorted_y = sorted_copy(y);
    let psi = Digamma::up_to(n);

    let nx = (0..n).map(|i| count_within(&sorted_x, x[i], shrink(radius[i])));
    let ny = (0..n).map(|i| count_within(&sorted_y, y[i], shrink(radius[i])));
    // Counts include the point itself, so `nx` here is already `n_x + 1`.
    psi.at(n) + psi.at(k) - psi.mean_over(nx) - psi.mean_over(ny)
}

/// Ross estimator for a continuous variable against discrete labels.
/// Points whose label occurs once carry no neighborhood and are ignored.
fn mi_mixed(c: &[f64], d: &[usize], neighbors: usize) -> f64 {
    let mut by_label: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, label) in d.iter().enumerate() {
        by_label.entry(*label).or_default().push(i);
    }

    let mut radius = Vec::new();
    let mut k_all = Vec::new();
    let mut label_counts = Vec::new();
    let mut kept = Vec::new();
    for members in by_label.values().filter(|m| m.len() > 1) {
        let count = members.len();
        let k = neighbors.min(count - 1);
        let r = kth_neighbor_radius(count, k, |a, b| (c[members[a]] - c[members[b]]).abs());
        for (member, r) in members.iter().zip(r) {
            kept.push(*member);
            radius.push(shrink(r));
            k_all.push(k);
            label_counts.push(count);
        }
    }
    let n = kept.len();
    if n == 0 {
        return 0.0;
    }

    let values: Vec<f64> = kept.iter().map(|&i| c[i]).collect();
    let sorted = sorted_copy(&values);
    let psi = Digamma::up_to(n);
    let m_all = values
        .iter()
        .zip(&radius)
        .map(|(v, r)| count_within(&sorted, *v, *r));

    psi.at(n) + psi.mean_over(k_all.into_iter())
        - psi.mean_over(label_counts.into_iter())
        - psi.mean_over(m_all)
}

/// Plug-in mutual information of two label vectors, in nats.
fn mi_discrete(x: &[usize], y: &[usize]) -> f64 {
    let n = x.len() as f64;
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut px: HashMap<usize, usize> = HashMap::new();
    let mut py: HashMap<usize, usize> = HashMap::new();
    for (a, b) in x.iter().zip(y) {
        *joint.entry((*a, *b)).or_default() += 1;
        *px.entry(*a).or_default() += 1;
        *py.entry(*b).or_default() += 1;
    }
    joint
        .iter()
        .map(|((a, b), count)| {
            let nij = *count as f64;
            let expected = (px[a] * py[b]) as f64;
            nij / n * (n * nij / expected).ln()
        })
        .sum()
}
