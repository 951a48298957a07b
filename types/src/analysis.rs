//! Results of the statistical routines run by the analysis executor.

use serde::{Deserialize, Serialize};

use crate::FocusArea;

/// `describe()`-style summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Symmetric Pearson correlation matrix.
///
/// `None` marks a coefficient that is undefined (too few paired
/// observations or a constant side).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values.get(i)?.get(j).copied().flatten()
    }

    /// Off-diagonal pairs ordered by absolute coefficient, strongest first.
    #[must_use]
    pub fn strongest_pairs(&self, limit: usize) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for (i, row) in self.values.iter().enumerate() {
            for (j, value) in row.iter().enumerate().skip(i + 1) {
                if let Some(r) = value {
                    pairs.push((self.columns[i].clone(), self.columns[j].clone(), *r));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
        pairs.truncate(limit);
        pairs
    }
}

/// IQR fences and the rows falling outside them for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub rows: Vec<usize>,
    pub values: Vec<f64>,
}

impl ColumnOutliers {
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub score: f64,
}

/// Mutual-information ranking of features against the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeatureRanking {
    Ranked { scores: Vec<FeatureScore> },
    NotApplicable { reason: String },
}

/// Output of whichever executor branch ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis", content = "result", rename_all = "snake_case")]
pub enum AnalysisOutput {
    Descriptive(Vec<ColumnSummary>),
    Correlation(CorrelationMatrix),
    Outliers(Vec<ColumnOutliers>),
    FeatureRanking(FeatureRanking),
}

impl AnalysisOutput {
    #[must_use]
    pub const fn focus_area(&self) -> FocusArea {
        match self {
            AnalysisOutput::Descriptive(_) => FocusArea::DescriptiveAnalysis,
            AnalysisOutput::Correlation(_) => FocusArea::CorrelationAnalysis,
            AnalysisOutput::Outliers(_) => FocusArea::OutlierDetection,
            AnalysisOutput::FeatureRanking(_) => FocusArea::FeatureRanking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisOutput, CorrelationMatrix, FeatureRanking};
    use crate::FocusArea;

    fn matrix() -> CorrelationMatrix {
        CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![Some(1.0), Some(0.2), Some(-0.9)],
                vec![Some(0.2), Some(1.0), None],
                vec![Some(-0.9), None, Some(1.0)],
            ],
        }
    }

    #[test]
    fn strongest_pairs_orders_by_magnitude() {
        let pairs = matrix().strongest_pairs(5);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].0.as_str(), pairs[0].1.as_str()), ("a", "c"));
        assert_eq!(pairs[0].2, -0.9);
    }

    #[test]
    fn get_looks_up_by_name() {
        let m = matrix();
        assert_eq!(m.get("b", "a"), Some(0.2));
        assert_eq!(m.get("b", "c"), None);
        assert_eq!(m.get("a", "missing"), None);
    }

    #[test]
    fn output_is_tagged_by_analysis() {
        let output = AnalysisOutput::FeatureRanking(FeatureRanking::NotApplicable {
            reason: "n/a".into(),
        });
        assert_eq!(output.focus_area(), FocusArea::FeatureRanking);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["analysis"], "feature_ranking");
        assert_eq!(json["result"]["status"], "not_applicable");
    }
}
