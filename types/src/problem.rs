//! Problem-type classification produced by the domain expert.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Modeling problem inferred for a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProblemType {
    Regression,
    Classification,
    Clustering,
    #[default]
    Unknown,
}

impl ProblemType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ProblemType::Regression => "regression",
            ProblemType::Classification => "classification",
            ProblemType::Clustering => "clustering",
            ProblemType::Unknown => "unknown",
        }
    }

    /// Lenient parse; anything unrecognized is [`ProblemType::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regression" => ProblemType::Regression,
            "classification" => ProblemType::Classification,
            "clustering" => ProblemType::Clustering,
            _ => ProblemType::Unknown,
        }
    }

    /// Regression and classification are the problem types that need a target.
    #[must_use]
    pub const fn is_supervised(self) -> bool {
        matches!(self, ProblemType::Regression | ProblemType::Classification)
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProblemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProblemType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(ProblemType::Unknown, ProblemType::parse))
    }
}

/// The domain expert's verdict on a dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawVerdict")]
pub struct DomainVerdict {
    pub problem_type: ProblemType,
    pub target_variable: Option<String>,
    pub confidence_score_regression: Option<f64>,
    pub confidence_score_classification: Option<f64>,
    pub confidence_score_clustering: Option<f64>,
}

impl DomainVerdict {
    #[must_use]
    pub fn new(problem_type: ProblemType, target_variable: Option<&str>) -> Self {
        Self {
            problem_type,
            target_variable: normalize_target(target_variable.map(str::to_string)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target_variable.as_deref()
    }

    /// Confidence reported for a specific problem type.
    #[must_use]
    pub fn confidence(&self, problem_type: ProblemType) -> Option<f64> {
        match problem_type {
            ProblemType::Regression => self.confidence_score_regression,
            ProblemType::Classification => self.confidence_score_classification,
            ProblemType::Clustering => self.confidence_score_clustering,
            ProblemType::Unknown => None,
        }
    }
}

// LLM replies are loosely typed: scores arrive as numbers, strings or null.
#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    problem_type: ProblemType,
    #[serde(default)]
    target_variable: Option<String>,
    #[serde(default)]
    confidence_score_regression: Option<serde_json::Value>,
    #[serde(default)]
    confidence_score_classification: Option<serde_json::Value>,
    #[serde(default)]
    confidence_score_clustering: Option<serde_json::Value>,
}

impl From<RawVerdict> for DomainVerdict {
    fn from(raw: RawVerdict) -> Self {
        Self {
            problem_type: raw.problem_type,
            target_variable: normalize_target(raw.target_variable),
            confidence_score_regression: score(raw.confidence_score_regression),
            confidence_score_classification: score(raw.confidence_score_classification),
            confidence_score_clustering: score(raw.confidence_score_clustering),
        }
    }
}

fn normalize_target(raw: Option<String>) -> Option<String> {
    let trimmed = raw?.trim().to_string();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "none" | "null" | "n/a" => None,
        _ => Some(trimmed),
    }
}

fn score(value: Option<serde_json::Value>) -> Option<f64> {
    let raw = match value? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    raw.is_finite().then(|| raw.clamp(0.0, 1.0))
}
