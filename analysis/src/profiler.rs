//! Structural profile of a dataset, one entry point per problem type.

use std::collections::BTreeMap;

use eda_dataset::{Column, Frame, Value};
use eda_types::{DatasetProfile, ProblemType};

use crate::AnalysisError;

/// Profile for a regression problem. No class balance, no cardinality.
pub fn profile_regression(frame: &Frame, target: &str) -> Result<DatasetProfile, AnalysisError> {
    require_target(frame, target)?;
    let mut profile = base_profile(frame, Some(target));
    profile.class_imbalance = None;
    profile.categorical_cardinality = None;
    Ok(profile)
}

/// Profile for a classification problem. Class balance is the value
/// counts of the target, missing cells excluded.
pub fn profile_classification(
    frame: &Frame,
    target: &str,
) -> Result<DatasetProfile, AnalysisError> {
    let column = require_target(frame, target)?;
    let mut profile = base_profile(frame, Some(target));
    profile.class_imbalance = Some(column.value_counts());
    profile.categorical_cardinality = Some(cardinality(frame, &profile.categorical_columns));
    Ok(profile)
}

/// Profile for a clustering problem. The target is optional and, when
/// present, is still kept out of the column partitions.
pub fn profile_clustering(
    frame: &Frame,
    target: Option<&str>,
) -> Result<DatasetProfile, AnalysisError> {
    let target = target.filter(|name| frame.column(name).is_some());
    let mut profile = base_profile(frame, target);
    profile.class_imbalance = None;
    profile.categorical_cardinality = Some(cardinality(frame, &profile.categorical_columns));
    Ok(profile)
}

/// Dispatch to the profiler matching `problem_type`. Unknown problems get
/// the clustering profile.
pub fn profile(
    frame: &Frame,
    problem_type: ProblemType,
    target: Option<&str>,
) -> Result<DatasetProfile, AnalysisError> {
    match problem_type {
        ProblemType::Regression => {
            profile_regression(frame, target.ok_or(AnalysisError::MissingTarget("regression"))?)
        }
        ProblemType::Classification => profile_classification(
            frame,
            target.ok_or(AnalysisError::MissingTarget("classification"))?,
        ),
        ProblemType::Clustering | ProblemType::Unknown => profile_clustering(frame, target),
    }
}

fn require_target<'a>(frame: &'a Frame, target: &str) -> Result<&'a Column, AnalysisError> {
    frame
        .column(target)
        .ok_or_else(|| AnalysisError::UnknownColumn(target.to_string()))
}

fn base_profile(frame: &Frame, target: Option<&str>) -> DatasetProfile {
    let columns = frame.columns();
    let is_target = |column: &Column| Some(column.name()) == target;

    let numeric_columns: Vec<String> = columns
        .iter()
        .filter(|c| c.is_numeric() && !is_target(c))
        .map(|c| c.name().to_string())
        .collect();
    let categorical_columns = columns
        .iter()
        .filter(|c| !c.is_numeric() && !is_target(c))
        .map(|c| c.name().to_string())
        .collect();

    DatasetProfile {
        shape: frame.shape(),
        missing_values: columns
            .iter()
            .map(|c| (c.name().to_string(), c.missing_count()))
            .collect(),
        dtypes: columns
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect(),
        class_imbalance: None,
        categorical_cardinality: None,
        duplicate_rows: frame.duplicate_rows(),
        duplicate_columns: duplicate_columns(columns),
        constant_columns: columns
            .iter()
            .filter(|c| !c.is_empty() && c.n_distinct() == 1)
            .map(|c| c.name().to_string())
            .collect(),
        all_columns: frame.column_names(),
        numeric_columns,
        categorical_columns,
    }
}

fn cardinality(frame: &Frame, names: &[String]) -> BTreeMap<String, usize> {
    names
        .iter()
        .filter_map(|name| frame.column(name))
        .map(|c| (c.name().to_string(), c.n_unique()))
        .collect()
}

/// Columns whose cells repeat an earlier column exactly.
fn duplicate_columns(columns: &[Column]) -> Vec<String> {
    let same = |a: &Column, b: &Column| {
        a.values()
            .iter()
            .map(Value::key)
            .eq(b.values().iter().map(Value::key))
    };
    columns
        .iter()
        .enumerate()
        .filter(|(i, column)| columns[..*i].iter().any(|earlier| same(earlier, column)))
        .map(|(_, column)| column.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use eda_dataset::{CsvOptions, Frame};
    use eda_types::ProblemType;

    use super::{profile, profile_classification, profile_clustering, profile_regression};
    use crate::AnalysisError;

    fn frame() -> Frame {
        let csv = "\
price,rooms,city,flag,copy,label
100,2,a,x,2,yes
200,,b,x,,no
100,2,a,x,2,yes
350,4,c,x,4,yes
";
        Frame::from_reader(csv.as_bytes(), &CsvOptions::default()).unwrap()
    }

    #[test]
    fn regression_profile_excludes_target_from_partitions() {
        let p = profile_regression(&frame(), "price").unwrap();
        assert_eq!(p.shape, (4, 6));
        assert_eq!(p.numeric_columns, vec!["rooms", "copy"]);
        assert_eq!(p.categorical_columns, vec!["city", "flag", "label"]);
        assert!(p.class_imbalance.is_none());
        assert!(p.categorical_cardinality.is_none());
        assert_eq!(p.missing_values["rooms"], 1);
        assert_eq!(p.dtypes["rooms"], "float64");
        assert_eq!(p.dtypes["price"], "int64");
    }

    #[test]
    fn classification_profile_counts_classes() {
        let p = profile_classification(&frame(), "label").unwrap();
        let classes = p.class_imbalance.unwrap();
        assert_eq!(classes["yes"], 3);
        assert_eq!(classes["no"], 1);
        let cardinality = p.categorical_cardinality.unwrap();
        assert_eq!(cardinality["city"], 3);
        assert!(!cardinality.contains_key("label"));
    }

    #[test]
    fn clustering_profile_allows_missing_target() {
        let p = profile_clustering(&frame(), None).unwrap();
        assert!(p.class_imbalance.is_none());
        assert_eq!(p.numeric_columns, vec!["price", "rooms", "copy"]);
        assert_eq!(p.categorical_cardinality.unwrap()["label"], 2);
    }

    #[test]
    fn structural_findings() {
        let p = profile_clustering(&frame(), None).unwrap();
        assert_eq!(p.duplicate_rows, vec![2]);
        assert_eq!(p.duplicate_columns, vec!["copy"]);
        assert_eq!(p.constant_columns, vec!["flag"]);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let err = profile_regression(&frame(), "nope").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownColumn(name) if name == "nope"));
    }

    #[test]
    fn dispatch_requires_target_for_supervised_problems() {
        let err = profile(&frame(), ProblemType::Classification, None).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingTarget("classification")));
        let p = profile(&frame(), ProblemType::Unknown, Some("label")).unwrap();
        assert!(!p.categorical_columns.contains(&"label".to_string()));
    }
}
