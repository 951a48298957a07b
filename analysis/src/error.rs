use eda_dataset::DatasetError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("target column `{0}` is not in the dataset")]
    UnknownColumn(String),
    #[error("a {0} profile needs a target column")]
    MissingTarget(&'static str),
    #[error("regression target `{0}` is not numeric")]
    NonNumericTarget(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
