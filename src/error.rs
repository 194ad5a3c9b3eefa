use std::path::PathBuf;

use thiserror::Error;

/// Failures returned by the prediction service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("invalid value for {field}: {value:?} is not a valid number")]
    InvalidInput { field: &'static str, value: String },

    #[error("invalid value for {field}: {value} is not 0 or 1")]
    InvalidFlag { field: &'static str, value: u8 },

    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl PredictError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PredictError::InvalidInput { field, .. } | PredictError::InvalidFlag { field, .. } => {
                Some(field)
            }
            PredictError::Prediction(_) => None,
        }
    }
}

/// Persisted preprocessor/model could not be loaded.
#[derive(Error, Debug)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt artifact {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },

    #[error("artifacts do not match: {0}")]
    Mismatch(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid hyperparameter: {0}")]
    InvalidParams(String),

    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("feature matrix has {rows} rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("feature width mismatch: model expects {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("tree {0} has no nodes")]
    EmptyTree(usize),

    #[error("tree {tree}, node {node}: {reason}")]
    InvalidNode {
        tree: usize,
        node: usize,
        reason: &'static str,
    },
}

/// A preprocessor state that cannot be used to transform records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessorError {
    #[error("unexpected {kind} columns {found:?}")]
    Columns {
        kind: &'static str,
        found: Vec<String>,
    },

    #[error("invalid statistics for {0}")]
    Statistics(String),

    #[error("vocabulary for {0} is not sorted")]
    UnsortedVocabulary(String),
}

/// Why an artifact could not be encoded or decoded.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("invalid envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("expected kind {expected:?}, found {found:?}")]
    WrongKind {
        expected: &'static str,
        found: String,
    },

    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error(transparent)]
    Preprocessor(#[from] PreprocessorError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("dataset is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("malformed row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}
