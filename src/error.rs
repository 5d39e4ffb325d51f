use std::path::PathBuf;

use thiserror::Error;

/// Fitting a binary boundary needs documents from both label classes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not enough data to fit a classifier: {documents} labeled document(s), {classes} distinct label class(es)")]
pub struct DataInsufficientError {
    pub documents: usize,
    pub classes: usize,
}

/// Errors that abort the analysis of a file (or the whole run).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unexpected layout in {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("failed to initialize the morphological analyzer with dictionary {dictionary}: {reason}")]
    TokenizerInit { dictionary: PathBuf, reason: String },

    #[error("failed to load polarity lexicon {path}: {reason}")]
    Lexicon { path: PathBuf, reason: String },

    #[error("term matrix has {rows} row(s) but {labels} label(s) were given")]
    DimensionMismatch { rows: usize, labels: usize },

    #[error("output name {stem:?} for {path} is already used by another input of this run")]
    OutputCollision { path: PathBuf, stem: String },

    #[error("invalid solver parameter {name} = {value}: must be finite and positive")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("logistic regression produced a non-finite loss or gradient after {iterations} iteration(s)")]
    SolverDiverged { iterations: usize },

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    DataInsufficient(#[from] DataInsufficientError),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        AnalysisError::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Why a single field of a record could not be read. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} is missing")]
    Missing { field: &'static str },
    #[error("{field} is not a valid number: {value:?}")]
    Invalid { field: &'static str, value: String },
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
