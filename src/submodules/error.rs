use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input deck error: {0}")]
    Deck(String),

    #[error("Failed to launch solver `{program}`: {source}")]
    SolverSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No converged data for field `{field}`")]
    NoData { field: String },

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("Two scan points map to case directory `{0}`")]
    DuplicateCase(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Attaches the offending path to an `std::io::Error`.
pub trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> ScanResult<T>;
}

impl<T> IoContext<T> for Result<T, std::io::Error> {
    fn at(self, path: impl Into<PathBuf>) -> ScanResult<T> {
        self.map_err(|source| ScanError::Io { path: path.into(), source })
    }
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>> for ScanError {
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ScanError::Plot(err.to_string())
    }
}
