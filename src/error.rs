use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("required column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
}

/// Conditions that shrink the report without aborting the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisWarning {
    #[error("no valid sale dates found for temporal analysis")]
    NoDatedRecords,

    #[error("no positive sale prices found for pricing analysis")]
    NoSalePrices,

    #[error("no coordinates available for the top owners; geographic chart skipped")]
    NoGeodata,
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error(transparent)]
    Skipped(#[from] AnalysisWarning),
}

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized sale date '{0}'")]
pub struct DateParseError(pub String);
