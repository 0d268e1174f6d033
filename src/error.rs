//! Error types for every pipeline stage
//!
//! Each stage owns its own error enum so it can be tested in isolation;
//! [`PipelineError`] wraps them for the end-to-end run. Nothing here is
//! retried: every failure is reported once and the run stops without
//! writing output.

use std::path::PathBuf;
use thiserror::Error;

/// Failure loading the reference dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset row at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("dataset {0} contains no records")]
    Empty(PathBuf),
}

/// Failure retrieving the live page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cannot read fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The live page no longer has the shape the extraction strategy expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeLayoutError {
    #[error("no table with class `{0}` found in page")]
    MissingTable(String),

    #[error("table has no {kind} cell at index {index} (found {found})")]
    MissingCell {
        kind: &'static str,
        index: usize,
        found: usize,
    },

    #[error("no header cell matching `{label}`")]
    MissingColumn { label: String },

    #[error("no data row follows the header row")]
    MissingRow,

    #[error("{field} cell `{text}` is not a whole number")]
    NotNumeric { field: &'static str, text: String },
}

/// A derived metric that cannot be computed for a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("mortality undefined for `{name}`: zero cases")]
    UndefinedMortality { name: String },
}

/// Failure reading or validating the TOML config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Any failure of an end-to-end run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Layout(#[from] ScrapeLayoutError),

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error("cannot write report {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode JSON output: {0}")]
    Encode(#[from] serde_json::Error),
}
