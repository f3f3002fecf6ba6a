use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Book side of a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ask,
    Bid,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => f.write_str("ask"),
            Side::Bid => f.write_str("bid"),
        }
    }
}

/// Errors from quantities derived from a depth payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepthError {
    #[error("{0} side of the depth has no price level")]
    EmptySide(Side),
}

/// Source-level failures. Any of these aborts the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no directory for data provided")]
    MissingDirectory,

    #[error("no file name for data provided")]
    MissingFileName,

    #[error("no csv file for data provided: {0}")]
    NotCsv(String),

    #[error("file name does not match depth_<exchange>_<base>_<quote>[_<date>].csv: {0}")]
    InvalidFileName(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read csv {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("csv header of {path:?} lacks column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// Why a single record was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordErrorKind {
    #[error("malformed field '{field}': {reason}")]
    MalformedRecord { field: &'static str, reason: String },

    #[error("unparsable price ladder '{field}': {reason}")]
    PayloadShape { field: &'static str, reason: String },
}

/// A record-level failure. The load continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct RecordError {
    /// One-based line in the source, header included.
    pub line: u64,
    pub kind: RecordErrorKind,
}
