// error.rs - Fatal error taxonomy

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a run before any contact state is written.
///
/// Per-row problems (missing required fields, non-approved rows) are not
/// represented here: they are isolated, logged, and counted in the run
/// summary while the batch continues.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("could not identify event from filename '{filename}': {reason}")]
    UnknownEvent { filename: String, reason: String },

    #[error("failed to load contact history from '{path}': {reason}")]
    HistoryLoad { path: String, reason: String },

    #[error("failed to read CSV '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Attach file context to an I/O error.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ConvertError::Io {
            context: context.into(),
            source,
        }
    }
}
