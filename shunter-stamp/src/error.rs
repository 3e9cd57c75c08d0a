//! Error types for shunter-stamp.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from stamping and template expansion.
#[derive(Debug, Error)]
pub enum StampError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `NAME=VALUE` variable flag without an `=`.
    #[error("variable must be NAME=VALUE, got {0}")]
    MalformedVariable(String),

    /// A `NAME=filename` import flag without an `=`.
    #[error("import must be NAME=filename, got {0}")]
    MalformedImport(String),
}

/// Convenience constructor for [`StampError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StampError {
    StampError::Io {
        path: path.into(),
        source,
    }
}
