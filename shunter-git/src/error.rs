//! Error types for shunter-git.

use std::path::PathBuf;

use thiserror::Error;

use shunter_core::CoreError;

/// All errors that can arise from local repository operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// An underlying git invocation failed.
    #[error("git error: {0}")]
    Tool(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`GitError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}

/// All errors that can arise from pull-request providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required credential or identifier is missing or invalid.
    #[error("{context}: {field} must be set")]
    Config {
        context: &'static str,
        field: &'static str,
    },

    /// The HTTP request itself failed (connect, timeout, body decode).
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The platform answered with a status the driver does not accept.
    #[error("{context}: unexpected status {status}")]
    UnexpectedStatus { context: &'static str, status: u16 },

    /// The run was cancelled before the request was sent.
    #[error("pull request creation cancelled")]
    Cancelled,
}
