//! Error types for shunter-train.

use thiserror::Error;

use shunter_core::CoreError;
use shunter_git::{GitError, ProviderError};
use shunter_stamp::StampError;

/// All errors that can arise from a train run. Each variant carries the
/// pipeline step it happened in, so failures read as
/// `running gitops pr creation: <step>: <cause>`.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The build-tool query subprocess failed; its stderr is preserved.
    #[error("running build query: {stderr}")]
    Query { stderr: String },

    /// The query tool answered with a payload the schema does not match.
    #[error("parsing build query output: {0}")]
    Parse(#[from] serde_json::Error),

    /// Cloning or driving the manifest repository failed.
    #[error("{step}: {source}")]
    Repo {
        step: &'static str,
        #[source]
        source: GitError,
    },

    /// Stamping a changed file failed.
    #[error("stamping changed files: {file}: {source}")]
    Stamp {
        file: String,
        #[source]
        source: StampError,
    },

    /// Verifying or saving a digest sidecar failed.
    #[error("stamping changed files: {file}: {source}")]
    Digest {
        file: String,
        #[source]
        source: CoreError,
    },

    /// An image push target failed.
    #[error("push {target}: {source}")]
    Push {
        target: String,
        #[source]
        source: CoreError,
    },

    /// One or more image pushes failed; the first failure is attached.
    #[error("pushing images: {count} errors, first: {first}")]
    PushFailures {
        count: usize,
        #[source]
        first: Box<TrainError>,
    },

    /// Creating a pull request failed.
    #[error("create PR for {branch}: {source}")]
    CreatePr {
        branch: String,
        #[source]
        source: ProviderError,
    },

    /// The run was cancelled.
    #[error("run cancelled")]
    Cancelled,
}

/// Tag a [`GitError`] with the pipeline step it happened in.
pub(crate) fn repo_err(step: &'static str) -> impl FnOnce(GitError) -> TrainError {
    move |source| TrainError::Repo { step, source }
}
