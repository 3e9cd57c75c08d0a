//! Error types for shunter-transform.

use thiserror::Error;

/// All errors that can arise from manifest transformations.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The stream could not be decoded or re-encoded as YAML.
    #[error("decoding yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A document is not a mapping at the top level.
    #[error("document is not a mapping: {0}")]
    NotAMapping(String),

    /// A document lacks a non-empty `metadata.name`.
    #[error("missing metadata.name in object {0}")]
    MissingName(String),

    /// A document lacks a non-empty `kind`.
    #[error("missing kind in object {0}")]
    MissingKind(String),

    /// An `image` reference is still a `//`-prefixed build label.
    #[error("unresolved image found: {0}")]
    UnresolvedImage(String),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
