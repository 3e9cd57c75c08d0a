//! # shunter-core
//!
//! Leaf utilities shared by the shunter toolkit:
//! - [`exec`] — subprocess gateway with combined-output capture
//! - [`digest`] — SHA-256 file digests with `.digest` sidecar records
//! - [`commitmsg`] — target lists embedded in commit messages
//! - [`label`] — build-label to executable-path projection
//! - [`cancel`] — shared cancellation token

pub mod cancel;
pub mod commitmsg;
pub mod digest;
pub mod error;
pub mod exec;
pub mod label;

pub use cancel::CancelToken;
pub use error::CoreError;
