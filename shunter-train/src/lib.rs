//! # shunter-train
//!
//! The deployment-train orchestrator: queries the build system for
//! deployment targets, groups them by train, reconciles each train onto a
//! branch of the manifest repository, pushes images under a bounded worker
//! pool, and opens pull requests.
//!
//! - [`config`] — the run configuration record
//! - [`bazel`] — build-query client and query builders
//! - [`trains`] — grouping, retraction detection, target collection
//! - [`runner`] — the end-to-end pipeline ([`runner::run`])

pub mod bazel;
pub mod config;
pub mod error;
pub mod runner;
pub mod trains;

pub use config::Config;
pub use error::TrainError;
pub use runner::run;
