//! # shunter-stamp
//!
//! Placeholder substitution for build metadata:
//! - [`template`] — tag scanning and expansion against a context map
//! - [`stamps`] — stamp-info file loading (`KEY VALUE` lines)
//! - [`engine`] — in-place file stamping and the full template engine with
//!   variables and imports

pub mod engine;
pub mod error;
pub mod stamps;
pub mod template;

pub use engine::{stamp_file, Engine};
pub use error::StampError;
pub use stamps::load_stamps;
pub use template::expand;
