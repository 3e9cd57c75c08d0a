//! # shunter-transform
//!
//! Streaming multi-document YAML rewrites:
//! - [`stream`] — decode, validate and re-emit documents one at a time
//! - [`resolver`] — substitute container image references from an image map
//! - [`filter`] — make manifests ephemeral for integration tests

pub mod error;
pub mod filter;
pub mod resolver;
pub mod stream;

pub use error::TransformError;
pub use filter::replace_persistent_storage;
pub use resolver::resolve_images;
pub use stream::decode_all_docs;
