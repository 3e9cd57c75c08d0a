//! Stamp-info file loading.
//!
//! A stamp-info file is the build system's workspace-status output: one
//! `KEY VALUE` pair per line, delimited by the first ASCII space. Lines
//! without a space are skipped.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{io_err, StampError};

/// Read all `files` and merge them into one map. Later files override
/// earlier ones on conflicting keys.
pub fn load_stamps<P: AsRef<Path>>(files: &[P]) -> Result<HashMap<String, String>, StampError> {
    let mut stamps = HashMap::new();

    for file in files {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file).map_err(|err| io_err(file, err))?;

        for line in content.split('\n') {
            if let Some((key, value)) = line.split_once(' ') {
                stamps.insert(key.to_string(), value.to_string());
            }
        }
    }

    Ok(stamps)
}
