//! In-place file stamping and the full template engine.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{io_err, StampError};
use crate::stamps::load_stamps;
use crate::template::{expand, expand_single_brace, DEFAULT_END_TAG, DEFAULT_START_TAG};

// ---------------------------------------------------------------------------
// In-place stamping
// ---------------------------------------------------------------------------

/// Replace `{{VAR}}` placeholders in the file at `path` using `ctx`,
/// writing the result back in place with mode `0644`.
pub fn stamp_file(path: &Path, ctx: &HashMap<String, String>) -> Result<(), StampError> {
    let content = std::fs::read_to_string(path).map_err(|err| io_err(path, err))?;
    let stamped = expand(&content, DEFAULT_START_TAG, DEFAULT_END_TAG, ctx);
    write_file(path, stamped.as_bytes(), 0o644).map_err(|err| io_err(path, err))
}

// ---------------------------------------------------------------------------
// Template engine
// ---------------------------------------------------------------------------

/// Expands templates using stamp-info files, explicit variables, and
/// imported fragments.
///
/// Processing order:
/// 1. Load stamp files into a stamp map (later files override earlier).
/// 2. Seed the context with the stamps.
/// 3. For each variable `NAME=VALUE`, expand VALUE against the stamps with
///    single-brace tags, then store under both `NAME` and
///    `variables.NAME`.
/// 4. For each import `NAME=path`, read the file, expand it against the
///    context with the configured tags, expand again against the stamps
///    with single-brace tags, and store under `imports.NAME`.
/// 5. Expand the main template against the final context.
#[derive(Debug, Default)]
pub struct Engine {
    /// Start tag for template placeholders; empty means `{{`.
    pub start_tag: String,
    /// End tag for template placeholders; empty means `}}`.
    pub end_tag: String,
    /// Stamp-info file paths, merged in order.
    pub stamp_info_files: Vec<String>,
}

impl Engine {
    /// Read the template at `tpl_path` (stdin when `None`), substitute
    /// variables, and write the result to `out_path` (stdout when `None`).
    ///
    /// The output file receives mode `0777` when `executable` is set,
    /// `0666` otherwise.
    pub fn expand(
        &self,
        tpl_path: Option<&Path>,
        out_path: Option<&Path>,
        vars: &[String],
        imports: &[String],
        executable: bool,
    ) -> Result<(), StampError> {
        let stamps = load_stamps(&self.stamp_info_files)?;

        // Stamps form the base context; variables and imports override.
        let mut ctx = stamps.clone();
        self.resolve_vars(vars, &stamps, &mut ctx)?;
        self.resolve_imports(imports, &stamps, &mut ctx)?;

        let template = read_template(tpl_path)?;

        let (start_tag, end_tag) = self.tags();
        let result = expand(&template, start_tag, end_tag, &ctx);

        match out_path {
            Some(path) => {
                let mode = if executable { 0o777 } else { 0o666 };
                write_file(path, result.as_bytes(), mode).map_err(|err| io_err(path, err))
            }
            None => std::io::stdout()
                .write_all(result.as_bytes())
                .map_err(|err| io_err("stdout", err)),
        }
    }

    fn tags(&self) -> (&str, &str) {
        let start = if self.start_tag.is_empty() {
            DEFAULT_START_TAG
        } else {
            &self.start_tag
        };
        let end = if self.end_tag.is_empty() {
            DEFAULT_END_TAG
        } else {
            &self.end_tag
        };
        (start, end)
    }

    fn resolve_vars(
        &self,
        vars: &[String],
        stamps: &HashMap<String, String>,
        ctx: &mut HashMap<String, String>,
    ) -> Result<(), StampError> {
        for var in vars {
            let Some((name, value)) = var.split_once('=') else {
                return Err(StampError::MalformedVariable(var.clone()));
            };

            let value = expand_single_brace(value, stamps);
            ctx.insert(name.to_string(), value.clone());
            ctx.insert(format!("variables.{name}"), value);
        }
        Ok(())
    }

    fn resolve_imports(
        &self,
        imports: &[String],
        stamps: &HashMap<String, String>,
        ctx: &mut HashMap<String, String>,
    ) -> Result<(), StampError> {
        let (start_tag, end_tag) = self.tags();

        for import in imports {
            let Some((name, file)) = import.split_once('=') else {
                return Err(StampError::MalformedImport(import.clone()));
            };

            let content = std::fs::read_to_string(file).map_err(|err| io_err(file, err))?;

            // First pass against the context with the configured tags,
            // second pass against the stamps with single-brace tags.
            let value = expand(&content, start_tag, end_tag, ctx);
            let value = expand_single_brace(&value, stamps);
            ctx.insert(format!("imports.{name}"), value);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn read_template(tpl_path: Option<&Path>) -> Result<String, StampError> {
    match tpl_path {
        Some(path) => std::fs::read_to_string(path).map_err(|err| io_err(path, err)),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|err| io_err("stdin", err))?;
            Ok(content)
        }
    }
}

#[cfg(unix)]
fn write_file(path: &Path, contents: &[u8], mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_file(path: &Path, contents: &[u8], _mode: u32) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
