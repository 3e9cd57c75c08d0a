//! `shunter expand` — template expansion with stamps, variables and
//! imports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};

use shunter_stamp::Engine;

/// Arguments for `shunter expand`.
#[derive(Args, Debug)]
pub struct ExpandArgs {
    /// Stamp info file path (repeatable).
    #[arg(long = "stamp_info_file", action = ArgAction::Append)]
    pub stamp_info_file: Vec<String>,

    /// Variable in NAME=VALUE format (repeatable).
    #[arg(long = "variable", action = ArgAction::Append)]
    pub variable: Vec<String>,

    /// Import in NAME=filename format (repeatable).
    #[arg(long = "imports", action = ArgAction::Append)]
    pub imports: Vec<String>,

    /// Output file path (stdout when omitted).
    #[arg(long = "output")]
    pub output: Option<PathBuf>,

    /// Input template file path (stdin when omitted).
    #[arg(long = "template")]
    pub template: Option<PathBuf>,

    /// Set the executable bit on the output file.
    #[arg(long = "executable")]
    pub executable: bool,

    /// Start tag for template placeholders.
    #[arg(long = "start_tag", default_value = "{{")]
    pub start_tag: String,

    /// End tag for template placeholders.
    #[arg(long = "end_tag", default_value = "}}")]
    pub end_tag: String,
}

impl ExpandArgs {
    pub fn run(self) -> Result<()> {
        let engine = Engine {
            start_tag: self.start_tag,
            end_tag: self.end_tag,
            stamp_info_files: self.stamp_info_file,
        };

        engine
            .expand(
                self.template.as_deref(),
                self.output.as_deref(),
                &self.variable,
                &self.imports,
                self.executable,
            )
            .context("expanding template")
    }
}
