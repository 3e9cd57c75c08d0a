//! `shunter stamp` — single-brace stamping of a format string or file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args};

use shunter_stamp::{load_stamps, template};

/// Arguments for `shunter stamp`.
#[derive(Args, Debug)]
pub struct StampArgs {
    /// Path to a workspace status file (repeatable).
    #[arg(long = "stamp-info-file", action = ArgAction::Append)]
    pub stamp_info_file: Vec<String>,

    /// Output file path (stdout when omitted).
    #[arg(long = "output")]
    pub output: Option<PathBuf>,

    /// File containing stamp variable placeholders.
    #[arg(long = "format-file")]
    pub format_file: Option<PathBuf>,

    /// Format string containing stamp variables.
    #[arg(long = "format")]
    pub format: Option<String>,
}

impl StampArgs {
    pub fn run(self) -> Result<()> {
        let format = match (self.format, self.format_file) {
            (Some(_), Some(_)) => {
                bail!("only one of --format or --format-file may be specified")
            }
            (Some(format), None) => format,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("reading format file {}", path.display()))?,
            (None, None) => String::new(),
        };

        let stamps = load_stamps(&self.stamp_info_file).context("loading stamps")?;
        let result = template::expand_single_brace(&format, &stamps);

        match self.output {
            Some(path) => std::fs::write(&path, result)
                .with_context(|| format!("writing output {}", path.display())),
            None => std::io::stdout()
                .write_all(result.as_bytes())
                .context("writing to stdout"),
        }
    }
}
