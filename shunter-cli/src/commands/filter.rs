//! `shunter filter` — make manifests ephemeral for integration tests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use shunter_transform::replace_persistent_storage;

use super::resolve::{open_input, open_output};

/// Arguments for `shunter filter`.
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Input YAML file path (stdin when omitted).
    #[arg(long = "infile")]
    pub infile: Option<PathBuf>,

    /// Output YAML file path (stdout when omitted).
    #[arg(long = "outfile")]
    pub outfile: Option<PathBuf>,
}

impl FilterArgs {
    pub fn run(self) -> Result<()> {
        let input = open_input(self.infile.as_deref())?;
        let output = open_output(self.outfile.as_deref())?;

        replace_persistent_storage(input, output).context("manifest filter")
    }
}
