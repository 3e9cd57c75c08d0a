//! `shunter resolve` — substitute container image references.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};

use shunter_transform::resolve_images;

/// Arguments for `shunter resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Input YAML file path (stdin when omitted).
    #[arg(long = "infile")]
    pub infile: Option<PathBuf>,

    /// Output YAML file path (stdout when omitted).
    #[arg(long = "outfile")]
    pub outfile: Option<PathBuf>,

    /// Image mapping as imagename=imagevalue (repeatable).
    #[arg(long = "image", action = ArgAction::Append, value_parser = parse_image)]
    pub image: Vec<(String, String)>,
}

fn parse_image(value: &str) -> std::result::Result<(String, String), String> {
    let Some((name, reference)) = value.split_once('=') else {
        return Err("image flag must be imagename=imagevalue".to_string());
    };
    Ok((name.trim().to_string(), reference.trim().to_string()))
}

impl ResolveArgs {
    pub fn run(self) -> Result<()> {
        let images: HashMap<String, String> = self.image.into_iter().collect();

        let input = open_input(self.infile.as_deref())?;
        let output = open_output(self.outfile.as_deref())?;

        resolve_images(input, output, &images).context("resolver")
    }
}

pub(crate) fn open_input(path: Option<&std::path::Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(std::io::stdin())),
    }
}

pub(crate) fn open_output(path: Option<&std::path::Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}
