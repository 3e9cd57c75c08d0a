//! shunter — GitOps release automation CLI.
//!
//! # Usage
//!
//! ```text
//! shunter create-prs --workspace <dir> --target <pattern> --git_repo <url> ...
//! shunter resolve [--infile <f>] [--outfile <f>] --image name=reference ...
//! shunter filter [--infile <f>] [--outfile <f>]
//! shunter expand [--template <f>] [--output <f>] [--variable NAME=VALUE] ...
//! shunter stamp [--format <s> | --format-file <f>] [--stamp-info-file <f>] ...
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    create_prs::CreatePrsArgs, expand::ExpandArgs, filter::FilterArgs, resolve::ResolveArgs,
    stamp::StampArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "shunter",
    version,
    about = "Turn build-system deployment targets into manifest commits and pull requests",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile deployment trains onto branches and open pull requests.
    CreatePrs(CreatePrsArgs),

    /// Substitute container image references in a manifest stream.
    Resolve(ResolveArgs),

    /// Make a manifest stream ephemeral for integration tests.
    Filter(FilterArgs),

    /// Expand a template with stamp files, variables and imports.
    Expand(ExpandArgs),

    /// Substitute {VAR} placeholders from stamp info files.
    Stamp(StampArgs),
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::CreatePrs(args) => args.run(),
        Commands::Resolve(args) => args.run(),
        Commands::Filter(args) => args.run(),
        Commands::Expand(args) => args.run(),
        Commands::Stamp(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
