//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pomwright",
    version,
    about = "Resolve effective POM models and rewrite POMs with recipes",
    long_about = "pomwright resolves the effective configuration of multi-module Maven projects \
                  (inheritance, properties, dependency management, BOM imports) and applies \
                  recipe lists to the POMs until no recipe produces further change."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (defaults to ./pomwright.toml)
    #[arg(long, global = true, env = "POMWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only consult the local repository, never the network
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a recipe list to POM files
    Run {
        /// TOML file with `[[recipe]]` tables
        #[arg(short, long)]
        recipes: PathBuf,
        /// Override `[run] max-cycles`
        #[arg(long)]
        max_cycles: Option<usize>,
        /// Report changes without writing files
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// POM files forming the working set
        #[arg(required = true)]
        poms: Vec<PathBuf>,
    },

    /// Print the resolved properties and managed dependencies of a POM
    Effective {
        /// POM file
        pom: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
