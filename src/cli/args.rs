//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::config::ConfigArgs;
use crate::cli::commands::order::OrderArgs;
use crate::cli::commands::resolve::ResolveArgs;
use crate::cli::commands::segment::SegmentArgs;

#[derive(Parser, Debug)]
#[command(name = "pcfr")]
#[command(author, version)]
#[command(about = "Reconstruct connected pipe runs from loose piping component tables")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Settings file applied over the user and project config
    #[arg(long, short = 'c', global = true, env = "PCFR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a component document into a connected run
    Resolve(ResolveArgs),

    /// Print the proximity-sequenced order of a document
    Order(OrderArgs),

    /// Split over-length runs into equal pieces
    Segment(SegmentArgs),

    /// Show the effective settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for command results
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML for documents, a table for reports
    #[default]
    Auto,
    Yaml,
    Json,
    /// Human-readable table
    Table,
    /// Anomalies as CSV
    Csv,
    /// One refno per line
    Id,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Auto => "auto",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Id => "id",
        };
        write!(f, "{}", s)
    }
}
