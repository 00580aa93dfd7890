//! CLI command definitions for the `chorus` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod characters;
pub mod config;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run a cast of characters against a queue of content.
#[derive(Parser)]
#[command(name = "chorus", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a content file through the configured characters.
    Run {
        /// JSON file holding an array of content items.
        #[arg(short, long)]
        content: PathBuf,

        /// Stop after this many content cycles.
        #[arg(long)]
        cycles: Option<usize>,

        /// Reply rounds to run on each new thread (overrides config).
        #[arg(long)]
        reply_rounds: Option<u32>,
    },

    /// List the registered characters.
    #[command(alias = "ls")]
    Characters,

    /// Print the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
