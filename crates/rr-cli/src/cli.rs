//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Race results calculator.
///
/// Reads a race definition, its entries and its timing feeds, and prints
/// results, leg standings and prize winners.
#[derive(Debug, Parser)]
#[command(name = "rr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file with defaults for every race.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print overall results for one or more races.
    Results {
        /// Race definition files.
        #[arg(required = true)]
        races: Vec<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Also print recovery and consistency notes.
        #[arg(long)]
        notes: bool,
    },

    /// Print prize winners.
    Prizes {
        /// Race definition file.
        race: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print standings for each leg.
    Legs {
        /// Race definition file.
        race: PathBuf,

        /// Only this leg (1-based).
        #[arg(long)]
        leg: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate a race and its data without printing results.
    Check {
        /// Race definition file.
        race: PathBuf,
    },
}
