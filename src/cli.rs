use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dubforge")]
#[command(author, version, about = "Merge dubbed audio tracks into original-language releases")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for VO/ES episode pairs without processing them
    Search {
        /// Series name to filter by
        #[arg(long)]
        series: Option<String>,

        /// Season number to filter by
        #[arg(long)]
        season: Option<u32>,

        /// Search paths (defaults to the configured search paths)
        #[arg(long, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// Search for pairs and run the full pipeline on every match
    Process {
        /// Series name to filter by
        #[arg(long)]
        series: Option<String>,

        /// Season number to filter by
        #[arg(long)]
        season: Option<u32>,

        /// Search paths (defaults to the configured search paths)
        #[arg(long, num_args = 1..)]
        paths: Vec<PathBuf>,

        /// Destination directory for output files (default: next to the VO file)
        #[arg(long)]
        destination: Option<PathBuf>,
    },

    /// Merge one manually selected VO/ES pair (movie mode)
    Merge {
        /// Original version file
        #[arg(long)]
        vo: PathBuf,

        /// Dubbed version file
        #[arg(long)]
        es: PathBuf,

        /// Destination directory for the output file (default: next to the VO file)
        #[arg(long)]
        destination: Option<PathBuf>,
    },

    /// Print the normalized form of one or more filenames
    Normalize {
        /// Files to normalize
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Remux files into MKV containers without re-encoding
    Convert {
        /// Files to convert
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Display version information
    Version,
}
