//! Command-line interface for ba2wcx

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ba2wcx")]
#[command(about = "ba2wcx - Bethesda BA2/BSA archives through the packer plugin protocol", long_about = None)]
pub struct Cli {
    /// Log protocol calls to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report whether an archive is recognized, by name and by signature
    Probe {
        /// Archive file
        archive: PathBuf,
    },

    /// List archive contents
    List {
        /// Archive file
        archive: PathBuf,
    },

    /// Extract archive contents
    Extract {
        /// Archive file
        archive: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Only extract entries whose path contains this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },
}
