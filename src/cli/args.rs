//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repowatch - Inspect cached repository status and buffer diffs
#[derive(Parser, Debug)]
#[command(name = "repowatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if repowatch was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the repository root (metadata directory) containing a path
    Root {
        /// Any path inside the repository (defaults to the working directory)
        path: Option<PathBuf>,
    },

    /// List added and modified paths of the work tree
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show changed line ranges of a file against HEAD
    Lines {
        /// File to compare; its current content is the buffer
        file: PathBuf,

        /// Output as JSON (0-based half-open ranges)
        #[arg(long)]
        json: bool,
    },

    /// Print the diff hunk touching a line of a file
    Hunk {
        /// File to compare; its current content is the buffer
        file: PathBuf,

        /// Line number (1-based)
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        line: u64,
    },

    /// Print status each time the metadata directory changes
    Watch {
        /// Stop after this many status reports
        #[arg(long)]
        count: Option<usize>,

        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },
}
