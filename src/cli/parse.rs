//! CLI parse: clap types for vellum. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vellum CLI - reconcile a local directory with a replicated file-set document
#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Tombstone-aware reconciliation between a replicated document and a local directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Mirror root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import files found on disk into the document
    Scan {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write the document back to disk
    Flush {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Scan, then flush
    Sync {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show document and ledger status
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the known-paths ledger
    Ledger {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write a document snapshot for a peer
    Export {
        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },
    /// Apply a peer snapshot, resolve conflicts, then flush
    Merge {
        /// Snapshot file produced by `export`
        #[arg(long)]
        input: PathBuf,
        /// Leave the disk alone; the next flush applies the merge
        #[arg(long)]
        no_flush: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Tombstone a path in the document; the next flush removes the file
    Rm {
        /// Entry path relative to the root
        path: String,
    },
}

impl Commands {
    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Scan { .. } => "scan",
            Commands::Flush { .. } => "flush",
            Commands::Sync { .. } => "sync",
            Commands::Status { .. } => "status",
            Commands::Ledger { .. } => "ledger",
            Commands::Export { .. } => "export",
            Commands::Merge { .. } => "merge",
            Commands::Rm { .. } => "rm",
        }
    }
}
