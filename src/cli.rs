//! CLI argument parsing for the diagnostic tool

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "xr-extension-mask")]
#[command(version)]
#[command(about = "Inspect the OpenXR extension-masking shim configuration", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a configuration file and report what the shim would do
    Check {
        /// Shim configuration file (the runtime is resolved next to it)
        config: PathBuf,

        /// Fail if any line of the file was skipped
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Load the chained runtime through the shim and list its extensions
    List {
        /// Shim configuration file (the runtime is resolved next to it)
        config: PathBuf,

        /// Output format
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
