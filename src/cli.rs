//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// quotalink - user-scoped short links with click quotas
#[derive(Parser, Debug)]
#[command(name = "quotalink")]
#[command(version)]
#[command(about = "User-scoped URL shortener with expiring, click-limited links", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Override the configured log level (e.g. "debug", "quotalink=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands; without one the interactive shell starts
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample config file
    GenerateConfig {
        /// Output file path
        #[arg(default_value = "config.toml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
