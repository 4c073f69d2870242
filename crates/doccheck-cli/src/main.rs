//! doccheck CLI tool.
//!
//! Usage:
//! ```bash
//! doccheck check [OPTIONS] [PATH]
//! doccheck list-rules [--preset PRESET]
//! doccheck init [--force]
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Documentation compliance checker: verifies that project documents
/// contain the sections, keywords and code samples a checklist demands
#[derive(Parser)]
#[command(name = "doccheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run documentation checks
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific checks (comma-separated ids)
        #[arg(long)]
        rules: Option<String>,

        /// Exit non-zero when any outcome is at or above this status
        #[arg(long)]
        fail_on: Option<String>,
    },

    /// List built-in checks
    ListRules {
        /// Only list checks of this preset
        #[arg(long)]
        preset: Option<String>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-outcome compact format.
    Compact,
    /// Markdown table.
    Markdown,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            rules,
            fail_on,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            Ok(commands::check::run(&path, format, rules, fail_on, &source))
        }
        Commands::ListRules { preset } => {
            commands::list_rules::run(preset.as_deref()).map(|()| ExitCode::SUCCESS)
        }
        Commands::Init { force } => commands::init::run(force).map(|()| ExitCode::SUCCESS),
    }
}
