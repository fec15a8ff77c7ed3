//! Command-line interface for tidybox.
//!
//! Clap-based argument parsing and command dispatch.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
mod output;

pub use output::Output;

/// tidybox - content-addressed inbox sorting with duplicate quarantine
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet output (minimal)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Sort the inbox into the destination tree, quarantining duplicates
    Sort(commands::sort::SortArgs),
    /// Show resolved roots, documents, and platform capabilities
    Status,
    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write starter configuration and taxonomy/exclusion documents
    Init {
        /// Overwrite documents that already exist
        #[arg(long)]
        force: bool,
    },
    /// Validate configuration and referenced documents
    Validate,
    /// Show the merged configuration
    Show,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let output = Output::new(self.verbose, self.quiet);

        match self.command {
            Some(Commands::Sort(args)) => {
                commands::sort::execute(args, self.config.as_deref(), &output).await
            }
            Some(Commands::Status) => commands::status::execute(self.config.as_deref(), &output).await,
            Some(Commands::Config(cmd)) => {
                commands::config::execute(cmd, self.config.as_deref(), &output).await
            }
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}
