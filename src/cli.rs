//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{resolve::ResolveCommand, tree::TreeCommand};

/// nodegraph - node trees and dependency batches
///
/// Reads TOML graph descriptions and prints resolved dependency batches or
/// composite node trees.
#[derive(Parser, Debug)]
#[command(name = "nodegraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the [dependencies] table into ordered batches
    Resolve(ResolveCommand),

    /// Build and list the [[nodes]] tree
    Tree(TreeCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Set up terminal colors
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        self.init_logging();

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(self.verbose),
            Commands::Tree(cmd) => cmd.execute(self.verbose),
        }
    }

    /// Log to stderr; RUST_LOG overrides the level picked by --verbose
    fn init_logging(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        // A subscriber may already be installed when embedded in tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(!self.no_color)
            .with_target(false)
            .try_init();
    }
}
