//! Resolve command - Print dependency batches
//!
//! Usage:
//!   nodegraph resolve graph.toml              # Numbered batches
//!   nodegraph resolve graph.toml --format json

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use nodegraph::resolver::{resolve_batches, sorted};
use nodegraph::GraphConfig;

use super::OutputFormat;
use crate::utils::terminal::{print_info, print_warning};

/// Resolve the dependency table of a graph description
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Graph description file (TOML)
    pub file: PathBuf,

    /// Output format: text, json
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ResolveCommand {
    /// Execute the resolve command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let config = GraphConfig::load_from_path(&self.file)?;
        if config.dependencies.is_empty() {
            print_warning(&format!("No [dependencies] table in {}", self.file.display()));
        }

        let batches = sorted(resolve_batches(config.dependencies)?);

        if verbose {
            let keys: usize = batches.iter().map(Vec::len).sum();
            print_info(&format!("{} key(s) in {} batch(es)", keys, batches.len()));
        }

        match self.format {
            OutputFormat::Text => {
                for (i, batch) in batches.iter().enumerate() {
                    println!("{} {}", style(format!("batch {}:", i)).bold(), batch.join(", "));
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&batches)?);
            }
        }

        Ok(())
    }
}
