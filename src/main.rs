//! nodegraph CLI - inspect graph description files
//!
//! ```text
//! graph.toml → config::GraphConfig → resolver / Tree → text or JSON
//! ```

mod cli;
mod commands;
mod utils;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            utils::terminal::report(&err);
            ExitCode::FAILURE
        }
    }
}
