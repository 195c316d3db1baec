//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod resolve;
pub mod tree;

use clap::ValueEnum;

/// Output format shared by all commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Text format (default)
    #[default]
    Text,
    /// JSON format
    Json,
}
