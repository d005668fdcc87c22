//! CLI command definitions using clap.
//!
//! - check: locate and validate the configuration
//! - list: resolve every declared tool
//! - call: resolve, then invoke one tool with JSON arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kgentik - resolve declared agent tools from local files and registries
#[derive(Parser, Debug)]
#[command(name = "kgentik")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Explicit kgentik.yaml path (default: search upward from the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (default: list)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Locate and validate the configuration without resolving tools
    Check,

    /// Resolve all declared tools and print them in order
    List {
        /// Attempt every declaration and report all failures
        #[arg(long)]
        collect_all: bool,

        /// Print function-calling schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve tools and invoke one of them
    Call {
        /// Tool name as declared in the configuration
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}
