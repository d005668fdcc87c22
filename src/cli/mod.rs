//! CLI module for kgentik - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
