//! CLI module for surfr - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
