//! CLI command definitions using clap.
//!
//! - run: run one task in a browser
//! - actions: list the actions the model can request

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Surfr - an LLM-driven browser agent
#[derive(Parser, Debug)]
#[command(name = "surfr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a task in the browser
    Run {
        /// What the agent should do, in plain language
        task: String,

        /// Maximum action-dispatching passes (overrides config)
        #[arg(short, long)]
        max_attempts: Option<u32>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// File whose contents replace the built-in instructions
        #[arg(short, long)]
        instructions: Option<PathBuf>,

        /// Write the markdown transcript here instead of the transcript dir
        #[arg(short, long)]
        transcript: Option<PathBuf>,
    },

    /// List the actions available to the model
    Actions,
}
