//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the search path
//! - `--store <dir>`: Override the store data directory
//! - `--namespace <name>`: Override the store namespace
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// seqgen - persistent monotonic sequence generators
#[derive(Parser, Debug)]
#[command(name = "seqgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store data directory (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Store namespace (overrides config)
    #[arg(long, global = true, value_name = "NAME")]
    pub namespace: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the next value(s) of a sequence
    #[command(after_help = "\
EXAMPLES:
    # Next value of the default sequence
    seqgen next

    # Five values from sequence 3
    seqgen next 3 -n 5")]
    Next {
        /// Sequence id (default sequence when omitted)
        #[arg(allow_negative_numbers = true)]
        id: Option<i64>,

        /// How many values to draw
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Do not write the advanced value back on exit
        #[arg(long)]
        no_persist: bool,
    },

    /// Print the current value of a sequence without advancing it
    Current {
        /// Sequence id (default sequence when omitted)
        #[arg(allow_negative_numbers = true)]
        id: Option<i64>,
    },

    /// Create a new sequence and print its id
    Create {
        /// First value the sequence will hand out
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        initial: i64,

        /// Do not write the new sequence to the store on exit
        #[arg(long)]
        no_persist: bool,
    },

    /// Write a sequence's current value to the store now
    Persist {
        /// Sequence id
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the config file path in use (or the canonical one)
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
