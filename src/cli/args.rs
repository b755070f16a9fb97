//! CLI argument definitions using clap
//!
//! Commands:
//! - rfcgate serve --config <path> [--port <port>]
//! - rfcgate validate --config <path> --function <name>
//! - rfcgate schema --config <path> --function <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rfcgate - metadata-driven REST gateway for remote function calls
#[derive(Parser, Debug)]
#[command(name = "rfcgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./rfcgate.json")]
        config: PathBuf,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate request parameters read from stdin and print the marshaled
    /// call structures
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./rfcgate.json")]
        config: PathBuf,

        /// Remote function name
        #[arg(long)]
        function: String,
    },

    /// Print the parsed metadata of a function
    Schema {
        /// Path to configuration file
        #[arg(long, default_value = "./rfcgate.json")]
        config: PathBuf,

        /// Remote function name
        #[arg(long)]
        function: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
