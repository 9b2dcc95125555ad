//! CLI argument definitions
//!
//! Defines the command-line interface using clap's derive API.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gasto")]
#[command(about = "Detect recurring subscriptions in bank statements", version)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a statement file and print the detected subscriptions
    Analyze {
        /// Path to a text file containing the statement
        #[arg(short, long)]
        file: PathBuf,

        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the configured AI providers and check their availability
    Providers,

    /// Print the built-in demo report
    Demo {
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000", env = "GASTO_PORT")]
        port: u16,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1", env = "GASTO_HOST")]
        host: String,

        /// Directory of static frontend files to serve
        #[arg(long, env = "GASTO_STATIC_DIR")]
        static_dir: Option<PathBuf>,
    },
}
