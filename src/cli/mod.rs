//! CLI module
//!
//! - `serve`: run the form server
//! - `check-config`: load and report configuration without serving

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// Form handling server with environment-sourced secrets
#[derive(Parser)]
#[command(name = "formguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(serve::ServeArgs),

    /// Validate configuration and print a redacted summary
    CheckConfig,
}
