// src/cli.rs
//! CLI definitions for the assembler
//!
//! The command implementations live in `main.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assembler")]
#[command(version)]
#[command(about = "Build distribution archives from assembly descriptors", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every assembly of a build request
    Build {
        /// Path to the TOML build request
        request: PathBuf,

        /// Print attached artifacts as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered archive formats
    Formats,
}
