// src/main.rs

mod cli;

use anyhow::{Context, Result};
use assembler::{ArchiverRegistry, AttachedArtifact, BuildRequest};
use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { request, json } => {
            info!("Reading build request {}", request.display());
            let request = BuildRequest::load(&request)
                .with_context(|| format!("Failed to load build request {}", request.display()))?;

            let mut attached: Vec<AttachedArtifact> = Vec::new();
            let result = assembler::processor::run(&request, &mut attached);

            // archives finished before a failure are still reported
            print_attached(&attached, json)?;
            result.context("Assembly failed")?;
            Ok(())
        }
        Commands::Formats => {
            for name in ArchiverRegistry::default().names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn print_attached(attached: &[AttachedArtifact], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(attached)?);
        return Ok(());
    }
    for artifact in attached {
        match &artifact.classifier {
            Some(classifier) => println!(
                "{} [{}, {}]",
                artifact.file.display(),
                artifact.format,
                classifier
            ),
            None => println!("{} [{}]", artifact.file.display(), artifact.format),
        }
    }
    Ok(())
}
