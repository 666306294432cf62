// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minerva - a retrieval-augmented question-answering service.
//!
//! Binary entry point: loads layered configuration, initialises tracing,
//! and starts the gateway.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod serve;

/// Minerva - a retrieval-augmented question-answering service.
#[derive(Parser, Debug)]
#[command(name = "minerva", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Minerva gateway server.
    Serve {
        /// Explicit config file path (defaults to the XDG hierarchy).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = match config {
                Some(path) => minerva_config::load_config_from_path(&path),
                None => minerva_config::load_config(),
            };
            let config = match config {
                Ok(config) => config,
                Err(e) => {
                    error!("configuration error: {e}");
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = serve::serve(config).await {
                error!("server error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}
