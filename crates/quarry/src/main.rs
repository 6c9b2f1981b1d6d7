// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quarry - plugin catalog synchronization engine.
//!
//! This is the binary entry point: it loads configuration, opens the SQLite
//! catalog and runs a single command.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quarry_config::QuarryConfig;
use tracing::error;

/// Quarry - plugin catalog synchronization engine.
#[derive(Parser, Debug)]
#[command(name = "quarry", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the default search path.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync the plugin catalog from the configured archive.
    Populate {
        /// Archive path or URL, overriding `catalog.archive_path`.
        #[arg(long, value_name = "PATH_OR_URL")]
        archive: Option<String>,
    },
    /// Print the stored manifest of a plugin as YAML.
    Lookup {
        /// Plugin name.
        name: String,
        #[arg(long, default_value = "plugin")]
        kind: String,
        #[arg(long = "type", default_value = "step")]
        plugin_type: String,
        #[arg(long, default_value = "")]
        version: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => quarry_config::load_and_validate_path(path),
        None => quarry_config::load_and_validate(),
    };
    let mut config: QuarryConfig = match loaded {
        Ok(config) => config,
        Err(errors) => {
            quarry_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command {
        Commands::Populate { archive } => {
            if archive.is_some() {
                config.catalog.archive_path = archive;
            }
            commands::populate(config).await
        }
        Commands::Lookup {
            name,
            kind,
            plugin_type,
            version,
        } => commands::lookup(config, &name, &kind, &plugin_type, &version).await,
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("quarry: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quarry={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
