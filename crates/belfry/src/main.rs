// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Belfry - notification aggregation and delivery engine.
//!
//! This is the binary entry point: scenario replay through a real
//! engine, plus configuration inspection.

mod replay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Belfry - notification aggregation and delivery engine.
#[derive(Parser, Debug)]
#[command(name = "belfry", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the XDG hierarchy.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scripted scenario file through the engine.
    Replay {
        /// Path to the scenario TOML file.
        scenario: PathBuf,
        /// Emit JSON lines instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
    /// Manage Belfry configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged effective configuration as TOML.
    Show,
    /// Validate the configuration and exit nonzero on errors.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => belfry_config::load_and_validate_path(path),
        None => belfry_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            belfry_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    match cli.command {
        Some(Commands::Replay { scenario, json }) => {
            if let Err(e) = replay::run_replay(&config, &scenario, json).await {
                eprintln!("belfry replay: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => match toml::to_string_pretty(&config) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("belfry config: {e}");
                    std::process::exit(1);
                }
            },
            // Validation already ran above; reaching this point is the answer.
            ConfigAction::Check => println!("configuration ok"),
        },
        None => {
            println!("belfry: use --help for available commands");
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("belfry={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config =
            belfry_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.engine.coalesce_delay_ms, 1_000);
        assert_eq!(config.throttle.max_alerts_per_window, 2);
    }
}
