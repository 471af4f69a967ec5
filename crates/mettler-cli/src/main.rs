//! Command-line entry point for the Mettler balance driver.
//!
//! A diagnostic front end over the same controller a host would load:
//!
//! ```bash
//! mettler list
//! mettler read                  # every configured balance
//! mettler read "Mettler COM6"   # one balance
//! mettler identify              # model and serial number as JSON
//! mettler --config balances.toml --log-level debug read
//! ```
//!
//! Without `--config` the built-in document (one balance on `COM6`) is used.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mettler_core::PluginConfig;
use mettler_hardware::PluginController;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mettler")]
#[command(about = "Read Mettler-Toledo AG balances over serial", long_about = None)]
#[command(version)]
struct Cli {
    /// Plugin configuration file (JSON or TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `mettler_hardware=debug`.
    /// Overrides RUST_LOG when given.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured balances
    List,

    /// Read weight in grams
    Read {
        /// Balance to read; all balances when omitted
        name: Option<String>,
    },

    /// Query model and serial number of every balance
    Identify,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<PluginConfig> {
    match path {
        Some(path) => PluginConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => {
            debug!("No configuration given, using built-in document");
            Ok(PluginConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = load_config(cli.config.as_ref())?;
    let controller =
        PluginController::from_config(&config).context("invalid balance configuration")?;

    match cli.command {
        Commands::List => {
            for name in controller.list_sources() {
                println!("{name}");
            }
        }
        Commands::Read { name: Some(name) } => {
            let grams = controller.read_source(&name).await?;
            println!("{name}: {grams} g");
        }
        Commands::Read { name: None } => {
            let results = controller.read_all().await;
            let total = results.len();
            let mut failed = 0;

            for (name, reading) in results {
                match reading {
                    Ok(grams) => println!("{name}: {grams} g"),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{name}: {e}");
                    }
                }
            }

            if failed > 0 {
                bail!("{failed} of {total} balances could not be read");
            }
        }
        Commands::Identify => {
            let infos = controller.describe_all().await;
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
    }

    Ok(())
}
