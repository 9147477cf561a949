use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitewatch::config::{Config, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "sitewatch",
    version,
    about = "Watches web pages for new items and sends notifications",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the config file setting
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every configured monitor and serve the control API
    Run {
        /// Configuration file (JSON or TOML)
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Do not start the HTTP API
        #[arg(long, default_value = "false")]
        no_web: bool,
    },

    /// Validate a configuration file and print a summary
    Validate {
        /// Configuration file (JSON or TOML)
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },

    /// Run a single check for one site and print new items
    Check {
        /// Configuration file (JSON or TOML)
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Site name
        #[arg(short, long)]
        site: String,
    },

    /// Print the items extracted from a site without touching its snapshot
    Extract {
        /// Configuration file (JSON or TOML)
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Site name
        #[arg(short, long)]
        site: String,

        /// Read markup from a local file instead of fetching
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> &PathBuf {
        match self {
            Self::Run { config, .. }
            | Self::Validate { config }
            | Self::Check { config, .. }
            | Self::Extract { config, .. } => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.command.config_path().clone();
    let mut config = Config::from_file(&path)?;
    config.apply_env();

    // Initialize tracing/logging
    setup_tracing(&config.logging, cli.log_format.as_deref(), cli.verbose)?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    match cli.command {
        Commands::Run { no_web, .. } => {
            tracing::info!(
                config = %path.display(),
                sites = config.sites.len(),
                web = config.web.enabled && !no_web,
                "Starting run command"
            );
            commands::run(config, no_web).await?;
        }

        Commands::Validate { .. } => {
            commands::validate(&config);
        }

        Commands::Check { site, .. } => {
            tracing::info!(site = %site, "Starting check command");
            commands::check(&config, &site).await?;
        }

        Commands::Extract { site, file, .. } => {
            tracing::info!(site = %site, file = ?file, "Starting extract command");
            commands::extract(&config, &site, file.as_deref()).await?;
        }
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, format_override: Option<&str>, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!("sitewatch={level},tower_http={level},warn"))
    })?;

    match format_override.unwrap_or(&logging.format) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
