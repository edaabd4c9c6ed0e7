use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cubewatch::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "cubewatch",
    version,
    about = "Announces new WCA competitions for a country",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Country name, ISO code or approximate name
    #[arg(long, global = true)]
    country: Option<String>,

    /// Message locale (es, en)
    #[arg(long, global = true)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring loop
    Run,

    /// Run a single monitoring cycle
    Check,

    /// Show current competitions without touching the store
    List {
        /// Country (overrides --country)
        country: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Show how a country input resolves
    Resolve {
        /// Country name, ISO code or approximate name
        country: String,
    },

    /// List available message languages
    Languages,

    /// Remove a stored competition by URL
    Delete {
        /// Competition URL
        url: String,
    },

    /// Remove stored competitions that have ended
    Purge {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cubewatch starting");

    let app = commands::App::build(config)?;

    match cli.command {
        Commands::Run => {
            let session = app.session(cli.country, cli.locale);
            commands::run(&app, session).await?;
        }

        Commands::Check => {
            let session = app.session(cli.country, cli.locale);
            tracing::info!(country = %session.country, locale = %session.locale, "Starting check command");
            commands::check(&app, session).await?;
        }

        Commands::List { country, page } => {
            let session = app.session(country.or(cli.country), cli.locale);
            commands::list(&app, session, page).await?;
        }

        Commands::Resolve { country } => {
            let session = app.session(None, cli.locale);
            commands::resolve(&app, session, &country).await?;
        }

        Commands::Languages => {
            let session = app.session(None, cli.locale);
            commands::languages(&app, &session)?;
        }

        Commands::Delete { url } => {
            commands::delete(&app, &url).await?;
        }

        Commands::Purge { as_of } => {
            commands::purge(&app, as_of).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("cubewatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("cubewatch={level},warn")))
            .context("Invalid log level")?
    };

    match format {
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
