use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ledger_analytics::aggregations::MAX_WINDOW_DAYS;
use ledger_analytics::{Aggregator, ReportGenerator};
use ledger_core::config::AppConfig;
use ledger_core::lookup::LookupTables;
use ledger_core::store::{load_seed_file, MemoryStore, SessionStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pachi-ledger",
    about = "Session ledger and profit dashboard backend for pachinko and slot play",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/pachi-ledger/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Print a profit report for the configured or given sessions
    Report {
        /// JSON file with an array of sessions (default: configured seed data)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Days covered by the daily table
        #[arg(
            short,
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS))
        )]
        days: u32,
        /// Emit markdown instead of a terminal summary
        #[arg(long)]
        markdown: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "pachi_ledger=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            ledger_server::serve(config).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &config)?;
        }
        Some(Commands::Report {
            input,
            days,
            markdown,
        }) => {
            handle_report_command(&config, input, days, markdown)?;
        }
        None => {
            ledger_server::serve(config).await?;
        }
    }

    Ok(())
}

fn handle_config_command(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            let path = AppConfig::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", AppConfig::default_path().display());
        }
    }
    Ok(())
}

fn handle_report_command(
    config: &AppConfig,
    input: Option<PathBuf>,
    days: u32,
    markdown: bool,
) -> Result<()> {
    let store = match &input {
        Some(path) => {
            let sessions = load_seed_file(path)
                .with_context(|| format!("Failed to read sessions from {}", path.display()))?;
            MemoryStore::with_sessions(sessions)?
        }
        None => MemoryStore::from_config(&config.store)?,
    };
    let sessions = store.list();

    let aggregator = Aggregator::new(config.stats.offset()?);
    let lookups = LookupTables::from_config(&config.lookups, &config.stats.unknown_label);
    let today = Utc::now().with_timezone(&aggregator.offset()).date_naive();

    if markdown {
        let report = ReportGenerator::markdown_report(&aggregator, &sessions, &lookups, today, days);
        print!("{}", report);
    } else {
        println!("Sessions ({} recorded)", sessions.len());
        print!(
            "{}",
            ReportGenerator::text_summary(&aggregator, &sessions, &lookups, today)
        );
    }
    Ok(())
}
