//! ePrint feed CLI
//!
//! Local entry point: parse a saved document, fetch and filter the live
//! feed, inspect a weekly bucket, or keep the store refreshed.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use eprint_feed::{
    error::Result,
    models::{Config, UpstreamFormat, WeekKey},
    pipeline::{self, FeedView, RefreshScheduler},
    services,
    storage::FeedStore,
};
use log::LevelFilter;

/// ePrint feed ingestion and keyword views
#[derive(Parser, Debug)]
#[command(
    name = "eprint-feed",
    version,
    about = "Keyword-filtered and weekly views of the IACR ePrint feed"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a saved upstream document and print its items
    Parse {
        /// Document to parse
        file: PathBuf,
    },

    /// Fetch the live feed and print a keyword view
    Fetch {
        /// Keyword to match (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Ignore keywords and return every item
        #[arg(long)]
        show_all: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Fetch the live feed and print one weekly bucket
    Week {
        /// ISO year
        year: String,
        /// ISO week number
        week: String,
    },

    /// Refresh the store periodically until interrupted
    Watch,

    /// Validate the configuration file
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Atom,
}

/// Initialize logging before the config is read.
///
/// `--verbose` or `RUST_LOG` fix the filter. Otherwise the logger accepts
/// everything and `apply_config_level` narrows it once the config is loaded.
fn init_logging(verbose: bool) -> bool {
    let fixed = verbose || std::env::var_os("RUST_LOG").is_some();
    let level = if verbose { "debug" } else { "trace" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    if !fixed {
        log::set_max_level(LevelFilter::Info);
    }
    fixed
}

fn apply_config_level(config: &Config) {
    match config.logging.level_filter() {
        Ok(level) => log::set_max_level(level),
        Err(e) => log::warn!("{}. Keeping level info.", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let fixed_level = init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    if !fixed_level {
        apply_config_level(&config);
    }
    log::info!("Using configuration from {}", cli.config.display());

    match cli.command {
        Command::Parse { file } => {
            let bytes = std::fs::read(&file)?;
            let snapshot = match config.upstream.format {
                UpstreamFormat::Legacy => services::parse_document(&bytes)?,
                UpstreamFormat::Generic => services::parse_generic(&bytes)?,
            };
            log::info!(
                "Parsed {} items from {}, feed updated {}",
                snapshot.len(),
                file.display(),
                snapshot.updated()
            );
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Command::Fetch {
            keywords,
            show_all,
            format,
        } => {
            let store = Arc::new(FeedStore::new());
            let scheduler = scheduler(&config, Arc::clone(&store))?;
            scheduler.run_once().await?;

            let snapshot = store.require_snapshot()?;
            let link = pipeline::feed_link(&config.site.base_url, &keywords, show_all)?;
            let view = FeedView::build(&snapshot, &keywords, show_all, link, &config.upstream.url);
            log::info!("{} of {} items matched", view.items.len(), snapshot.len());

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Atom => println!("{}", view.to_atom()?),
            }
        }

        Command::Week { year, week } => {
            let key = WeekKey::parse(&year, &week)?;

            let store = Arc::new(FeedStore::new());
            let scheduler = scheduler(&config, Arc::clone(&store))?;
            scheduler.run_once().await?;

            match store.week_view(key) {
                Some(view) => {
                    let minutes = store.require_snapshot()?.minutes_since_update(Utc::now());
                    log::info!("{} items in {}, feed updated {} minutes ago", view.items.len(), key, minutes);
                    let output = serde_json::json!({
                        "week": view,
                        "minutes_since_update": minutes,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                None => {
                    let known: Vec<String> = store.weeks().iter().map(ToString::to_string).collect();
                    log::error!("No items indexed for {}. Known weeks: {}", key, known.join(", "));
                    std::process::exit(1);
                }
            }
        }

        Command::Watch => {
            config.validate()?;

            let store = Arc::new(FeedStore::new());
            let scheduler = scheduler(&config, store)?;

            // Nothing to serve until the first refresh succeeds.
            scheduler.run_once().await?;

            scheduler
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = match Config::load(&cli.config) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Config could not be loaded from {}: {}", cli.config.display(), e);
                    return Err(e);
                }
            };
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            log::info!("Config OK: {} ({:?})", config.upstream.url, config.upstream.format);
        }
    }

    log::info!("Done!");

    Ok(())
}

fn scheduler(config: &Config, store: Arc<FeedStore>) -> Result<RefreshScheduler> {
    let source = services::from_config(&config.upstream)?;
    Ok(RefreshScheduler::new(source, store, config.refresh.interval()))
}
