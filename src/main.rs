use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use courier_routes::cache::GeocodeCache;
use courier_routes::config::{Config, Strategy};
use courier_routes::geocode::{API_KEY_ENV, GoogleGeocoder};
use courier_routes::model::DeliveryRow;
use courier_routes::normalize::WhitespaceNormalizer;
use courier_routes::pipeline::Pipeline;

/// Builds per-zone delivery routes for bicycle couriers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file; built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Geocode, classify and order a batch of delivery rows
    Plan {
        /// JSON array of {parcel_ref, address, filter} rows
        #[arg(short, long)]
        rows: PathBuf,

        /// Overrides the configured ordering strategy
        #[arg(short, long, value_enum)]
        strategy: Option<Strategy>,

        /// Where to write the plan; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect or reset the geocode cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Print entry counts
    Stats,
    /// Delete every cached entry
    Clear,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let cache = GeocodeCache::load_or_empty(&config.cache_path);

    match cli.command {
        Command::Cache { action: CacheAction::Stats } => {
            let stats = cache.stats();
            println!(
                "{}: {} entries ({} resolved, {} not found)",
                config.cache_path.display(),
                stats.total,
                stats.resolved,
                stats.not_found
            );
        }
        Command::Cache { action: CacheAction::Clear } => {
            cache.clear()?;
            println!("cleared {}", config.cache_path.display());
        }
        Command::Plan { rows, strategy, output } => {
            if config.geocoder.api_key.is_empty() {
                warn!(
                    "{} is not set, addresses missing from the cache will be reported as unresolved",
                    API_KEY_ENV
                );
                // nothing reaches the provider
                config.resolver.pause_ms = 0;
            }
            let rows: Vec<DeliveryRow> = serde_json::from_str(&fs::read_to_string(&rows)?)?;
            let geocoder = GoogleGeocoder::new(config.geocoder.clone())?;
            let normalizer = WhitespaceNormalizer::new(&config.normalizer);
            let pipeline = Pipeline::new(&config, &cache, &geocoder, &normalizer);

            let plan = pipeline.run_with(&rows, strategy.unwrap_or(config.strategy))?;
            info!(
                stops = plan.stop_count(),
                unresolved = plan.unresolved.len(),
                "route plan ready"
            );

            let json = serde_json::to_string_pretty(&plan)?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}
