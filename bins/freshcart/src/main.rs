//! freshcart: search perishable listings from the command line.

use clap::{Parser, Subcommand};
use freshcart_cli::output::Status;
use freshcart_geo::Coordinate;
use freshcart_search::StorageCondition;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;

use commands::search::{overrides_from_flags, SearchArgs};
use config::Settings;

/// Perishable-product search for the freshcart marketplace
#[derive(Parser)]
#[command(name = "freshcart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    /// Settings file (TOML with [search] and [telemetry] tables)
    #[arg(short, long, global = true, env = "FRESHCART_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a JSON product catalog around a buyer location
    #[command(allow_negative_numbers = true)]
    Search {
        /// JSON array of product records
        catalog: PathBuf,

        /// Buyer latitude
        #[arg(long)]
        lat: f64,

        /// Buyer longitude
        #[arg(long)]
        lng: f64,

        /// Best storage the buyer has (ambient, refrigerated, frozen)
        #[arg(long)]
        storage: Option<StorageCondition>,

        /// Search radius in km
        #[arg(short, long)]
        radius: Option<f64>,

        /// Weight preset (default, balanced, proximity-focused, freshness-focused)
        #[arg(short, long)]
        preset: Option<String>,

        /// Proximity weight
        #[arg(long)]
        proximity_weight: Option<f64>,

        /// Freshness weight
        #[arg(long)]
        freshness_weight: Option<f64>,

        /// Minimum freshness percentage
        #[arg(long)]
        min_freshness: Option<f64>,

        /// Output mode (ranking, filter)
        #[arg(short, long)]
        mode: Option<String>,

        /// Filter-mode sort key (price, distance, freshness, score, expiration)
        #[arg(long)]
        sort_by: Option<String>,

        /// Filter-mode sort order (asc, desc)
        #[arg(long)]
        sort_order: Option<String>,

        /// Drop listings whose shelf life has run out
        #[arg(long)]
        exclude_expired: bool,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only this seller's listings
        #[arg(long)]
        seller: Option<i64>,

        /// Only this product type
        #[arg(long)]
        product_type: Option<i64>,

        /// Reject invalid config instead of falling back to defaults
        #[arg(long)]
        strict: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Print collected metrics to stderr afterwards
        #[arg(long)]
        metrics: bool,
    },

    /// List weight presets
    Presets {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Strictly validate the [search] table of a settings file
    CheckConfig {
        /// Settings file (defaults to --config or the discovered file)
        file: Option<PathBuf>,
    },

    /// Great-circle distance between two points
    #[command(allow_negative_numbers = true)]
    Distance {
        /// Start latitude
        from_lat: f64,
        /// Start longitude
        from_lng: f64,
        /// End latitude
        to_lat: f64,
        /// End longitude
        to_lng: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Status::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let loaded = Settings::load(cli.config.as_deref(), &cwd)?;

    let mut telemetry = loaded.settings.telemetry.clone();
    if cli.verbose {
        telemetry.log_level = "debug".to_string();
    }
    if cli.json_logs {
        telemetry.json = true;
    }
    let metrics_enabled = telemetry.metrics_enabled;
    freshcart_telemetry::init_with_config(telemetry)?;

    if let Some(path) = &loaded.path {
        tracing::debug!(path = %path.display(), "Loaded settings");
    }

    match cli.command {
        Commands::Search {
            catalog,
            lat,
            lng,
            storage,
            radius,
            preset,
            proximity_weight,
            freshness_weight,
            min_freshness,
            mode,
            sort_by,
            sort_order,
            exclude_expired,
            limit,
            seller,
            product_type,
            strict,
            json,
            metrics,
        } => {
            let args = SearchArgs {
                catalog,
                latitude: lat,
                longitude: lng,
                storage,
                seller,
                product_type,
                overrides: overrides_from_flags(
                    radius,
                    proximity_weight,
                    freshness_weight,
                    preset,
                    min_freshness,
                    mode,
                    sort_by,
                    sort_order,
                    exclude_expired,
                    limit,
                ),
                strict,
                json,
                show_metrics: metrics,
            };
            commands::search::run(args, &loaded.settings.search, metrics_enabled)
        }

        Commands::Presets { json } => commands::presets::run(json),

        Commands::CheckConfig { file } => {
            let path = file.or(loaded.path).ok_or_else(|| {
                anyhow::anyhow!("No settings file given and none found in {}", cwd.display())
            })?;
            commands::check_config::run(&path)
        }

        Commands::Distance {
            from_lat,
            from_lng,
            to_lat,
            to_lng,
            json,
        } => commands::distance::run(
            Coordinate::new(from_lat, from_lng),
            Coordinate::new(to_lat, to_lng),
            json,
        ),
    }
}
