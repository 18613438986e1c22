use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dispatch_core::geo::round_to;
use dispatch_core::{
    Coordinate, DispatchConfig, Dispatcher, DriverDirectory, DriverRecord, Order,
    SnapshotDirectory,
};
use serde::Serialize;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "dispatch",
    about = "Price deliveries and match drivers against a snapshot",
    long_about = "Runs the DeliverEase dispatch core against JSON files:\n\
                  quotes, single driver matches, and pending-order passes."
)]
struct Cli {
    /// Dispatch configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true, env = "DISPATCH_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Price a delivery between two points
    Quote {
        /// Pickup as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        pickup: Coordinate,
        /// Drop-off as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        dropoff: Coordinate,
        /// Delivery type tier id
        #[arg(long, default_value = "standard")]
        tier: String,
    },
    /// Select a driver for a pickup
    Match {
        /// Driver snapshot: JSON array of driver records
        #[arg(long)]
        drivers: PathBuf,
        /// Pickup as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        pickup: Coordinate,
        /// Driver the customer asked for
        #[arg(long)]
        preferred: Option<String>,
    },
    /// Assign every unassigned pending order and print the results as JSON
    Dispatch {
        /// Driver snapshot: JSON array of driver records
        #[arg(long)]
        drivers: PathBuf,
        /// Orders: JSON array of order records
        #[arg(long)]
        orders: PathBuf,
    },
}

#[derive(Serialize)]
struct DispatchReport {
    outcomes: Vec<serde_json::Value>,
    orders: Vec<Order>,
}

// ── helpers ────────────────────────────────────────────────────────

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DispatchConfig> {
    match path {
        Some(path) => DispatchConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DispatchConfig::default()),
    }
}

fn load_drivers(path: &Path) -> Result<Vec<DriverRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading driver snapshot {}", path.display()))?;
    let snapshot = SnapshotDirectory::from_json_str(&json)
        .with_context(|| format!("parsing driver snapshot {}", path.display()))?;
    Ok(snapshot.into_drivers())
}

fn build_directory(
    drivers: Vec<DriverRecord>,
    config: &DispatchConfig,
) -> Result<Box<dyn DriverDirectory>> {
    config
        .directory(drivers)
        .context("indexing driver snapshot")
}

// ── commands ───────────────────────────────────────────────────────

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let dispatcher = Dispatcher::from_config(&config).context("building dispatcher")?;

    match cli.command {
        Commands::Quote {
            pickup,
            dropoff,
            tier,
        } => {
            let quote = dispatcher.quote(&pickup, &dropoff, &tier)?;
            println!(
                "{} km, {} tier, {} pricing: {:.2}",
                round_to(quote.distance_km, 1),
                tier,
                dispatcher.pricing_policy().name(),
                quote.cost
            );
        }
        Commands::Match {
            drivers,
            pickup,
            preferred,
        } => {
            let directory = build_directory(load_drivers(&drivers)?, &config)?;
            tracing::info!(drivers = directory.len(), "loaded driver snapshot");
            match dispatcher.select_driver(directory.as_ref(), &pickup, preferred.as_deref())? {
                Some(found) => println!(
                    "{} ({:?}) at {} km",
                    found.driver.id,
                    found.source,
                    round_to(found.distance_km, 1)
                ),
                None => println!("no drivers available"),
            }
        }
        Commands::Dispatch { drivers, orders } => {
            let directory = build_directory(load_drivers(&drivers)?, &config)?;
            let json = fs::read_to_string(&orders)
                .with_context(|| format!("reading orders {}", orders.display()))?;
            let mut orders: Vec<Order> =
                serde_json::from_str(&json).context("parsing orders")?;

            let outcomes = dispatcher
                .assign_pending(&mut orders, directory.as_ref())
                .into_iter()
                .map(|(order_id, result)| match result {
                    Ok(outcome) => serde_json::to_value(outcome),
                    Err(err) => Ok(serde_json::json!({
                        "order_id": order_id,
                        "error": err.to_string(),
                    })),
                })
                .collect::<Result<Vec<_>, _>>()
                .context("serializing outcomes")?;

            let report = DispatchReport { outcomes, orders };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_with_negative_longitudes() {
        let cli = Cli::try_parse_from([
            "dispatch",
            "quote",
            "--pickup",
            "40.7128,-74.0060",
            "--dropoff",
            "40.7580,-73.9855",
            "--tier",
            "urgent",
        ])
        .expect("parse");
        match cli.command {
            Commands::Quote { pickup, tier, .. } => {
                assert_eq!(pickup.longitude, -74.0060);
                assert_eq!(tier, "urgent");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_pickup() {
        let result = Cli::try_parse_from([
            "dispatch",
            "match",
            "--drivers",
            "drivers.json",
            "--pickup",
            "123.0,0.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "dispatch",
            "dispatch",
            "--drivers",
            "d.json",
            "--orders",
            "o.json",
            "--config",
            "dispatch.json",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("dispatch.json")));
    }

    #[test]
    fn quote_runs_with_default_config() {
        let cli = Cli::try_parse_from([
            "dispatch",
            "quote",
            "--pickup",
            "0,0",
            "--dropoff",
            "0,0",
        ])
        .expect("parse");
        run(Cli { config: None, ..cli }).expect("run");
    }
}
