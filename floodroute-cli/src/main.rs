//! Command-line driver for the route engine.
//!
//! Loads a road dataset, answers one request and prints GeoJSON to stdout.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use floodroute::prelude::*;
use floodroute::{RouteEngine, load_config};
use tracing_subscriber::EnvFilter;

/// Flood-aware route planning
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Road dataset (GeoJSON or CSV), overrides `network.path`
    #[arg(long, short)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cheapest route between two points
    Route {
        /// Origin as `lat,lon`
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,
        /// Destination as `lat,lon`
        #[arg(long, value_parser = parse_coordinate)]
        to: Coordinate,
        #[arg(long, value_parser = parse_mode, default_value = "car")]
        mode: TravelMode,
        /// Maximum snapping distance in metres
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Labelled alternatives scored for flood exposure
    Alternatives {
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,
        #[arg(long, value_parser = parse_coordinate)]
        to: Coordinate,
        /// Number of routes, 2 to 5
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, value_parser = parse_mode)]
        mode: Option<TravelMode>,
        /// Corridor half-width in metres
        #[arg(long)]
        buffer: Option<f64>,
        /// Observed precipitation in mm
        #[arg(long)]
        precipitation: Option<f64>,
        /// Observed rain in mm
        #[arg(long)]
        rain: Option<f64>,
        /// Also score every route point
        #[arg(long)]
        points: bool,
    },
    /// Summary of the loaded network
    Stats,
}

fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got '{value}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {value}"));
    }
    Ok(coordinate)
}

fn parse_mode(value: &str) -> Result<TravelMode, String> {
    value.parse().map_err(|e: floodroute_core::Error| e.to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dataset) = args.dataset {
        config.network.path = Some(dataset);
    }
    let (engine, report) = RouteEngine::from_config(config).context("loading road network")?;
    tracing::info!(
        segments = report.segments_loaded,
        skipped = report.skipped.len(),
        "Road network ready"
    );

    match args.command {
        Command::Route {
            from,
            to,
            mode,
            radius,
        } => {
            let mut request = RouteRequest::new(from, to).with_mode(mode);
            if let Some(radius) = radius {
                request = request.with_max_snap_radius(radius);
            }
            match engine.compute_route(&request)? {
                RouteOutcome::Found(route) => println!("{}", route.to_geojson_string()?),
                RouteOutcome::Unreachable(reason) => bail!("No route: {reason}"),
                RouteOutcome::SnapFailed(failure) => bail!("{failure}"),
            }
        }
        Command::Alternatives {
            from,
            to,
            count,
            mode,
            buffer,
            precipitation,
            rain,
            points,
        } => {
            let weather = (precipitation.is_some() || rain.is_some()).then(|| WeatherObservation {
                precipitation_mm: precipitation,
                rain_mm: rain,
                observed_at: Some(chrono::Utc::now()),
            });
            let request = AlternativesRequest {
                desired_count: count,
                mode,
                buffer_m: buffer,
                weather,
                with_points: points,
                ..AlternativesRequest::new(from, to)
            };
            match engine.compute_alternatives(&request)? {
                AlternativesOutcome::Found(set) => {
                    if set.degenerate {
                        tracing::warn!(
                            candidates = set.candidates_considered,
                            "Fewer distinct routes than requested"
                        );
                    }
                    println!("{}", set.to_geojson_string()?);
                }
                AlternativesOutcome::Unreachable(reason) => bail!("No route: {reason}"),
                AlternativesOutcome::SnapFailed(failure) => bail!("{failure}"),
            }
        }
        Command::Stats => {
            let network = engine.network();
            let stats = serde_json::json!({
                "segments": network.segment_count(),
                "nodes": network.node_count(),
                "edges": network.edge_count(),
                "flooded_segments": network.flooded_segment_count(),
                "skipped": report.skipped.len(),
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
