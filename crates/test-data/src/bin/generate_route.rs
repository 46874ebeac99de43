//! Writes a synthetic GPX route to stdout.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin generate-route > ride.gpx
//! ```
//!
//! `ROUTE_DISTANCE_KM`, `ROUTE_SEED` and `ROUTE_REGION` (`alps` or `po`)
//! control the output.

use std::io::Write;

use rand::{SeedableRng, rngs::StdRng};
use test_data::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let distance_km: f64 = env_or("ROUTE_DISTANCE_KM", "60").parse()?;
    let seed: u64 = env_or("ROUTE_SEED", "12345").parse()?;
    let (region, elevation) = match env_or("ROUTE_REGION", "alps").as_str() {
        "po" => (Region::PO_VALLEY, ElevationGenerator::flat(seed as u32)),
        _ => (Region::ALPS, ElevationGenerator::alpine(seed as u32)),
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let track = ProceduralGenerator::for_region(region, seed as u32)
        .with_distance_km(distance_km)
        .with_elevation(elevation)
        .generate(&mut rng);

    let length_km = track.last().map_or(0.0, |p| p.cumulative_distance_km);
    tracing::info!(points = track.len(), length_km, "Generated route");

    let gpx = generate_gpx(&track, &format!("Synthetic route {seed}"), None);
    std::io::stdout().write_all(&gpx)?;

    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
