use std::{env, path::PathBuf};

use anyhow::Context as _;
use forecast::{
    config::{ForecastConfig, env_setting},
    models::RouteSettings,
    run_forecast,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let gpx_path: PathBuf = env::args()
        .nth(1)
        .or_else(|| env::var("GPX_PATH").ok())
        .context("usage: forecast <route.gpx> (or set GPX_PATH)")?
        .into();

    let start_time = match env::var("START_TIME") {
        Ok(raw) => OffsetDateTime::parse(&raw, &Rfc3339)
            .with_context(|| format!("START_TIME is not RFC 3339: {raw}"))?,
        Err(_) => OffsetDateTime::now_utc(),
    };

    let weather_interval_km: u32 = env_setting("WEATHER_INTERVAL_KM", 5)?;
    let avg_speed_kmh: u32 = env_setting("AVG_SPEED_KMH", 20)?;

    let settings = RouteSettings::new(start_time, weather_interval_km, avg_speed_kmh);
    let config = ForecastConfig::from_env();

    tracing::info!(
        "Forecasting {} every {} km at {} km/h",
        gpx_path.display(),
        weather_interval_km,
        avg_speed_kmh
    );

    let report = run_forecast(&gpx_path, settings, config).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
