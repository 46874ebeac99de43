pub mod alerts;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod generation;
pub mod gpx_processor;
pub mod models;
pub mod provider;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod summary;
pub mod weather_code;

use std::{path::Path, sync::Arc};

use crate::{
    config::ForecastConfig,
    gpx_processor::GpxProcessor,
    models::RouteSettings,
    provider::{OpenMeteoProvider, WeatherProvider},
    report::ForecastReport,
    session::ForecastSession,
};

/// Build the forecast for a GPX file with the given provider.
pub async fn forecast_gpx_file(
    path: &Path,
    settings: RouteSettings,
    config: ForecastConfig,
    provider: Arc<dyn WeatherProvider>,
) -> anyhow::Result<ForecastReport> {
    let file = std::fs::File::open(path)?;
    let track = GpxProcessor::process_gpx(std::io::BufReader::new(file))?;

    let mut session = ForecastSession::new(provider, settings, config)?;
    session.load_track(track)?;

    if let Some(warning) = session.enrich().await? {
        tracing::warn!("{}", warning.user_message());
    }

    Ok(session.report()?)
}

/// Build the forecast for a GPX file using the Open-Meteo API.
pub async fn run_forecast(
    path: &Path,
    settings: RouteSettings,
    config: ForecastConfig,
) -> anyhow::Result<ForecastReport> {
    let provider = Arc::new(OpenMeteoProvider::new(&config.provider)?);
    forecast_gpx_file(path, settings, config, provider).await
}
