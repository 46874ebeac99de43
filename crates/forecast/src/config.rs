//! Runtime configuration for the forecast pipeline.

use std::{env, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    alerts::AlertThresholds,
    errors::ForecastError,
    enrichment::{EnrichmentConfig, MAX_COORDINATE_PRECISION},
    provider::ProviderConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub enrichment: EnrichmentConfig,
    pub thresholds: AlertThresholds,
    pub provider: ProviderConfig,
}

impl ForecastConfig {
    /// Defaults overridden by any `FORECAST_*` environment variables that
    /// are set and parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let e = &mut config.enrichment;
        override_from(&lookup, "FORECAST_MAX_CONCURRENT_FETCHES", &mut e.max_concurrent_fetches);
        override_from(&lookup, "FORECAST_MAX_RETRIES", &mut e.max_retries);
        override_from(&lookup, "FORECAST_BACKOFF_BASE_MS", &mut e.backoff_base_ms);
        override_from(&lookup, "FORECAST_MAX_BACKOFF_MS", &mut e.max_backoff_ms);
        override_from(&lookup, "FORECAST_COORDINATE_PRECISION", &mut e.coordinate_precision);
        override_from(&lookup, "FORECAST_TIME_BUCKET_SECS", &mut e.time_bucket_secs);
        if e.coordinate_precision > MAX_COORDINATE_PRECISION {
            tracing::warn!(
                "Clamping FORECAST_COORDINATE_PRECISION={} to {MAX_COORDINATE_PRECISION}",
                e.coordinate_precision
            );
            e.coordinate_precision = MAX_COORDINATE_PRECISION;
        }

        let t = &mut config.thresholds;
        override_from(&lookup, "FORECAST_EXTREME_HEAT_CELSIUS", &mut t.extreme_heat_celsius);
        override_from(&lookup, "FORECAST_FREEZING_CELSIUS", &mut t.freezing_celsius);
        override_from(&lookup, "FORECAST_HIGH_WIND_KMH", &mut t.high_wind_kmh);
        override_from(&lookup, "FORECAST_HEAVY_RAIN_MM", &mut t.heavy_rain_mm);
        override_from(&lookup, "FORECAST_SEVERE_HEAT_CELSIUS", &mut t.severe_heat_celsius);
        override_from(&lookup, "FORECAST_SEVERE_FREEZING_CELSIUS", &mut t.severe_freezing_celsius);
        override_from(&lookup, "FORECAST_SEVERE_WIND_KMH", &mut t.severe_wind_kmh);
        override_from(&lookup, "FORECAST_SEVERE_RAIN_MM", &mut t.severe_rain_mm);

        let p = &mut config.provider;
        if let Some(endpoint) = lookup("FORECAST_PROVIDER_ENDPOINT") {
            p.endpoint = endpoint;
        }
        override_from(&lookup, "FORECAST_REQUEST_TIMEOUT_SECS", &mut p.request_timeout_secs);

        config
    }
}

/// Read a single setting from the environment: `default` when unset, a
/// [`ForecastError::Validation`] when set to something that does not parse.
pub fn env_setting<T: FromStr>(key: &str, default: T) -> Result<T, ForecastError> {
    setting_from(&|key: &str| env::var(key).ok(), key, default)
}

fn setting_from<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ForecastError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse()
        .map_err(|_| ForecastError::Validation(format!("{key}={raw} is not a valid value")))
}

fn override_from<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!("Ignoring {key}={raw}: not a valid value"),
    }
}
