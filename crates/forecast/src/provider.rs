//! Weather provider abstraction and the Open-Meteo HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{errors::ProviderError, models::WeatherSample, weather_code};

/// Default Open-Meteo forecast endpoint.
pub const DEFAULT_OPEN_METEO_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const HOURLY_VARIABLES: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
surface_pressure,wind_speed_10m,wind_direction_10m,wind_gusts_10m,precipitation,\
precipitation_probability,uv_index,cloud_cover,weather_code";

/// Source of weather predictions for a location and time.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the prediction for `lat`/`lon` at `timestamp`.
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        timestamp: OffsetDateTime,
    ) -> Result<WeatherSample, ProviderError>;

    /// Short name used in log output.
    fn name(&self) -> &str {
        "weather"
    }
}

/// HTTP settings for [`OpenMeteoProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OPEN_METEO_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Hourly forecast client for the Open-Meteo API.
pub struct OpenMeteoProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenMeteoProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::permanent(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        timestamp: OffsetDateTime,
    ) -> Result<WeatherSample, ProviderError> {
        let hour = format_hour(timestamp)?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("latitude", format!("{lat:.4}")),
                ("longitude", format!("{lon:.4}")),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("start_hour", hour.clone()),
                ("end_hour", hour),
                ("timezone", "GMT".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: OpenMeteoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::permanent(format!("malformed forecast response: {e}")))?;

        body.hourly.sample_at(0)
    }

    fn name(&self) -> &str {
        "open-meteo"
    }
}

/// Format the UTC hour containing `timestamp` the way Open-Meteo expects it.
fn format_hour(timestamp: OffsetDateTime) -> Result<String, ProviderError> {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day]T[hour]:00"))
        .map_err(|e| ProviderError::permanent(format!("cannot format timestamp: {e}")))
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    surface_pressure: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    wind_gusts_10m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    uv_index: Vec<Option<f64>>,
    cloud_cover: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
}

impl HourlyBlock {
    fn sample_at(&self, i: usize) -> Result<WeatherSample, ProviderError> {
        if i >= self.time.len() {
            return Err(ProviderError::permanent("forecast response has no hourly data"));
        }

        let optional = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let required = |name: &str, values: &[Option<f64>]| {
            optional(values)
                .ok_or_else(|| ProviderError::permanent(format!("forecast response is missing {name}")))
        };

        let weather_code = self
            .weather_code
            .get(i)
            .copied()
            .flatten()
            .ok_or_else(|| ProviderError::permanent("forecast response is missing weather_code"))?;

        Ok(WeatherSample {
            temperature: required("temperature_2m", &self.temperature_2m)?,
            feels_like: optional(&self.apparent_temperature),
            humidity: required("relative_humidity_2m", &self.relative_humidity_2m)?,
            pressure: required("surface_pressure", &self.surface_pressure)?,
            wind_speed: required("wind_speed_10m", &self.wind_speed_10m)?,
            wind_direction: required("wind_direction_10m", &self.wind_direction_10m)?,
            wind_gust: optional(&self.wind_gusts_10m),
            precipitation: required("precipitation", &self.precipitation)?,
            precipitation_probability: optional(&self.precipitation_probability),
            uv_index: optional(&self.uv_index),
            cloud_cover: required("cloud_cover", &self.cloud_cover)?,
            weather_code,
            weather_description: weather_code::describe(weather_code).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const BODY: &str = r#"{
        "latitude": 45.07,
        "longitude": 7.69,
        "hourly_units": {"temperature_2m": "°C"},
        "hourly": {
            "time": ["2024-06-01T10:00"],
            "temperature_2m": [24.3],
            "apparent_temperature": [25.1],
            "relative_humidity_2m": [48],
            "surface_pressure": [987.4],
            "wind_speed_10m": [11.2],
            "wind_direction_10m": [225],
            "wind_gusts_10m": [null],
            "precipitation": [0.0],
            "precipitation_probability": [10],
            "uv_index": [6.4],
            "cloud_cover": [35],
            "weather_code": [2]
        }
    }"#;

    #[test]
    fn test_parse_hourly_response() {
        let body: OpenMeteoResponse = serde_json::from_str(BODY).unwrap();
        let sample = body.hourly.sample_at(0).unwrap();
        assert_eq!(sample.temperature, 24.3);
        assert_eq!(sample.feels_like, Some(25.1));
        assert_eq!(sample.humidity, 48.0);
        assert_eq!(sample.wind_gust, None);
        assert_eq!(sample.weather_code, 2);
        assert_eq!(sample.weather_description, "Partly cloudy");
    }

    #[test]
    fn test_missing_required_value_is_permanent() {
        let body = BODY.replace("\"temperature_2m\": [24.3]", "\"temperature_2m\": [null]");
        let body: OpenMeteoResponse = serde_json::from_str(&body).unwrap();
        let err = body.hourly.sample_at(0).unwrap_err();
        assert!(!err.retryable);
        assert!(err.message.contains("temperature_2m"));
    }

    #[test]
    fn test_empty_hourly_block() {
        let body: OpenMeteoResponse = serde_json::from_str(r#"{"hourly": {}}"#).unwrap();
        assert!(body.hourly.sample_at(0).is_err());
    }

    #[test]
    fn test_format_hour_uses_utc() {
        let ts = datetime!(2024-06-01 12:45 +02:00);
        assert_eq!(format_hour(ts).unwrap(), "2024-06-01T10:00");
    }
}
