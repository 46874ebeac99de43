use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::ForecastError;

/// Smallest accepted spacing between forecast points, in kilometres.
pub const MIN_WEATHER_INTERVAL_KM: u32 = 1;
/// Largest accepted spacing between forecast points, in kilometres.
pub const MAX_WEATHER_INTERVAL_KM: u32 = 20;
/// Slowest accepted average speed, in km/h.
pub const MIN_AVG_SPEED_KMH: u32 = 5;
/// Fastest accepted average speed, in km/h.
pub const MAX_AVG_SPEED_KMH: u32 = 50;

/// A raw point of the uploaded track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    pub cumulative_distance_km: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64, elevation: f64, cumulative_distance_km: f64) -> Self {
        Self {
            lat,
            lon,
            elevation,
            cumulative_distance_km,
        }
    }
}

/// A resampled point along the route that has not been scheduled yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampledPoint {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    pub distance_km: f64,
}

/// A time-stamped location along the route at which weather is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    pub distance_km: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ForecastPoint {
    pub fn from_sampled(point: SampledPoint, timestamp: OffsetDateTime) -> Self {
        Self {
            index: point.index,
            lat: point.lat,
            lon: point.lon,
            elevation: point.elevation,
            distance_km: point.distance_km,
            timestamp,
        }
    }
}

/// Weather prediction for one forecast point.
///
/// Units are metric: degrees Celsius, km/h, millimetres, hPa and percent.
/// Fields a provider may omit are optional; read them through the accessor
/// methods, which hold the single fallback policy for missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_gust: Option<f64>,
    pub precipitation: f64,
    pub precipitation_probability: Option<f64>,
    pub uv_index: Option<f64>,
    pub cloud_cover: f64,
    pub weather_code: u8,
    pub weather_description: String,
}

impl WeatherSample {
    /// Apparent temperature, or the air temperature when unknown.
    pub fn feels_like(&self) -> f64 {
        self.feels_like.unwrap_or(self.temperature)
    }

    /// Gust speed, or the sustained wind speed when unknown.
    pub fn wind_gust(&self) -> f64 {
        self.wind_gust.unwrap_or(self.wind_speed).max(self.wind_speed)
    }

    pub fn precipitation_probability(&self) -> f64 {
        self.precipitation_probability.unwrap_or(0.0)
    }

    pub fn uv_index(&self) -> f64 {
        self.uv_index.unwrap_or(0.0)
    }
}

/// Settings chosen by the user for one forecast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSettings {
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    pub weather_interval_km: u32,
    pub avg_speed_kmh: u32,
}

impl RouteSettings {
    pub fn new(start_time: OffsetDateTime, weather_interval_km: u32, avg_speed_kmh: u32) -> Self {
        Self {
            start_time,
            weather_interval_km,
            avg_speed_kmh,
        }
    }

    /// Checks the interval and speed against their accepted ranges.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !(MIN_WEATHER_INTERVAL_KM..=MAX_WEATHER_INTERVAL_KM).contains(&self.weather_interval_km)
        {
            return Err(ForecastError::Validation(format!(
                "weather interval must be between {MIN_WEATHER_INTERVAL_KM} and \
                 {MAX_WEATHER_INTERVAL_KM} km, got {}",
                self.weather_interval_km
            )));
        }
        if !(MIN_AVG_SPEED_KMH..=MAX_AVG_SPEED_KMH).contains(&self.avg_speed_kmh) {
            return Err(ForecastError::Validation(format!(
                "average speed must be between {MIN_AVG_SPEED_KMH} and \
                 {MAX_AVG_SPEED_KMH} km/h, got {}",
                self.avg_speed_kmh
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> WeatherSample {
        WeatherSample {
            temperature: 12.0,
            feels_like: None,
            humidity: 70.0,
            pressure: 1012.0,
            wind_speed: 14.0,
            wind_direction: 270.0,
            wind_gust: None,
            precipitation: 0.0,
            precipitation_probability: None,
            uv_index: None,
            cloud_cover: 40.0,
            weather_code: 2,
            weather_description: "Partly cloudy".to_string(),
        }
    }

    #[test]
    fn test_settings_bounds() {
        let start = datetime!(2024-06-01 08:00 UTC);
        assert!(RouteSettings::new(start, 1, 5).validate().is_ok());
        assert!(RouteSettings::new(start, 20, 50).validate().is_ok());
        assert!(matches!(
            RouteSettings::new(start, 0, 20).validate(),
            Err(ForecastError::Validation(_))
        ));
        assert!(matches!(
            RouteSettings::new(start, 21, 20).validate(),
            Err(ForecastError::Validation(_))
        ));
        assert!(matches!(
            RouteSettings::new(start, 5, 4).validate(),
            Err(ForecastError::Validation(_))
        ));
        assert!(matches!(
            RouteSettings::new(start, 5, 51).validate(),
            Err(ForecastError::Validation(_))
        ));
    }

    #[test]
    fn test_sample_fallbacks() {
        let mut s = sample();
        assert_eq!(s.feels_like(), 12.0);
        assert_eq!(s.wind_gust(), 14.0);
        assert_eq!(s.precipitation_probability(), 0.0);
        assert_eq!(s.uv_index(), 0.0);

        s.feels_like = Some(9.5);
        s.wind_gust = Some(31.0);
        assert_eq!(s.feels_like(), 9.5);
        assert_eq!(s.wind_gust(), 31.0);
    }

    #[test]
    fn test_gust_never_below_sustained_wind() {
        let mut s = sample();
        s.wind_gust = Some(5.0);
        assert_eq!(s.wind_gust(), 14.0);
    }
}
