//! Deterministic synthetic weather.

use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use time::OffsetDateTime;

use forecast::{
    errors::ProviderError, models::WeatherSample, provider::WeatherProvider, weather_code,
};

use crate::config::Climate;

/// Produces plausible weather that depends only on the seed, the location
/// and the hour. The same request always yields the same sample.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    climate: Climate,
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(climate: Climate, seed: u64) -> Self {
        Self { climate, seed }
    }

    /// Sample for a location and time without going through the async trait.
    pub fn sample_at(&self, lat: f64, lon: f64, timestamp: OffsetDateTime) -> WeatherSample {
        let mut rng = StdRng::seed_from_u64(self.request_seed(lat, lon, timestamp));
        let c = &self.climate;

        // Coolest at 04:00, warmest at 16:00 local solar time.
        let solar_hour = f64::from(timestamp.hour()) + lon / 15.0;
        let phase = (solar_hour - 10.0) / 24.0 * std::f64::consts::TAU;
        let temperature = c.mean_temperature + c.daily_swing * phase.sin() + noise(&mut rng, 0.5);

        let wind_speed = (c.mean_wind_kmh + noise(&mut rng, c.mean_wind_kmh * 0.15)).max(0.0);
        let wind_gust = wind_speed * rng.gen_range(1.2..1.6);

        let raining = rng.r#gen::<f64>() < c.rain_probability;
        let precipitation = if raining {
            (c.mean_rain_mm + noise(&mut rng, c.mean_rain_mm * 0.2)).max(0.1)
        } else {
            0.0
        };

        let weather_code = match (raining, temperature <= 0.0) {
            (true, true) => 73,
            (true, false) if precipitation >= 5.0 => 65,
            (true, false) => 61,
            (false, _) if wind_speed > 40.0 => 3,
            (false, _) => 1,
        };

        WeatherSample {
            temperature: round1(temperature),
            feels_like: Some(round1(temperature - wind_speed / 10.0)),
            humidity: if raining { 92.0 } else { rng.gen_range(35.0..75.0_f64).round() },
            pressure: round1(1013.0 + noise(&mut rng, 4.0)),
            wind_speed: round1(wind_speed),
            wind_direction: rng.gen_range(0.0..360.0_f64).round(),
            wind_gust: Some(round1(wind_gust)),
            precipitation: round1(precipitation),
            precipitation_probability: Some(if raining { 90.0 } else { 5.0 }),
            uv_index: None,
            cloud_cover: if raining { 100.0 } else { rng.gen_range(0.0..40.0_f64).round() },
            weather_code,
            weather_description: weather_code::describe(weather_code).to_string(),
        }
    }

    fn request_seed(&self, lat: f64, lon: f64, timestamp: OffsetDateTime) -> u64 {
        let lat = (lat * 1e4).round() as i64 as u64;
        let lon = (lon * 1e4).round() as i64 as u64;
        let hour = timestamp.unix_timestamp().div_euclid(3600) as u64;
        self.seed
            ^ lat.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ lon.wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ hour.wrapping_mul(0x1656_67B1_9E37_79F9)
    }
}

#[async_trait]
impl WeatherProvider for SyntheticProvider {
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        timestamp: OffsetDateTime,
    ) -> Result<WeatherSample, ProviderError> {
        Ok(self.sample_at(lat, lon, timestamp))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

fn noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    Normal::new(0.0, std_dev.abs())
        .map(|n| n.sample(rng))
        .unwrap_or(0.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_same_request_same_sample() {
        let provider = SyntheticProvider::new(Climate::temperate(), 42);
        let at = datetime!(2026-06-01 10:30 UTC);
        assert_eq!(provider.sample_at(45.0, 7.0, at), provider.sample_at(45.0, 7.0, at));
    }

    #[test]
    fn test_seed_changes_sample() {
        let at = datetime!(2026-06-01 10:30 UTC);
        let a = SyntheticProvider::new(Climate::temperate(), 1).sample_at(45.0, 7.0, at);
        let b = SyntheticProvider::new(Climate::temperate(), 2).sample_at(45.0, 7.0, at);
        assert_ne!(a, b);
    }

    #[test]
    fn test_winter_storm_is_hazardous() {
        let provider = SyntheticProvider::new(Climate::winter_storm(), 7);
        let sample = provider.sample_at(45.0, 7.0, datetime!(2026-01-10 04:00 UTC));
        assert!(sample.temperature < 0.0);
        assert!(sample.wind_speed > 15.0);
        assert!(sample.wind_gust() >= sample.wind_speed);
    }

    #[test]
    fn test_temperate_has_no_rain() {
        let provider = SyntheticProvider::new(Climate::temperate(), 3);
        let sample = provider.sample_at(45.0, 7.0, datetime!(2026-06-01 12:00 UTC));
        assert_eq!(sample.precipitation, 0.0);
        assert_eq!(sample.weather_description, weather_code::describe(sample.weather_code));
    }
}
