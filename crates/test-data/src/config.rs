//! Configuration types for test data generation.

use serde::{Deserialize, Serialize};

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }
}

/// Pre-defined geographic regions for test data generation.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Western Alps around Turin - long climbs and cold summits.
    pub const ALPS: BoundingBox = BoundingBox::new(44.8, 6.8, 45.6, 7.8);

    /// Po valley - flat, hot in summer.
    pub const PO_VALLEY: BoundingBox = BoundingBox::new(44.9, 8.5, 45.4, 9.6);
}

/// Climate used by the synthetic weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Climate {
    /// Mean temperature at sea level in °C.
    pub mean_temperature: f64,
    /// Peak-to-mean amplitude of the day/night temperature cycle in °C.
    pub daily_swing: f64,
    /// Mean sustained wind in km/h.
    pub mean_wind_kmh: f64,
    /// Probability (0.0-1.0) that an hour has rain.
    pub rain_probability: f64,
    /// Mean rain amount in mm for a rainy hour.
    pub mean_rain_mm: f64,
}

impl Default for Climate {
    fn default() -> Self {
        Self::temperate()
    }
}

impl Climate {
    /// Mild spring day: no alerts expected.
    pub fn temperate() -> Self {
        Self {
            mean_temperature: 16.0,
            daily_swing: 6.0,
            mean_wind_kmh: 12.0,
            rain_probability: 0.0,
            mean_rain_mm: 0.0,
        }
    }

    /// Heat wave: extreme heat alerts along most of the route.
    pub fn heat_wave() -> Self {
        Self {
            mean_temperature: 38.0,
            daily_swing: 4.0,
            mean_wind_kmh: 8.0,
            rain_probability: 0.0,
            mean_rain_mm: 0.0,
        }
    }

    /// Winter storm: freezing, windy and wet.
    pub fn winter_storm() -> Self {
        Self {
            mean_temperature: -6.0,
            daily_swing: 2.0,
            mean_wind_kmh: 45.0,
            rain_probability: 0.8,
            mean_rain_mm: 8.0,
        }
    }
}
