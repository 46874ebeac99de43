//! Perlin noise-based elevation generation.

use noise::{NoiseFn, Perlin};

/// Generates realistic elevation data using Perlin noise.
///
/// The generator uses multiple octaves of Perlin noise to create
/// natural-looking terrain with both large-scale features and
/// small-scale variation.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    /// Base elevation in meters (e.g., valley floor).
    base_elevation: f64,
    /// Scale factor for terrain height variation.
    height_scale: f64,
    /// Spatial frequency in cycles per degree.
    frequency: f64,
    /// Number of noise octaves for detail.
    octaves: u32,
}

impl ElevationGenerator {
    /// Creates a new elevation generator with default settings.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 800.0,
            height_scale: 400.0,
            frequency: 8.0,
            octaves: 4,
        }
    }

    /// Creates a generator for alpine terrain with large height differences.
    pub fn alpine(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1500.0,
            height_scale: 1000.0,
            frequency: 10.0,
            octaves: 5,
        }
    }

    /// Creates a generator for relatively flat terrain (rolling hills).
    pub fn flat(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 120.0,
            height_scale: 30.0,
            frequency: 4.0,
            octaves: 2,
        }
    }

    /// Gets elevation at a given lat/lon coordinate.
    ///
    /// Uses fractal Brownian motion (fBm) for natural terrain appearance.
    pub fn elevation_at(&self, lat: f64, lon: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            let noise_val = self.perlin.get([lat * frequency, lon * frequency]);
            total += noise_val * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5; // Each octave has half the amplitude
            frequency *= 2.0; // Each octave has double the frequency
        }

        // Normalize and scale
        let normalized = total / max_amplitude; // Range: -1 to 1
        self.base_elevation + (normalized * self.height_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_consistency() {
        let elev_gen = ElevationGenerator::new(42);
        let elev1 = elev_gen.elevation_at(45.1, 7.3);
        let elev2 = elev_gen.elevation_at(45.1, 7.3);
        assert!((elev1 - elev2).abs() < 0.001);
    }

    #[test]
    fn test_elevation_range() {
        let elev_gen = ElevationGenerator::alpine(42);
        let elev = elev_gen.elevation_at(45.1, 7.3);
        // Should be within base ± scale
        assert!(elev >= elev_gen.base_elevation - elev_gen.height_scale);
        assert!(elev <= elev_gen.base_elevation + elev_gen.height_scale);
    }
}
