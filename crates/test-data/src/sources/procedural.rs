//! Procedural route generation.

use geo::{Distance as _, Haversine, Point};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use forecast::models::TrackPoint;

use crate::config::{BoundingBox, Region};
use crate::terrain::ElevationGenerator;

/// Meters per degree of latitude, close enough for path stepping.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Configuration for procedural route generation.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    /// Target route length in kilometers.
    pub distance_km: f64,
    /// Starting point (lat, lon). If None, random within bounds.
    pub start_point: Option<(f64, f64)>,
    /// Geographic bounds for the route.
    pub bounds: BoundingBox,
    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,
    /// Approximate distance between recorded points in meters.
    pub point_spacing_m: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            distance_km: 50.0,
            start_point: None,
            bounds: Region::ALPS,
            gps_jitter_m: 3.0,
            point_spacing_m: 100.0,
        }
    }
}

/// Generates synthetic cycling routes with realistic geometry.
pub struct ProceduralGenerator {
    config: TrackConfig,
    elevation: ElevationGenerator,
}

impl ProceduralGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: TrackConfig::default(),
            elevation: ElevationGenerator::alpine(seed),
        }
    }

    /// Creates a generator for a specific region.
    pub fn for_region(bounds: BoundingBox, seed: u32) -> Self {
        Self {
            config: TrackConfig {
                bounds,
                ..Default::default()
            },
            elevation: ElevationGenerator::new(seed),
        }
    }

    pub fn with_distance_km(mut self, km: f64) -> Self {
        self.config.distance_km = km;
        self
    }

    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start_point = Some((lat, lon));
        self
    }

    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    pub fn with_elevation(mut self, elevation: ElevationGenerator) -> Self {
        self.elevation = elevation;
        self
    }

    /// Generates a route with elevation and cumulative distance.
    ///
    /// Distance is measured on the jittered coordinates, so it always
    /// matches what a GPX reader would compute from the output.
    pub fn generate(&self, rng: &mut impl Rng) -> Vec<TrackPoint> {
        let start = self
            .config
            .start_point
            .unwrap_or_else(|| self.config.bounds.random_point(rng));

        let path = self.generate_path(start, rng);
        self.measure(path, rng)
    }

    /// Generates a simple path (coordinates only).
    pub fn generate_path(&self, start: (f64, f64), rng: &mut impl Rng) -> Vec<(f64, f64)> {
        let target_m = self.config.distance_km * 1000.0;
        let mut path = vec![start];
        let mut current = start;
        let mut total_distance = 0.0;

        // Random walk with momentum
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);

        while total_distance < target_m {
            heading += rng.gen_range(-0.3..0.3);
            let step = self.config.point_spacing_m * rng.gen_range(0.8..1.2);

            let lat_delta = (step * heading.cos()) / METERS_PER_DEGREE;
            let lon_delta =
                (step * heading.sin()) / (METERS_PER_DEGREE * current.0.to_radians().cos());

            let (next_lat, next_lon, bounced_heading) =
                self.apply_bounds(current.0 + lat_delta, current.1 + lon_delta, heading);
            heading = bounced_heading;

            current = (next_lat, next_lon);
            path.push(current);
            total_distance += step;
        }

        path
    }

    /// Applies bounds checking with heading reversal.
    fn apply_bounds(&self, lat: f64, lon: f64, heading: f64) -> (f64, f64, f64) {
        let b = &self.config.bounds;
        let mut new_heading = heading;

        let lat = if lat < b.min_lat {
            new_heading = std::f64::consts::PI - heading;
            b.min_lat + (b.min_lat - lat).min(0.001)
        } else if lat > b.max_lat {
            new_heading = std::f64::consts::PI - heading;
            b.max_lat - (lat - b.max_lat).min(0.001)
        } else {
            lat
        };

        let lon = if lon < b.min_lon {
            new_heading = -heading;
            b.min_lon + (b.min_lon - lon).min(0.001)
        } else if lon > b.max_lon {
            new_heading = -heading;
            b.max_lon - (lon - b.max_lon).min(0.001)
        } else {
            lon
        };

        (lat, lon, new_heading)
    }

    fn measure(&self, path: Vec<(f64, f64)>, rng: &mut impl Rng) -> Vec<TrackPoint> {
        let sigma = self.config.gps_jitter_m.max(0.0) / METERS_PER_DEGREE;
        let jitter = Normal::new(0.0, sigma).ok();

        let mut result = Vec::with_capacity(path.len());
        let mut distance_km = 0.0;
        let mut previous: Option<Point> = None;

        for (lat, lon) in path {
            let lat = lat + jitter_sample(jitter.as_ref(), rng);
            let lon = lon + jitter_sample(jitter.as_ref(), rng);
            let point = Point::new(lon, lat);
            distance_km += previous.map_or(0.0, |prev| Haversine.distance(prev, point) / 1000.0);
            previous = Some(point);

            let elevation = self.elevation.elevation_at(lat, lon);
            result.push(TrackPoint::new(lat, lon, elevation, distance_km));
        }

        result
    }
}

fn jitter_sample(jitter: Option<&Normal<f64>>, rng: &mut impl Rng) -> f64 {
    jitter.map_or(0.0, |n| n.sample(rng))
}

/// A straight north-bound track of `points` vertices evenly spread over
/// `length_km`, starting at `start`. Distances are exact, so sampler and
/// scheduler output can be asserted without tolerance games.
pub fn straight_track(start: (f64, f64), length_km: f64, points: usize) -> Vec<TrackPoint> {
    let segments = points.saturating_sub(1).max(1);
    let step_km = length_km / segments as f64;

    (0..=segments)
        .map(|i| {
            let distance_km = if i == segments {
                length_km
            } else {
                step_km * i as f64
            };
            let lat = start.0 + distance_km * 1000.0 / METERS_PER_DEGREE;
            TrackPoint::new(lat, start.1, 100.0 + i as f64, distance_km)
        })
        .collect()
}
