//! Terrain generation utilities.
//!
//! Elevation profiles for synthetic tracks, generated with Perlin noise.

mod elevation;

pub use elevation::ElevationGenerator;
