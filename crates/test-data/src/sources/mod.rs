//! Track geometry sources for test routes.
//!
//! - [`ProceduralGenerator`]: random-walk routes with Perlin elevation
//! - [`straight_track`]: deterministic north-bound track for exact assertions

mod procedural;

pub use procedural::{ProceduralGenerator, TrackConfig, straight_track};
