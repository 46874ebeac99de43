//! Test data generation for route forecasts.
//!
//! This crate provides synthetic GPS routes, GPX documents and mock weather
//! providers to support manual verification and integration testing of the
//! `forecast` crate without network access.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let track = ProceduralGenerator::for_region(Region::ALPS, 7)
//!     .with_distance_km(80.0)
//!     .generate(&mut rng);
//! let provider = RecordingProvider::new(Arc::new(SyntheticProvider::new(Climate::heat_wave(), 7)))
//!     .with_latency(Duration::from_millis(20));
//! ```

pub mod config;
pub mod gpx;
pub mod providers;
pub mod sources;
pub mod terrain;

pub use forecast::models::TrackPoint;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::TrackPoint;
    pub use crate::config::{BoundingBox, Climate, Region};
    pub use crate::gpx::{RideTiming, generate_gpx};
    pub use crate::providers::{FailurePlan, RecordedCall, RecordingProvider, SyntheticProvider};
    pub use crate::sources::{ProceduralGenerator, TrackConfig, straight_track};
    pub use crate::terrain::ElevationGenerator;
}
