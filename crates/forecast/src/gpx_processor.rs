use std::io::Read;

use geo::{Distance as _, Haversine, geometry::Point};
use gpx::{Gpx, read};

use crate::{errors::ForecastError, models::TrackPoint};

pub struct GpxProcessor;

impl GpxProcessor {
    /// Parse a GPX document into track points with cumulative distance.
    ///
    /// All tracks and segments are concatenated in file order.
    pub fn process_gpx(content: impl Read) -> Result<Vec<TrackPoint>, ForecastError> {
        let gpx: Gpx = read(content)
            .map_err(|e| ForecastError::GpxParsing(format!("Failed to parse GPX: {}", e)))?;

        let waypoints: Vec<&gpx::Waypoint> = gpx
            .tracks
            .iter()
            .flat_map(|track| &track.segments)
            .flat_map(|segment| &segment.points)
            .collect();

        if waypoints.is_empty() {
            return Err(ForecastError::Sampling(
                "No track points found in GPX file".to_string(),
            ));
        }

        let mut points = Vec::with_capacity(waypoints.len());
        let mut distance_km = 0.0;
        let mut last_point: Option<Point> = None;
        let mut last_elevation = 0.0;

        for wpt in waypoints {
            let point = wpt.point();
            distance_km += last_point.map_or(0.0, |prev| Haversine.distance(prev, point) / 1000.0);
            last_point = Some(point);

            if let Some(elevation) = wpt.elevation {
                last_elevation = elevation;
            }

            points.push(TrackPoint::new(point.y(), point.x(), last_elevation, distance_km));
        }

        tracing::debug!(
            points = points.len(),
            distance_km,
            "Processed GPX track"
        );

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="45.0000000" lon="7.0000000"><ele>250.0</ele></trkpt>
      <trkpt lat="45.0100000" lon="7.0000000"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="45.0200000" lon="7.0000000"><ele>270.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

    #[test]
    fn test_process_gpx_accumulates_distance() {
        let points = GpxProcessor::process_gpx(GPX.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].cumulative_distance_km, 0.0);
        // 0.01 degree of latitude is roughly 1.11 km
        assert!((points[1].cumulative_distance_km - 1.11).abs() < 0.01);
        assert!((points[2].cumulative_distance_km - 2.22).abs() < 0.02);
    }

    #[test]
    fn test_missing_elevation_carries_forward() {
        let points = GpxProcessor::process_gpx(GPX.as_bytes()).unwrap();
        assert_eq!(points[0].elevation, 250.0);
        assert_eq!(points[1].elevation, 250.0);
        assert_eq!(points[2].elevation, 270.0);
    }

    #[test]
    fn test_empty_gpx_is_sampling_error() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1"></gpx>"#;
        assert!(matches!(
            GpxProcessor::process_gpx(doc.as_bytes()),
            Err(ForecastError::Sampling(_))
        ));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            GpxProcessor::process_gpx("not xml at all".as_bytes()),
            Err(ForecastError::GpxParsing(_))
        ));
    }
}
