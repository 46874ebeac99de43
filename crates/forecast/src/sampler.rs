//! Resampling of a raw track into evenly spaced forecast points.

use crate::{
    errors::ForecastError,
    models::{SampledPoint, TrackPoint},
};

/// Resample `track` every `interval_km` along its cumulative distance.
///
/// The first and last track points are always included exactly; points in
/// between are linearly interpolated inside their bracketing segment.
pub fn sample_route(track: &[TrackPoint], interval_km: f64) -> Result<Vec<SampledPoint>, ForecastError> {
    if !interval_km.is_finite() || interval_km <= 0.0 {
        return Err(ForecastError::Validation(format!(
            "sampling interval must be positive, got {interval_km}"
        )));
    }
    validate_track(track)?;

    let first = track[0];
    let last = track[track.len() - 1];
    let total_km = last.cumulative_distance_km;

    let steps = (total_km / interval_km).floor() as usize;
    let mut targets: Vec<f64> = (0..=steps).map(|k| k as f64 * interval_km).collect();
    if targets.last().is_some_and(|&d| d < total_km) {
        targets.push(total_km);
    }

    let mut points = Vec::with_capacity(targets.len());
    let mut cursor = 0;

    for (index, distance_km) in targets.into_iter().enumerate() {
        let (lat, lon, elevation) = if distance_km <= 0.0 {
            (first.lat, first.lon, first.elevation)
        } else if distance_km >= total_km {
            (last.lat, last.lon, last.elevation)
        } else {
            // Targets only increase, so the bracketing segment never moves back
            while cursor + 2 < track.len() && track[cursor + 1].cumulative_distance_km < distance_km {
                cursor += 1;
            }
            interpolate(&track[cursor], &track[cursor + 1], distance_km)
        };

        points.push(SampledPoint {
            index,
            lat,
            lon,
            elevation,
            distance_km,
        });
    }

    tracing::debug!(
        track_points = track.len(),
        forecast_points = points.len(),
        total_km,
        interval_km,
        "Sampled route"
    );

    Ok(points)
}

/// Linear interpolation at `distance_km` between two consecutive track points.
fn interpolate(a: &TrackPoint, b: &TrackPoint, distance_km: f64) -> (f64, f64, f64) {
    let span = b.cumulative_distance_km - a.cumulative_distance_km;
    if span <= 0.0 {
        return (a.lat, a.lon, a.elevation);
    }

    let t = ((distance_km - a.cumulative_distance_km) / span).clamp(0.0, 1.0);

    (
        a.lat + (b.lat - a.lat) * t,
        a.lon + (b.lon - a.lon) * t,
        a.elevation + (b.elevation - a.elevation) * t,
    )
}

fn validate_track(track: &[TrackPoint]) -> Result<(), ForecastError> {
    if track.len() < 2 {
        return Err(ForecastError::Sampling("insufficient route data".to_string()));
    }

    for (i, p) in track.iter().enumerate() {
        if !(p.lat.is_finite()
            && p.lon.is_finite()
            && p.elevation.is_finite()
            && p.cumulative_distance_km.is_finite())
        {
            return Err(ForecastError::Sampling(format!(
                "track point {i} has a non-finite value"
            )));
        }
    }

    if track[0].cumulative_distance_km != 0.0 {
        return Err(ForecastError::Sampling(format!(
            "track must start at distance 0, got {}",
            track[0].cumulative_distance_km
        )));
    }

    if let Some(i) = track
        .windows(2)
        .position(|w| w[1].cumulative_distance_km < w[0].cumulative_distance_km)
    {
        return Err(ForecastError::Sampling(format!(
            "cumulative distance decreases at track point {}",
            i + 1
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A straight northbound track with one point per kilometre.
    fn straight_track(km: usize) -> Vec<TrackPoint> {
        (0..=km)
            .map(|i| TrackPoint::new(45.0 + i as f64 * 0.009, 7.0, 100.0 + i as f64 * 10.0, i as f64))
            .collect()
    }

    #[test]
    fn test_exact_multiple() {
        let points = sample_route(&straight_track(10), 5.0).unwrap();
        let distances: Vec<f64> = points.iter().map(|p| p.distance_km).collect();
        assert_eq!(distances, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_remainder_adds_endpoint() {
        let points = sample_route(&straight_track(10), 3.0).unwrap();
        let distances: Vec<f64> = points.iter().map(|p| p.distance_km).collect();
        // floor(10 / 3) + 1 = 4 targets, plus the true endpoint
        assert_eq!(distances, vec![0.0, 3.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_endpoint_added_when_strictly_beyond_last_target() {
        let track = vec![
            TrackPoint::new(45.0, 7.0, 100.0, 0.0),
            TrackPoint::new(45.09, 7.0, 100.0, 10.000_000_000_1),
        ];
        let points = sample_route(&track, 5.0).unwrap();
        let distances: Vec<f64> = points.iter().map(|p| p.distance_km).collect();
        assert_eq!(distances, vec![0.0, 5.0, 10.0, 10.000_000_000_1]);
    }

    #[test]
    fn test_first_and_last_points_exact() {
        let track = straight_track(7);
        let points = sample_route(&track, 2.0).unwrap();
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_eq!((first.lat, first.lon, first.elevation), (track[0].lat, track[0].lon, track[0].elevation));
        assert_eq!((last.lat, last.lon, last.elevation), (track[7].lat, track[7].lon, track[7].elevation));
        assert_eq!(last.distance_km, 7.0);
    }

    #[test]
    fn test_interpolates_inside_segment() {
        let track = vec![
            TrackPoint::new(0.0, 0.0, 0.0, 0.0),
            TrackPoint::new(10.0, 20.0, 1000.0, 10.0),
        ];
        let points = sample_route(&track, 2.5).unwrap();
        assert_eq!(points.len(), 5);
        let p = points[1];
        assert!((p.lat - 2.5).abs() < 1e-12);
        assert!((p.lon - 5.0).abs() < 1e-12);
        assert!((p.elevation - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_indices_dense() {
        let points = sample_route(&straight_track(13), 4.0).unwrap();
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.index, i);
        }
        for w in points.windows(2) {
            assert!(w[1].distance_km >= w[0].distance_km);
        }
    }

    #[test]
    fn test_single_point_rejected() {
        let err = sample_route(&straight_track(0), 5.0).unwrap_err();
        assert_eq!(err, ForecastError::Sampling("insufficient route data".to_string()));
        assert!(matches!(sample_route(&[], 5.0), Err(ForecastError::Sampling(_))));
    }

    #[test]
    fn test_zero_length_loop() {
        let track = vec![
            TrackPoint::new(45.0, 7.0, 200.0, 0.0),
            TrackPoint::new(45.0, 7.0, 200.0, 0.0),
        ];
        let points = sample_route(&track, 5.0).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].distance_km, 0.0);
    }

    #[test]
    fn test_interval_longer_than_route() {
        let points = sample_route(&straight_track(3), 20.0).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].distance_km, 0.0);
        assert_eq!(points[1].distance_km, 3.0);
    }

    #[test]
    fn test_duplicate_points_do_not_divide_by_zero() {
        let track = vec![
            TrackPoint::new(45.0, 7.0, 100.0, 0.0),
            TrackPoint::new(45.01, 7.0, 110.0, 1.0),
            TrackPoint::new(45.01, 7.0, 110.0, 1.0),
            TrackPoint::new(45.02, 7.0, 120.0, 2.0),
        ];
        let points = sample_route(&track, 1.0).unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[1].lat - 45.01).abs() < 1e-12);
        assert!(points.iter().all(|p| p.lat.is_finite()));
    }

    #[test]
    fn test_rejects_decreasing_distance() {
        let track = vec![
            TrackPoint::new(45.0, 7.0, 100.0, 0.0),
            TrackPoint::new(45.01, 7.0, 110.0, 2.0),
            TrackPoint::new(45.02, 7.0, 120.0, 1.5),
        ];
        assert!(matches!(sample_route(&track, 1.0), Err(ForecastError::Sampling(_))));
    }

    #[test]
    fn test_rejects_bad_interval() {
        assert!(matches!(
            sample_route(&straight_track(3), 0.0),
            Err(ForecastError::Validation(_))
        ));
        assert!(matches!(
            sample_route(&straight_track(3), f64::NAN),
            Err(ForecastError::Validation(_))
        ));
    }

    #[test]
    fn test_resampling_is_deterministic() {
        let track = straight_track(17);
        assert_eq!(sample_route(&track, 3.0).unwrap(), sample_route(&track, 3.0).unwrap());
    }
}
