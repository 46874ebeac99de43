//! Projected arrival times for sampled forecast points.

use time::{Duration, OffsetDateTime};

use crate::{
    errors::ForecastError,
    models::{ForecastPoint, SampledPoint},
};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Time at which a rider leaving at `start_time` reaches `distance_km`.
pub fn arrival_time(
    start_time: OffsetDateTime,
    distance_km: f64,
    avg_speed_kmh: f64,
) -> Result<OffsetDateTime, ForecastError> {
    if !avg_speed_kmh.is_finite() || avg_speed_kmh <= 0.0 {
        return Err(ForecastError::Validation(format!(
            "average speed must be positive, got {avg_speed_kmh}"
        )));
    }

    let offset = Duration::checked_seconds_f64(distance_km / avg_speed_kmh * SECONDS_PER_HOUR)
        .ok_or_else(|| {
            ForecastError::Validation(format!("arrival offset for {distance_km} km overflows"))
        })?;

    start_time.checked_add(offset).ok_or_else(|| {
        ForecastError::Validation(format!("arrival time for {distance_km} km is out of range"))
    })
}

/// Attach a projected timestamp to every sampled point.
pub fn schedule(
    points: Vec<SampledPoint>,
    start_time: OffsetDateTime,
    avg_speed_kmh: f64,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    points
        .into_iter()
        .map(|p| {
            let timestamp = arrival_time(start_time, p.distance_km, avg_speed_kmh)?;
            Ok(ForecastPoint::from_sampled(p, timestamp))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sampled(distances: &[f64]) -> Vec<SampledPoint> {
        distances
            .iter()
            .enumerate()
            .map(|(index, &distance_km)| SampledPoint {
                index,
                lat: 45.0,
                lon: 7.0,
                elevation: 0.0,
                distance_km,
            })
            .collect()
    }

    #[test]
    fn test_start_point_leaves_at_start_time() {
        let start = datetime!(2024-06-01 08:00 UTC);
        let points = schedule(sampled(&[0.0, 5.0]), start, 20.0).unwrap();
        assert_eq!(points[0].timestamp, start);
    }

    #[test]
    fn test_one_hour_at_twenty_kmh() {
        let start = datetime!(2024-06-01 08:00 UTC);
        let points = schedule(sampled(&[0.0, 10.0, 20.0]), start, 20.0).unwrap();
        assert_eq!(points[1].timestamp, start + Duration::minutes(30));
        assert_eq!(points[2].timestamp, start + Duration::hours(1));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let start = datetime!(2024-06-01 08:00 UTC);
        let points = schedule(sampled(&[0.0, 1.5, 1.5, 3.0, 7.25, 9.0]), start, 17.0).unwrap();
        for w in points.windows(2) {
            assert!(w[1].timestamp >= w[0].timestamp);
        }
        assert_eq!(points.len(), 6);
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let start = datetime!(2024-06-01 08:00 UTC);
        assert!(matches!(
            schedule(sampled(&[0.0, 5.0]), start, 0.0),
            Err(ForecastError::Validation(_))
        ));
        assert!(matches!(
            schedule(sampled(&[0.0, 5.0]), start, -5.0),
            Err(ForecastError::Validation(_))
        ));
    }

    #[test]
    fn test_preserves_point_fields() {
        let start = datetime!(2024-06-01 08:00 UTC);
        let input = sampled(&[0.0, 4.0]);
        let points = schedule(input.clone(), start, 20.0).unwrap();
        assert_eq!(points[1].index, input[1].index);
        assert_eq!(points[1].distance_km, input[1].distance_km);
    }
}
