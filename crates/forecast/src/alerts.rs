//! Hazard detection over weather samples.

use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};

use crate::models::WeatherSample;

/// Default temperature above which heat is extreme, in °C.
pub const DEFAULT_EXTREME_HEAT_CELSIUS: f64 = 35.0;
/// Default temperature below which conditions are freezing, in °C.
pub const DEFAULT_FREEZING_CELSIUS: f64 = 0.0;
/// Default sustained wind above which wind is high, in km/h.
pub const DEFAULT_HIGH_WIND_KMH: f64 = 30.0;
/// Default hourly precipitation above which rain is heavy, in mm.
pub const DEFAULT_HEAVY_RAIN_MM: f64 = 5.0;
/// Default temperature above which heat is severe, in °C.
pub const DEFAULT_SEVERE_HEAT_CELSIUS: f64 = 40.0;
/// Default temperature below which freezing is severe, in °C.
pub const DEFAULT_SEVERE_FREEZING_CELSIUS: f64 = -10.0;
/// Default sustained wind above which wind is severe, in km/h.
pub const DEFAULT_SEVERE_WIND_KMH: f64 = 50.0;
/// Default hourly precipitation above which rain is severe, in mm.
pub const DEFAULT_SEVERE_RAIN_MM: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    ExtremeHeat,
    Freezing,
    HighWind,
    HeavyRain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Severe,
}

/// Whether a value equal to a threshold counts as crossing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdBoundary {
    #[default]
    Exclusive,
    Inclusive,
}

impl ThresholdBoundary {
    fn above(self, value: f64, limit: f64) -> bool {
        match self {
            ThresholdBoundary::Exclusive => value > limit,
            ThresholdBoundary::Inclusive => value >= limit,
        }
    }

    fn below(self, value: f64, limit: f64) -> bool {
        match self {
            ThresholdBoundary::Exclusive => value < limit,
            ThresholdBoundary::Inclusive => value <= limit,
        }
    }
}

/// Tunable hazard thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub extreme_heat_celsius: f64,
    pub freezing_celsius: f64,
    pub high_wind_kmh: f64,
    pub heavy_rain_mm: f64,
    /// Levels at which an alert is raised to [`Severity::Severe`].
    pub severe_heat_celsius: f64,
    pub severe_freezing_celsius: f64,
    pub severe_wind_kmh: f64,
    pub severe_rain_mm: f64,
    pub boundary: ThresholdBoundary,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            extreme_heat_celsius: DEFAULT_EXTREME_HEAT_CELSIUS,
            freezing_celsius: DEFAULT_FREEZING_CELSIUS,
            high_wind_kmh: DEFAULT_HIGH_WIND_KMH,
            heavy_rain_mm: DEFAULT_HEAVY_RAIN_MM,
            severe_heat_celsius: DEFAULT_SEVERE_HEAT_CELSIUS,
            severe_freezing_celsius: DEFAULT_SEVERE_FREEZING_CELSIUS,
            severe_wind_kmh: DEFAULT_SEVERE_WIND_KMH,
            severe_rain_mm: DEFAULT_SEVERE_RAIN_MM,
            boundary: ThresholdBoundary::Exclusive,
        }
    }
}

/// Which hazards a single sample triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HazardFlags {
    pub extreme_heat: bool,
    pub freezing: bool,
    pub high_wind: bool,
    pub heavy_rain: bool,
}

impl HazardFlags {
    pub fn any(&self) -> bool {
        self.extreme_heat || self.freezing || self.high_wind || self.heavy_rain
    }

    pub fn contains(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::ExtremeHeat => self.extreme_heat,
            AlertKind::Freezing => self.freezing,
            AlertKind::HighWind => self.high_wind,
            AlertKind::HeavyRain => self.heavy_rain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub point_index: usize,
    pub severity: Severity,
    /// The sample value that crossed the threshold.
    pub value: f64,
}

/// Alerts for a whole route, flat and grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
    pub by_kind: EnumMap<AlertKind, Vec<Alert>>,
}

impl AlertReport {
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn of_kind(&self, kind: AlertKind) -> &[Alert] {
        &self.by_kind[kind]
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertDetector {
    thresholds: AlertThresholds,
}

impl AlertDetector {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn detect(&self, sample: &WeatherSample) -> HazardFlags {
        let t = &self.thresholds;
        let b = t.boundary;
        HazardFlags {
            extreme_heat: b.above(sample.temperature, t.extreme_heat_celsius),
            freezing: b.below(sample.temperature, t.freezing_celsius),
            high_wind: b.above(sample.wind_speed, t.high_wind_kmh),
            heavy_rain: b.above(sample.precipitation, t.heavy_rain_mm),
        }
    }

    /// Scan every resolved sample in point order. Missing samples raise nothing.
    pub fn detect_all(&self, samples: &[Option<WeatherSample>]) -> AlertReport {
        let mut report = AlertReport::default();

        for (point_index, sample) in samples.iter().enumerate() {
            let Some(sample) = sample else { continue };
            let flags = self.detect(sample);
            if !flags.any() {
                continue;
            }

            for kind in [
                AlertKind::ExtremeHeat,
                AlertKind::Freezing,
                AlertKind::HighWind,
                AlertKind::HeavyRain,
            ] {
                if flags.contains(kind) {
                    let alert = self.build_alert(kind, point_index, sample);
                    report.alerts.push(alert);
                    report.by_kind[kind].push(alert);
                }
            }
        }

        report
    }

    fn build_alert(&self, kind: AlertKind, point_index: usize, sample: &WeatherSample) -> Alert {
        let t = &self.thresholds;
        let b = t.boundary;
        let (value, severe) = match kind {
            AlertKind::ExtremeHeat => (
                sample.temperature,
                b.above(sample.temperature, t.severe_heat_celsius),
            ),
            AlertKind::Freezing => (
                sample.temperature,
                b.below(sample.temperature, t.severe_freezing_celsius),
            ),
            AlertKind::HighWind => (sample.wind_speed, b.above(sample.wind_speed, t.severe_wind_kmh)),
            AlertKind::HeavyRain => (
                sample.precipitation,
                b.above(sample.precipitation, t.severe_rain_mm),
            ),
        };

        Alert {
            kind,
            point_index,
            severity: if severe { Severity::Severe } else { Severity::Warning },
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temperature: f64, wind_speed: f64, precipitation: f64) -> WeatherSample {
        WeatherSample {
            temperature,
            feels_like: None,
            humidity: 50.0,
            pressure: 1013.0,
            wind_speed,
            wind_direction: 180.0,
            wind_gust: None,
            precipitation,
            precipitation_probability: None,
            uv_index: None,
            cloud_cover: 20.0,
            weather_code: 1,
            weather_description: "Mainly clear".to_string(),
        }
    }

    #[test]
    fn test_each_hazard_triggers() {
        let d = AlertDetector::default();
        assert!(d.detect(&sample(36.0, 10.0, 0.0)).extreme_heat);
        assert!(d.detect(&sample(-1.0, 10.0, 0.0)).freezing);
        assert!(d.detect(&sample(15.0, 31.0, 0.0)).high_wind);
        assert!(d.detect(&sample(15.0, 10.0, 6.0)).heavy_rain);
    }

    #[test]
    fn test_exclusive_boundaries_do_not_trigger() {
        let d = AlertDetector::default();
        assert!(!d.detect(&sample(35.0, 30.0, 5.0)).any());
        assert!(!d.detect(&sample(0.0, 10.0, 0.0)).freezing);
    }

    #[test]
    fn test_inclusive_boundaries_trigger() {
        let d = AlertDetector::new(AlertThresholds {
            boundary: ThresholdBoundary::Inclusive,
            ..Default::default()
        });
        let flags = d.detect(&sample(35.0, 30.0, 5.0));
        assert!(flags.extreme_heat);
        assert!(flags.high_wind);
        assert!(flags.heavy_rain);
        assert!(d.detect(&sample(0.0, 10.0, 0.0)).freezing);
    }

    #[test]
    fn test_thresholds_are_tunable() {
        let d = AlertDetector::new(AlertThresholds {
            high_wind_kmh: 31.0,
            ..Default::default()
        });
        assert!(!d.detect(&sample(15.0, 31.0, 0.0)).high_wind);
        assert!(d.detect(&sample(15.0, 31.5, 0.0)).high_wind);
    }

    #[test]
    fn test_detect_all_groups_in_point_order() {
        let d = AlertDetector::default();
        let samples = vec![
            Some(sample(36.0, 35.0, 0.0)),
            None,
            Some(sample(20.0, 10.0, 0.0)),
            Some(sample(38.0, 10.0, 7.0)),
            Some(sample(15.0, 45.0, 0.0)),
        ];

        let report = d.detect_all(&samples);

        let indices: Vec<(usize, AlertKind)> =
            report.alerts.iter().map(|a| (a.point_index, a.kind)).collect();
        assert_eq!(
            indices,
            vec![
                (0, AlertKind::ExtremeHeat),
                (0, AlertKind::HighWind),
                (3, AlertKind::ExtremeHeat),
                (3, AlertKind::HeavyRain),
                (4, AlertKind::HighWind),
            ]
        );

        let heat: Vec<usize> = report
            .of_kind(AlertKind::ExtremeHeat)
            .iter()
            .map(|a| a.point_index)
            .collect();
        assert_eq!(heat, vec![0, 3]);
        let wind: Vec<usize> = report
            .of_kind(AlertKind::HighWind)
            .iter()
            .map(|a| a.point_index)
            .collect();
        assert_eq!(wind, vec![0, 4]);
        assert!(report.of_kind(AlertKind::Freezing).is_empty());
    }

    #[test]
    fn test_missing_samples_raise_nothing() {
        let d = AlertDetector::default();
        let report = d.detect_all(&[None, None]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_severity_levels() {
        let d = AlertDetector::default();
        let report = d.detect_all(&[Some(sample(42.0, 55.0, 6.0)), Some(sample(-12.0, 10.0, 20.0))]);
        let by = |i: usize, kind: AlertKind| {
            report
                .alerts
                .iter()
                .find(|a| a.point_index == i && a.kind == kind)
                .map(|a| a.severity)
        };
        assert_eq!(by(0, AlertKind::ExtremeHeat), Some(Severity::Severe));
        assert_eq!(by(0, AlertKind::HighWind), Some(Severity::Severe));
        assert_eq!(by(0, AlertKind::HeavyRain), Some(Severity::Warning));
        assert_eq!(by(1, AlertKind::Freezing), Some(Severity::Severe));
        assert_eq!(by(1, AlertKind::HeavyRain), Some(Severity::Severe));
    }
}
