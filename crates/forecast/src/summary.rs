use serde::Serialize;

use crate::models::WeatherSample;

/// A streaming aggregate over the weather samples of a route.
pub trait WeatherMetric {
    type Score;
    fn next_sample(&mut self, sample: Option<&WeatherSample>);
    fn finish(&mut self) -> Self::Score;
}

/// Route-level weather aggregates. Extremes are `None` when no sample resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub max_wind_speed: Option<f64>,
    pub max_wind_gust: Option<f64>,
    pub total_precipitation: f64,
    pub resolved_points: usize,
    pub unavailable_points: usize,
}

pub fn summarize(samples: &[Option<WeatherSample>]) -> WeatherSummary {
    let mut acc = Metrics::default();
    for sample in samples {
        acc.next_sample(sample.as_ref());
    }
    acc.finish()
}

#[derive(Debug, Clone, Default)]
struct Metrics {
    temperature: TemperatureRange,
    wind: WindMetric,
    precipitation: PrecipitationMetric,
    coverage: CoverageMetric,
}

impl WeatherMetric for Metrics {
    type Score = WeatherSummary;

    fn next_sample(&mut self, sample: Option<&WeatherSample>) {
        self.temperature.next_sample(sample);
        self.wind.next_sample(sample);
        self.precipitation.next_sample(sample);
        self.coverage.next_sample(sample);
    }

    fn finish(&mut self) -> WeatherSummary {
        let (min_temperature, max_temperature) = self.temperature.finish().unzip();
        let (max_wind_speed, max_wind_gust) = self.wind.finish().unzip();
        let (resolved_points, unavailable_points) = self.coverage.finish();
        WeatherSummary {
            min_temperature,
            max_temperature,
            max_wind_speed,
            max_wind_gust,
            total_precipitation: self.precipitation.finish(),
            resolved_points,
            unavailable_points,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TemperatureRange {
    range: Option<(f64, f64)>,
}

impl WeatherMetric for TemperatureRange {
    type Score = Option<(f64, f64)>;

    fn next_sample(&mut self, sample: Option<&WeatherSample>) {
        let Some(s) = sample else { return };
        self.range = Some(match self.range {
            Some((lo, hi)) => (lo.min(s.temperature), hi.max(s.temperature)),
            None => (s.temperature, s.temperature),
        });
    }

    fn finish(&mut self) -> Option<(f64, f64)> {
        self.range
    }
}

#[derive(Debug, Clone, Default)]
struct WindMetric {
    peak: Option<(f64, f64)>,
}

impl WeatherMetric for WindMetric {
    type Score = Option<(f64, f64)>;

    fn next_sample(&mut self, sample: Option<&WeatherSample>) {
        let Some(s) = sample else { return };
        let gust = s.wind_gust();
        self.peak = Some(match self.peak {
            Some((speed, g)) => (speed.max(s.wind_speed), g.max(gust)),
            None => (s.wind_speed, gust),
        });
    }

    fn finish(&mut self) -> Option<(f64, f64)> {
        self.peak
    }
}

#[derive(Debug, Clone, Default)]
struct PrecipitationMetric {
    total: f64,
}

impl WeatherMetric for PrecipitationMetric {
    type Score = f64;

    fn next_sample(&mut self, sample: Option<&WeatherSample>) {
        if let Some(s) = sample {
            self.total += s.precipitation;
        }
    }

    fn finish(&mut self) -> f64 {
        self.total
    }
}

#[derive(Debug, Clone, Default)]
struct CoverageMetric {
    resolved: usize,
    unavailable: usize,
}

impl WeatherMetric for CoverageMetric {
    type Score = (usize, usize);

    fn next_sample(&mut self, sample: Option<&WeatherSample>) {
        match sample {
            Some(_) => self.resolved += 1,
            None => self.unavailable += 1,
        }
    }

    fn finish(&mut self) -> (usize, usize) {
        (self.resolved, self.unavailable)
    }
}
