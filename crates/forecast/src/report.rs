//! Serializable snapshot of a forecast session.

use serde::Serialize;

use crate::{
    alerts::AlertReport,
    errors::ForecastError,
    generation::GenerationId,
    models::{ForecastPoint, RouteSettings, WeatherSample},
    session::ForecastSession,
    summary::WeatherSummary,
};

#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub generation: GenerationId,
    pub state: &'static str,
    pub settings: RouteSettings,
    pub points: Vec<PointReport>,
    pub alerts: AlertReport,
    pub summary: WeatherSummary,
    /// User-facing warning when weather could not be fetched.
    pub warning: Option<String>,
    pub selected_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PointReport {
    #[serde(flatten)]
    pub point: ForecastPoint,
    /// `None` when weather is unavailable for this point.
    pub weather: Option<WeatherSample>,
}

impl ForecastReport {
    pub fn build(session: &ForecastSession) -> Result<Self, ForecastError> {
        let points = session
            .points_with_weather()?
            .map(|(point, weather)| PointReport {
                point: *point,
                weather: weather.cloned(),
            })
            .collect();

        Ok(Self {
            generation: session.generation(),
            state: session.state().label(),
            settings: *session.settings(),
            points,
            alerts: session.alerts().clone(),
            summary: session.summary(),
            warning: session.warning().map(ForecastError::user_message),
            selected_index: session.selection().selected(),
        })
    }
}
