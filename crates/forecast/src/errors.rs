use serde::Serialize;
use thiserror::Error;

/// Failure of a single weather fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    /// Whether another attempt could succeed (timeouts, throttling, 5xx).
    pub retryable: bool,
}

impl ProviderError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        let retryable = e.is_timeout()
            || e.is_connect()
            || e.is_request()
            || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429);
        Self {
            message: e.to_string(),
            retryable,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Invalid settings: {0}")]
    Validation(String),

    #[error("Sampling error: {0}")]
    Sampling(String),

    #[error("GPX parsing error: {0}")]
    GpxParsing(String),

    #[error("Weather provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Forecast points and weather samples diverged ({points} points, {samples} samples)")]
    Mismatch { points: usize, samples: usize },
}

impl ForecastError {
    /// Whether the error prevents a forecast from being produced at all.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ForecastError::Provider(_))
    }

    /// Text suitable for showing to the person who uploaded the route.
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::Validation(msg)
            | ForecastError::Sampling(msg)
            | ForecastError::GpxParsing(msg) => format!("Cannot generate forecast: {msg}"),
            ForecastError::Provider(e) => {
                format!("Weather unavailable for this route: {}", e.message)
            }
            ForecastError::Mismatch { .. } => {
                tracing::error!("{self}");
                "Cannot generate forecast: internal error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let e = ForecastError::Sampling("insufficient route data".to_string());
        assert_eq!(
            e.user_message(),
            "Cannot generate forecast: insufficient route data"
        );
        assert!(e.is_fatal());

        let e = ForecastError::from(ProviderError::retryable("all 4 points failed"));
        assert!(e.user_message().starts_with("Weather unavailable"));
        assert!(!e.is_fatal());
    }

    #[test]
    fn test_mismatch_is_not_user_input_error() {
        let e = ForecastError::Mismatch {
            points: 3,
            samples: 2,
        };
        assert!(e.is_fatal());
        assert_eq!(e.user_message(), "Cannot generate forecast: internal error");
    }
}
