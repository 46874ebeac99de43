//! Instrumented provider wrapper for concurrency and failure tests.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use forecast::{errors::ProviderError, models::WeatherSample, provider::WeatherProvider};

/// Which calls the wrapper fails instead of forwarding.
#[derive(Clone, Default)]
pub enum FailurePlan {
    #[default]
    Never,
    /// Every call fails.
    Always(ProviderError),
    /// The first `n` calls fail, later ones succeed.
    FirstCalls(usize, ProviderError),
    /// Calls whose coordinates match the predicate fail.
    Where(Arc<dyn Fn(f64, f64) -> bool + Send + Sync>, ProviderError),
}

impl FailurePlan {
    fn check(&self, call: usize, lat: f64, lon: f64) -> Result<(), ProviderError> {
        match self {
            FailurePlan::Never => Ok(()),
            FailurePlan::Always(e) => Err(e.clone()),
            FailurePlan::FirstCalls(n, e) if call < *n => Err(e.clone()),
            FailurePlan::FirstCalls(..) => Ok(()),
            FailurePlan::Where(pred, e) if pred(lat, lon) => Err(e.clone()),
            FailurePlan::Where(..) => Ok(()),
        }
    }
}

/// A single recorded provider call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedCall {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: OffsetDateTime,
}

/// Wraps a provider, delays each call and counts how many run at once.
pub struct RecordingProvider {
    inner: Arc<dyn WeatherProvider>,
    latency: Duration,
    failures: FailurePlan,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    log: Mutex<Vec<RecordedCall>>,
}

impl RecordingProvider {
    pub fn new(inner: Arc<dyn WeatherProvider>) -> Self {
        Self {
            inner,
            latency: Duration::ZERO,
            failures: FailurePlan::Never,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failures(mut self, failures: FailurePlan) -> Self {
        self.failures = failures;
        self
    }

    /// Calls started, including ones still running or dropped mid-flight.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran to completion, successful or not.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

/// Decrements the in-flight counter when a call finishes or is dropped.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(in_flight: &Arc<AtomicUsize>, max_in_flight: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WeatherProvider for RecordingProvider {
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        timestamp: OffsetDateTime,
    ) -> Result<WeatherSample, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(RecordedCall { lat, lon, timestamp });
        }

        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let result = match self.failures.check(call, lat, lon) {
            Ok(()) => self.inner.fetch(lat, lon, timestamp).await,
            Err(e) => Err(e),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "recording"
    }
}
