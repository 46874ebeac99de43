//! Weather enrichment of forecast points.
//!
//! Points whose rounded location and time bucket coincide share one request.
//! Requests run as spawned tasks gated by a semaphore, so no more than
//! [`EnrichmentConfig::max_concurrent_fetches`] provider calls are in flight.
//! Failed fetches are retried with exponential backoff; a request that
//! exhausts its retries leaves its slots empty and the rest of the route is
//! still enriched.

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info, trace, warn};

use crate::{
    errors::ProviderError,
    generation::{Generation, GenerationId},
    models::{ForecastPoint, WeatherSample},
    provider::WeatherProvider,
};

/// Default number of weather fetches allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 6;

/// Default retry attempts after the first failed fetch.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff between retries.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 250;

/// Default ceiling for a single backoff delay.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 4_000;

/// Default decimal places kept when comparing request coordinates (~1 km).
pub const DEFAULT_COORDINATE_PRECISION: u32 = 2;

/// Largest coordinate precision that keeps `coordinate * 10^precision`
/// inside `i64` for any valid latitude or longitude.
pub const MAX_COORDINATE_PRECISION: u32 = 9;

/// Default width of the time bucket used when comparing request times.
pub const DEFAULT_TIME_BUCKET_SECS: i64 = 3_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub max_concurrent_fetches: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_backoff_ms: u64,
    pub coordinate_precision: u32,
    pub time_bucket_secs: i64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            time_bucket_secs: DEFAULT_TIME_BUCKET_SECS,
        }
    }
}

impl EnrichmentConfig {
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base_ms = base.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Decimal places used for request keys, capped at
    /// [`MAX_COORDINATE_PRECISION`].
    pub fn effective_coordinate_precision(&self) -> u32 {
        self.coordinate_precision.min(MAX_COORDINATE_PRECISION)
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.min(20));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor).min(self.max_backoff_ms))
    }

    fn request_key(&self, point: &ForecastPoint) -> RequestKey {
        let scale = 10f64.powi(self.effective_coordinate_precision() as i32);
        RequestKey {
            lat: (point.lat * scale).round() as i64,
            lon: (point.lon * scale).round() as i64,
            bucket: point
                .timestamp
                .unix_timestamp()
                .div_euclid(self.time_bucket_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RequestKey {
    lat: i64,
    lon: i64,
    bucket: i64,
}

/// One provider request and the forecast points that share its result.
#[derive(Debug, Clone)]
struct PlannedRequest {
    lat: f64,
    lon: f64,
    timestamp: OffsetDateTime,
    indices: Vec<usize>,
}

/// Group points by request key, in order of first appearance.
fn plan_requests(points: &[ForecastPoint], config: &EnrichmentConfig) -> Vec<PlannedRequest> {
    let mut by_key: HashMap<RequestKey, usize> = HashMap::new();
    let mut requests: Vec<PlannedRequest> = Vec::new();

    for point in points {
        let key = config.request_key(point);
        match by_key.get(&key) {
            Some(&r) => requests[r].indices.push(point.index),
            None => {
                by_key.insert(key, requests.len());
                requests.push(PlannedRequest {
                    lat: point.lat,
                    lon: point.lon,
                    timestamp: point.timestamp,
                    indices: vec![point.index],
                });
            }
        }
    }

    requests
}

#[derive(Debug, Clone)]
enum FetchResult {
    Fetched(WeatherSample),
    Failed(ProviderError),
    Cancelled,
}

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Resolved(WeatherSample),
    Failed,
}

/// Per-point result slots. Each slot is written at most once.
#[derive(Debug)]
struct WeatherSlots {
    slots: Vec<Slot>,
}

impl WeatherSlots {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![Slot::Pending; len],
        }
    }

    fn write(&mut self, index: usize, result: &FetchResult) {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!(index, "Weather result for unknown point index");
            return;
        };
        if !matches!(slot, Slot::Pending) {
            return;
        }
        match result {
            FetchResult::Fetched(sample) => *slot = Slot::Resolved(sample.clone()),
            FetchResult::Failed(_) => *slot = Slot::Failed,
            FetchResult::Cancelled => {}
        }
    }

    /// Samples in point order plus the indices that permanently failed.
    ///
    /// Slots still pending belong to tasks that died without reporting and
    /// count as failed.
    fn finish(self) -> (Vec<Option<WeatherSample>>, Vec<usize>) {
        let mut failed = Vec::new();
        let samples = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Slot::Resolved(sample) => Some(sample),
                Slot::Failed | Slot::Pending => {
                    failed.push(i);
                    None
                }
            })
            .collect();
        (samples, failed)
    }
}

/// Result of one enrichment run, index-aligned with its forecast points.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub generation: GenerationId,
    pub samples: Vec<Option<WeatherSample>>,
    /// Points whose fetch failed after the retry budget was spent.
    pub failed: Vec<usize>,
    /// The run was superseded before every request settled.
    pub cancelled: bool,
    pub last_error: Option<ProviderError>,
}

impl EnrichmentOutcome {
    /// Aggregate error when no point at all received weather.
    pub fn error(&self) -> Option<ProviderError> {
        if self.cancelled || self.samples.is_empty() || self.samples.iter().any(Option::is_some) {
            return None;
        }
        let cause = self
            .last_error
            .as_ref()
            .map_or_else(|| "no response".to_string(), |e| e.message.clone());
        Some(ProviderError::permanent(format!(
            "weather unavailable for all {} points: {cause}",
            self.samples.len()
        )))
    }

    pub fn resolved_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }
}

/// Enrichment service bound to a provider and its limits.
#[derive(Clone)]
pub struct WeatherEnrichment {
    provider: Arc<dyn WeatherProvider>,
    config: EnrichmentConfig,
}

impl WeatherEnrichment {
    pub fn new(provider: Arc<dyn WeatherProvider>, config: EnrichmentConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Prepare a run for `points` that belongs to `generation`.
    pub fn job(&self, points: &[ForecastPoint], generation: Generation) -> EnrichmentJob {
        let requests = plan_requests(points, &self.config);
        debug!(
            generation = generation.id(),
            points = points.len(),
            requests = requests.len(),
            "Planned weather requests"
        );
        EnrichmentJob {
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
            generation,
            point_count: points.len(),
            requests,
        }
    }

    /// Convenience wrapper: plan and run in one call.
    pub async fn enrich(&self, points: &[ForecastPoint], generation: Generation) -> EnrichmentOutcome {
        self.job(points, generation).run().await
    }
}

/// A planned enrichment run. Independent of the session that created it.
pub struct EnrichmentJob {
    provider: Arc<dyn WeatherProvider>,
    config: EnrichmentConfig,
    generation: Generation,
    point_count: usize,
    requests: Vec<PlannedRequest>,
}

impl EnrichmentJob {
    pub fn generation(&self) -> GenerationId {
        self.generation.id()
    }

    /// Number of distinct provider requests after deduplication.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub async fn run(self) -> EnrichmentOutcome {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));
        let mut slots = WeatherSlots::new(self.point_count);
        let mut tasks = JoinSet::new();

        for (request_id, request) in self.requests.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let generation = self.generation.clone();
            let (lat, lon, timestamp) = (request.lat, request.lon, request.timestamp);

            tasks.spawn(async move {
                let result = fetch_with_retry(
                    provider.as_ref(),
                    &semaphore,
                    &config,
                    &generation,
                    lat,
                    lon,
                    timestamp,
                )
                .await;
                (request_id, result)
            });
        }

        let mut last_error = None;
        let mut cancelled = false;

        while let Some(joined) = tasks.join_next().await {
            let (request_id, result) = match joined {
                Ok(done) => done,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    warn!(generation = self.generation.id(), error = %e, "Weather fetch task failed");
                    continue;
                }
            };

            // A superseded run must not produce results, even ones that
            // arrived before the cancellation was observed.
            if self.generation.is_stale() {
                cancelled = true;
                tasks.abort_all();
                continue;
            }

            match &result {
                FetchResult::Failed(e) => last_error = Some(e.clone()),
                FetchResult::Cancelled => cancelled = true,
                FetchResult::Fetched(_) => {}
            }
            for &index in &self.requests[request_id].indices {
                slots.write(index, &result);
            }
        }

        cancelled |= self.generation.is_stale();
        let (samples, failed) = if cancelled {
            (vec![None; self.point_count], Vec::new())
        } else {
            slots.finish()
        };

        let outcome = EnrichmentOutcome {
            generation: self.generation.id(),
            samples,
            failed,
            cancelled,
            last_error,
        };

        if cancelled {
            debug!(generation = outcome.generation, "Enrichment superseded, results discarded");
        } else {
            info!(
                generation = outcome.generation,
                points = self.point_count,
                requests = self.requests.len(),
                resolved = outcome.resolved_count(),
                failed = outcome.failed.len(),
                "Enrichment finished"
            );
        }

        outcome
    }
}

async fn fetch_with_retry(
    provider: &dyn WeatherProvider,
    semaphore: &Semaphore,
    config: &EnrichmentConfig,
    generation: &Generation,
    lat: f64,
    lon: f64,
    timestamp: OffsetDateTime,
) -> FetchResult {
    let cancel = generation.cancellation_token();
    let mut last_error = ProviderError::retryable("no attempt made");

    for attempt in 0..=config.max_retries {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FetchResult::Cancelled,
            result = async {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Err(ProviderError::permanent("fetch limiter closed"));
                };
                provider.fetch(lat, lon, timestamp).await
            } => result,
        };

        match result {
            Ok(sample) => {
                trace!(provider = provider.name(), lat, lon, attempt, "Weather fetched");
                return FetchResult::Fetched(sample);
            }
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    lat,
                    lon,
                    attempt,
                    error = %e,
                    retryable = e.retryable,
                    "Weather fetch error"
                );
                let retryable = e.retryable;
                last_error = e;
                if !retryable {
                    break;
                }
            }
        }

        if attempt < config.max_retries {
            let backoff = config.backoff(attempt);
            trace!(backoff_ms = backoff.as_millis(), "Backoff before retry");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return FetchResult::Cancelled,
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }

    FetchResult::Failed(last_error)
}
