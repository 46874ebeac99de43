//! One active forecast and its generation lifecycle.
//!
//! `Empty → Sampling → Scheduled → Enriching → Ready`, with `Error` reached
//! when the track cannot be sampled or the settings cannot be scheduled.
//! Loading a track or changing settings always starts a new generation,
//! cancels enrichment still running for the previous one and clears the
//! selection.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    alerts::{AlertDetector, AlertReport},
    config::ForecastConfig,
    enrichment::{EnrichmentJob, EnrichmentOutcome, WeatherEnrichment},
    errors::ForecastError,
    generation::{Generation, GenerationId, GenerationTracker},
    models::{ForecastPoint, RouteSettings, TrackPoint, WeatherSample},
    provider::WeatherProvider,
    report::ForecastReport,
    sampler::sample_route,
    scheduler::schedule,
    selection::SelectionCoordinator,
    summary::{WeatherSummary, summarize},
};

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Empty,
    Sampling,
    Scheduled,
    Enriching,
    Ready,
    Error(ForecastError),
}

impl GenerationState {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationState::Empty => "empty",
            GenerationState::Sampling => "sampling",
            GenerationState::Scheduled => "scheduled",
            GenerationState::Enriching => "enriching",
            GenerationState::Ready => "ready",
            GenerationState::Error(_) => "error",
        }
    }
}

/// What happened to an enrichment outcome handed back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The outcome belonged to a superseded generation and was dropped.
    Stale,
    /// Samples stored; `warning` is set when no point received weather.
    Applied { warning: Option<ForecastError> },
}

pub struct ForecastSession {
    enrichment: WeatherEnrichment,
    detector: AlertDetector,
    settings: RouteSettings,
    track: Option<Vec<TrackPoint>>,
    tracker: GenerationTracker,
    generation: Generation,
    points: Vec<ForecastPoint>,
    samples: Vec<Option<WeatherSample>>,
    alerts: AlertReport,
    warning: Option<ForecastError>,
    selection: SelectionCoordinator,
    state_tx: watch::Sender<GenerationState>,
}

impl ForecastSession {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        settings: RouteSettings,
        config: ForecastConfig,
    ) -> Result<Self, ForecastError> {
        settings.validate()?;

        let tracker = GenerationTracker::new();
        let generation = tracker.advance();
        let (state_tx, _rx) = watch::channel(GenerationState::Empty);

        Ok(Self {
            enrichment: WeatherEnrichment::new(provider, config.enrichment),
            detector: AlertDetector::new(config.thresholds),
            settings,
            track: None,
            tracker,
            generation,
            points: Vec::new(),
            samples: Vec::new(),
            alerts: AlertReport::default(),
            warning: None,
            selection: SelectionCoordinator::default(),
            state_tx,
        })
    }

    /// Replace the track and build a new generation from it.
    pub fn load_track(&mut self, track: Vec<TrackPoint>) -> Result<GenerationId, ForecastError> {
        self.start_generation();
        self.track = Some(track);
        self.generate()
    }

    /// Replace the settings. Without a track the session stays empty.
    pub fn update_settings(&mut self, settings: RouteSettings) -> Result<GenerationId, ForecastError> {
        self.start_generation();
        if let Err(e) = settings.validate() {
            return Err(self.fail(e));
        }
        self.settings = settings;
        self.generate()
    }

    /// Hand out the enrichment run for the current generation.
    ///
    /// Returns `None` unless the forecast points are scheduled and waiting
    /// for weather.
    ///
    /// The session stays in `Enriching` until the job's outcome is passed to
    /// [`apply_enrichment`](Self::apply_enrichment). If the job is dropped
    /// instead, only `load_track` or `update_settings` leaves that state.
    pub fn begin_enrichment(&mut self) -> Option<EnrichmentJob> {
        if self.state() != GenerationState::Scheduled {
            return None;
        }
        self.set_state(GenerationState::Enriching);
        Some(self.enrichment.job(&self.points, self.generation.clone()))
    }

    /// Store the result of an enrichment run if it is still current.
    pub fn apply_enrichment(&mut self, outcome: EnrichmentOutcome) -> Result<ApplyOutcome, ForecastError> {
        if outcome.generation != self.generation.id()
            || outcome.cancelled
            || self.state() != GenerationState::Enriching
        {
            debug!(
                outcome_generation = outcome.generation,
                current_generation = self.generation.id(),
                "Discarding stale enrichment outcome"
            );
            return Ok(ApplyOutcome::Stale);
        }

        if outcome.samples.len() != self.points.len() {
            let e = ForecastError::Mismatch {
                points: self.points.len(),
                samples: outcome.samples.len(),
            };
            error!("{e}");
            self.set_state(GenerationState::Error(e.clone()));
            return Err(e);
        }

        self.alerts = self.detector.detect_all(&outcome.samples);
        self.warning = outcome.error().map(ForecastError::from);
        self.samples = outcome.samples;

        if let Some(w) = &self.warning {
            warn!(generation = self.generation.id(), "{w}");
        }
        info!(
            generation = self.generation.id(),
            points = self.points.len(),
            alerts = self.alerts.alerts.len(),
            "Forecast ready"
        );
        self.set_state(GenerationState::Ready);

        Ok(ApplyOutcome::Applied {
            warning: self.warning.clone(),
        })
    }

    /// Run enrichment for the current generation to completion.
    ///
    /// Returns the non-fatal provider warning, if any.
    pub async fn enrich(&mut self) -> Result<Option<ForecastError>, ForecastError> {
        let Some(job) = self.begin_enrichment() else {
            return Ok(None);
        };
        let outcome = job.run().await;
        match self.apply_enrichment(outcome)? {
            ApplyOutcome::Applied { warning } => Ok(warning),
            ApplyOutcome::Stale => Ok(None),
        }
    }

    pub fn state(&self) -> GenerationState {
        self.state_tx.borrow().clone()
    }

    /// Observe generation state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<GenerationState> {
        self.state_tx.subscribe()
    }

    pub fn generation(&self) -> GenerationId {
        self.generation.id()
    }

    pub fn settings(&self) -> &RouteSettings {
        &self.settings
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Weather per forecast point; `None` while unresolved or after failure.
    pub fn samples(&self) -> &[Option<WeatherSample>] {
        &self.samples
    }

    pub fn alerts(&self) -> &AlertReport {
        &self.alerts
    }

    pub fn warning(&self) -> Option<&ForecastError> {
        self.warning.as_ref()
    }

    pub fn summary(&self) -> WeatherSummary {
        summarize(&self.samples)
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    /// Select a forecast point from any view. Out-of-range indices are ignored.
    pub fn select(&self, index: usize) -> bool {
        self.selection.select(index)
    }

    /// Points paired with their weather, checked for index alignment.
    pub fn points_with_weather(
        &self,
    ) -> Result<impl Iterator<Item = (&ForecastPoint, Option<&WeatherSample>)>, ForecastError> {
        if self.points.len() != self.samples.len() {
            let e = ForecastError::Mismatch {
                points: self.points.len(),
                samples: self.samples.len(),
            };
            error!("{e}");
            return Err(e);
        }
        Ok(self.points.iter().zip(self.samples.iter().map(Option::as_ref)))
    }

    pub fn report(&self) -> Result<ForecastReport, ForecastError> {
        ForecastReport::build(self)
    }

    fn start_generation(&mut self) {
        self.generation.cancel();
        self.generation = self.tracker.advance();
        self.points.clear();
        self.samples.clear();
        self.alerts = AlertReport::default();
        self.warning = None;
        self.selection.reset(0);
        debug!(generation = self.generation.id(), "Started forecast generation");
    }

    fn generate(&mut self) -> Result<GenerationId, ForecastError> {
        let Some(track) = self.track.as_deref() else {
            self.set_state(GenerationState::Empty);
            return Ok(self.generation.id());
        };

        self.set_state(GenerationState::Sampling);
        let sampled = match sample_route(track, f64::from(self.settings.weather_interval_km)) {
            Ok(points) => points,
            Err(e) => return Err(self.fail(e)),
        };

        let scheduled = match schedule(
            sampled,
            self.settings.start_time,
            f64::from(self.settings.avg_speed_kmh),
        ) {
            Ok(points) => points,
            Err(e) => return Err(self.fail(e)),
        };

        self.samples = vec![None; scheduled.len()];
        self.selection.reset(scheduled.len());
        self.points = scheduled;
        self.set_state(GenerationState::Scheduled);

        Ok(self.generation.id())
    }

    fn fail(&mut self, e: ForecastError) -> ForecastError {
        warn!(generation = self.generation.id(), "Forecast generation failed: {e}");
        self.set_state(GenerationState::Error(e.clone()));
        e
    }

    fn set_state(&self, state: GenerationState) {
        debug!(
            generation = self.generation.id(),
            state = state.label(),
            "Forecast state transition"
        );
        self.state_tx.send_replace(state);
    }
}
