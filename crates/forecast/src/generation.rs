//! Generation tagging for forecast runs.
//!
//! Every new track or settings change starts a new generation. Work started
//! for an older generation keeps its [`Generation`] handle and uses it to
//! find out that it has been superseded.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio_util::sync::CancellationToken;

/// Monotonically increasing identifier of a forecast run.
pub type GenerationId = u64;

/// Source of generation identifiers, shared with in-flight work.
#[derive(Debug, Clone, Default)]
pub struct GenerationTracker {
    current: Arc<AtomicU64>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the active generation (0 before the first one).
    pub fn current(&self) -> GenerationId {
        self.current.load(Ordering::Acquire)
    }

    pub fn is_current(&self, id: GenerationId) -> bool {
        self.current() == id
    }

    /// Start a new generation. Previously issued handles become stale.
    pub fn advance(&self) -> Generation {
        let id = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        Generation {
            id,
            tracker: self.clone(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Handle carried by all work belonging to one generation.
#[derive(Debug, Clone)]
pub struct Generation {
    id: GenerationId,
    tracker: GenerationTracker,
    cancel: CancellationToken,
}

impl Generation {
    pub fn id(&self) -> GenerationId {
        self.id
    }

    /// Whether no newer generation has been started.
    pub fn is_current(&self) -> bool {
        self.tracker.is_current(self.id)
    }

    /// Whether results for this generation should be dropped.
    pub fn is_stale(&self) -> bool {
        self.cancel.is_cancelled() || !self.is_current()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
