//! The single "currently selected point" shared by map, timeline and charts.
//!
//! Consumers subscribe with [`SelectionCoordinator::subscribe`] and read the
//! latest value from their receiver. Every accepted change is published
//! before `select` returns; a consumer that reads late sees only the newest
//! selection.

use tokio::sync::watch;

/// Selection state. `None` means no point is selected.
pub type SelectedIndex = Option<usize>;

#[derive(Debug)]
pub struct SelectionCoordinator {
    point_count: usize,
    tx: watch::Sender<SelectedIndex>,
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SelectionCoordinator {
    pub fn new(point_count: usize) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { point_count, tx }
    }

    /// Register a consumer. The receiver starts at the current selection.
    pub fn subscribe(&self) -> watch::Receiver<SelectedIndex> {
        self.tx.subscribe()
    }

    pub fn selected(&self) -> SelectedIndex {
        *self.tx.borrow()
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Select point `index`. Out-of-range indices are ignored.
    ///
    /// Returns whether the selection changed.
    pub fn select(&self, index: usize) -> bool {
        if index >= self.point_count {
            tracing::debug!(index, point_count = self.point_count, "Ignoring out-of-range selection");
            return false;
        }
        self.publish(Some(index))
    }

    /// Drop the current selection. Returns whether anything was selected.
    pub fn clear(&self) -> bool {
        self.publish(None)
    }

    /// Start over for a new generation with `point_count` points.
    pub fn reset(&mut self, point_count: usize) {
        self.point_count = point_count;
        self.publish(None);
    }

    fn publish(&self, value: SelectedIndex) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }
}
