//! Weather providers for tests and local runs without network access.
//!
//! - [`SyntheticProvider`]: deterministic weather from a [`Climate`](crate::config::Climate)
//! - [`RecordingProvider`]: wraps another provider, injects latency and
//!   failures, and records concurrency

mod recording;
mod synthetic;

pub use recording::{FailurePlan, RecordedCall, RecordingProvider};
pub use synthetic::SyntheticProvider;
