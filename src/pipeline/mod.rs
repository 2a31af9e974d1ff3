//! Episode loop and run observation
//!
//! - [`EpisodeRunner`] drives any [`Agent`](crate::ports::Agent) against any
//!   [`Environment`](crate::ports::Environment) for a number of episodes or
//!   a frame budget
//! - Observers record progress, metrics and JSONL logs along the way

pub mod observers;
pub mod runner;

pub use observers::{JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver};
pub use runner::{EpisodeRunner, EpisodeSummary, RunConfig, RunSummary};

pub use crate::ports::Observer;
