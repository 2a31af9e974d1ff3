//! Baseline agents implementing the [`Agent`](crate::ports::Agent) port.

pub mod uniform_random;

pub use uniform_random::UniformRandomAgent;
