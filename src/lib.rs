//! Online SARSA(λ) control for Pong over a discretised pixel-derived state
//!
//! This crate provides:
//! - Paddle and ball tracking on raw Atari-geometry frames, with intercept
//!   prediction ([`pong`])
//! - Discrete state features and a bijective state indexer ([`features`])
//! - A tabular SARSA(λ) learner with accumulating, replacing and dutch
//!   eligibility traces, frame skipping and a linear epsilon schedule
//!   ([`sarsa`], [`schedule`])
//! - A seedable simulated court, an episode runner with observers, and
//!   MessagePack persistence ([`sim`], [`pipeline`], [`adapters`])
//!
//! The learner talks to the outside world only through the traits in
//! [`ports`].

pub mod adapters;
pub mod agents;
pub mod app;
pub mod cli;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod pong;
pub mod ports;
pub mod sarsa;
pub mod schedule;
pub mod sim;
pub mod types;

pub use error::{Error, Result};
pub use features::{FeatureKind, StateFeature};
pub use sarsa::{SarsaConfig, SarsaLambdaAgent, TraceRule};
pub use types::{ActionId, ActionSet};
