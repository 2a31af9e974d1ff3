//! SARSA(λ) temporal difference learning with eligibility traces
//!
//! The learner keeps two dense tables of shape `(N, M)`: action values `Q`
//! and eligibility traces `E`. Every decision closes the pending transition
//! and spreads its TD error over every recently visited pair in proportion to
//! its trace.
//!
//! ## Trace rules
//!
//! | Rule | Revisit behaviour | Typical use |
//! |------|-------------------|-------------|
//! | Accumulating | traces stack up | classic TD(λ) |
//! | Replacing | trace is reset to 1 | tabular control with loops |
//! | Dutch | `E (1 - α) + 1` | true-online style updates |
//!
//! ## Usage Example
//!
//! ```no_run
//! use pong_sarsa::features::FeatureKind;
//! use pong_sarsa::sarsa::{SarsaConfig, SarsaLambdaAgent, TraceRule};
//! use pong_sarsa::types::ActionSet;
//!
//! let config = SarsaConfig::default()
//!     .with_trace(TraceRule::Accumulating)
//!     .with_learning_rate(0.01)
//!     .with_lambda(0.8);
//! let agent = SarsaLambdaAgent::new(
//!     config,
//!     FeatureKind::BallIntercept.build(),
//!     ActionSet::from_codes([0, 2, 5])?,
//! )?;
//! # Ok::<(), pong_sarsa::Error>(())
//! ```

pub mod agent;
pub mod config;
pub mod serialization;
pub mod tables;
pub mod trace;

pub use agent::{Phase, SarsaLambdaAgent};
pub use config::SarsaConfig;
pub use serialization::{SavedSarsaAgent, TrainingMetadata};
pub use tables::{EligibilityTables, TdParams};
pub use trace::TraceRule;
