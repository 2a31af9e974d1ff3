//! Configuration types for agent creation.

use serde::{Deserialize, Serialize};

use crate::{features::FeatureKind, sarsa::SarsaConfig};

/// Configuration for creating a SARSA(λ) agent.
///
/// Pairs the learner's hyperparameters with the state feature it learns
/// over, so the container can size the tables.
///
/// # Examples
///
/// ```
/// use pong_sarsa::app::AgentConfig;
/// use pong_sarsa::features::FeatureKind;
/// use pong_sarsa::sarsa::{SarsaConfig, TraceRule};
///
/// let config = AgentConfig::new(FeatureKind::BallIntercept)
///     .with_seed(42)
///     .with_sarsa(SarsaConfig::default().with_trace(TraceRule::Dutch));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// State feature the agent perceives the game through
    pub feature: FeatureKind,
    /// Learner hyperparameters
    pub sarsa: SarsaConfig,
}

impl AgentConfig {
    /// Create a configuration over `feature` with default hyperparameters.
    pub fn new(feature: FeatureKind) -> Self {
        Self {
            feature,
            sarsa: SarsaConfig::default(),
        }
    }

    pub fn with_sarsa(mut self, sarsa: SarsaConfig) -> Self {
        self.sarsa = sarsa;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sarsa.seed = Some(seed);
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.sarsa.seed
    }
}
