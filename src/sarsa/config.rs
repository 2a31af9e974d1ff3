//! SARSA(λ) hyperparameters

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{tables::TdParams, trace::TraceRule};
use crate::{Error, Result, ports::Settings, schedule::LinearSchedule};

/// Hyperparameters of a [`SarsaLambdaAgent`](super::SarsaLambdaAgent).
///
/// # Examples
///
/// ```
/// use pong_sarsa::sarsa::{SarsaConfig, TraceRule};
///
/// let config = SarsaConfig::default()
///     .with_trace(TraceRule::Dutch)
///     .with_lambda(0.8)
///     .with_seed(7);
/// config.validate()?;
/// assert_eq!(config.frames_per_action, 4);
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarsaConfig {
    /// Ticks between decisions; the chosen action is repeated in between
    pub frames_per_action: usize,
    pub trace: TraceRule,
    pub learning_rate: f64,
    pub discount: f64,
    pub lambda: f64,
    /// `(decision, epsilon)` anchor points
    pub epsilon: Vec<(u64, f64)>,
    pub seed: Option<u64>,
}

impl Default for SarsaConfig {
    fn default() -> Self {
        Self {
            frames_per_action: 4,
            trace: TraceRule::Replacing,
            learning_rate: 0.001,
            discount: 0.99,
            lambda: 0.5,
            epsilon: vec![(0, 1.0), (10_000, 0.1)],
            seed: None,
        }
    }
}

impl SarsaConfig {
    pub fn with_frames_per_action(mut self, frames: usize) -> Self {
        self.frames_per_action = frames;
        self
    }

    pub fn with_trace(mut self, trace: TraceRule) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_epsilon(mut self, anchors: Vec<(u64, f64)>) -> Self {
        self.epsilon = anchors;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every parameter range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first bad parameter.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if self.frames_per_action == 0 {
            return invalid("frames_per_action must be at least 1".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return invalid(format!("discount must be in [0, 1], got {}", self.discount));
        }
        if !(0.0..=1.0).contains(&self.lambda) {
            return invalid(format!("lambda must be in [0, 1], got {}", self.lambda));
        }
        if let Some((step, value)) = self
            .epsilon
            .iter()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return invalid(format!("epsilon at step {step} must be in [0, 1], got {value}"));
        }
        self.epsilon_schedule().map(|_| ())
    }

    pub fn epsilon_schedule(&self) -> Result<LinearSchedule> {
        LinearSchedule::new(self.epsilon.clone())
    }

    pub fn td_params(&self) -> TdParams {
        TdParams {
            trace: self.trace,
            learning_rate: self.learning_rate,
            discount: self.discount,
            lambda: self.lambda,
        }
    }

    /// Flat view for logs and run headers.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new();
        settings.insert("frames_per_action".into(), json!(self.frames_per_action));
        settings.insert("trace".into(), json!(self.trace.as_str()));
        settings.insert("learning_rate".into(), json!(self.learning_rate));
        settings.insert("discount".into(), json!(self.discount));
        settings.insert("lambda".into(), json!(self.lambda));
        settings.insert("epsilon".into(), json!(self.epsilon));
        settings.insert("seed".into(), json!(self.seed));
        settings
    }
}
