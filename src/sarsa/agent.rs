//! On-line SARSA(λ) agent over an indexed state feature

use std::any::Any;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;
use tracing::debug;

use super::{config::SarsaConfig, tables::EligibilityTables};
use crate::{
    Result,
    adapters::NoopTelemetry,
    features::{AnyFeature, StateFeature, StateIndexer},
    ports::{Agent, DecisionEvent, EpisodeReset, FrameSource, Settings, Telemetry},
    schedule::{LinearSchedule, RepeatGate},
    types::ActionSet,
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Where the agent is within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No decision has been taken yet this episode.
    AwaitFirstState,
    /// A `(state, action)` pair is waiting for its successor.
    Stepping,
}

/// Tabular SARSA(λ) learner with epsilon-greedy exploration and action repeat.
///
/// Each call to [`Agent::select_action`] processes the frame (so velocity
/// based features see every tick), then either repeats the last action or
/// takes a fresh decision. A fresh decision closes the pending transition
/// with the reward summed since the previous decision:
///
/// ```text
/// d  = r + γ Q(s', a') - Q(s, a)
/// E(s, a) <- trace rule
/// Q += α d E
/// E *= γ λ
/// ```
///
/// # Examples
///
/// ```
/// use ndarray::Array2;
/// use pong_sarsa::features::FeatureKind;
/// use pong_sarsa::ports::Agent;
/// use pong_sarsa::sarsa::{SarsaConfig, SarsaLambdaAgent};
/// use pong_sarsa::types::ActionSet;
///
/// let actions = ActionSet::from_codes([0, 2, 5])?;
/// let config = SarsaConfig::default().with_seed(1);
/// let mut agent = SarsaLambdaAgent::new(config, FeatureKind::RelativeBall.build(), actions)?;
///
/// let frame = Array2::<u8>::zeros((210, 160));
/// let index = agent.select_action(&frame)?;
/// assert!(index < 3);
/// agent.receive_reward(1.0);
/// agent.on_episode_end()?;
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
pub struct SarsaLambdaAgent<F: StateFeature = AnyFeature> {
    config: SarsaConfig,
    indexer: StateIndexer<F>,
    actions: ActionSet,
    tables: EligibilityTables,
    epsilon: LinearSchedule,
    gate: RepeatGate,
    rng: StdRng,
    pending: Option<(usize, usize)>,
    reward: f64,
    decisions: u64,
    episode_decisions: u64,
    telemetry: Box<dyn Telemetry>,
}

impl<F: StateFeature> SarsaLambdaAgent<F> {
    pub const NAME: &'static str = "sarsa-lambda";

    /// Build a fresh agent with zeroed tables sized by the feature's domain
    /// and the action set.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if `config` is out of range or the
    /// feature's enumeration is empty or has duplicates.
    pub fn new(config: SarsaConfig, feature: F, actions: ActionSet) -> Result<Self> {
        config.validate()?;
        let indexer = StateIndexer::new(feature)?;
        let tables = EligibilityTables::new(indexer.len(), actions.len(), config.td_params())?;
        Self::assemble(config, indexer, actions, tables, 0)
    }

    /// Rebuild an agent around previously learned tables.
    pub(crate) fn restore(
        config: SarsaConfig,
        feature: F,
        actions: ActionSet,
        tables: EligibilityTables,
        decisions: u64,
    ) -> Result<Self> {
        config.validate()?;
        let indexer = StateIndexer::new(feature)?;
        Self::assemble(config, indexer, actions, tables, decisions)
    }

    fn assemble(
        config: SarsaConfig,
        indexer: StateIndexer<F>,
        actions: ActionSet,
        tables: EligibilityTables,
        decisions: u64,
    ) -> Result<Self> {
        let mut epsilon = config.epsilon_schedule()?;
        epsilon.set_step(decisions);
        Ok(Self {
            gate: RepeatGate::every(config.frames_per_action),
            rng: build_rng(config.seed),
            config,
            indexer,
            actions,
            tables,
            epsilon,
            pending: None,
            reward: 0.0,
            decisions,
            episode_decisions: 0,
            telemetry: Box::new(NoopTelemetry),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.config.seed = Some(seed);
        self
    }

    pub fn with_telemetry<T: Telemetry + 'static>(mut self, telemetry: T) -> Self {
        self.telemetry = Box::new(telemetry);
        self
    }

    pub fn config(&self) -> &SarsaConfig {
        &self.config
    }

    pub fn tables(&self) -> &EligibilityTables {
        &self.tables
    }

    pub fn indexer(&self) -> &StateIndexer<F> {
        &self.indexer
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::Stepping
        } else {
            Phase::AwaitFirstState
        }
    }

    /// The `(state, action)` pair awaiting its update.
    pub fn pending(&self) -> Option<(usize, usize)> {
        self.pending
    }

    /// Reward accumulated since the last decision.
    pub fn pending_reward(&self) -> f64 {
        self.reward
    }

    /// Decisions taken over the agent's lifetime.
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    /// Exploration rate the next decision will use.
    pub fn epsilon(&self) -> f64 {
        self.epsilon.value()
    }

    pub(crate) fn into_parts(self) -> (SarsaConfig, F, ActionSet, EligibilityTables, u64) {
        (
            self.config,
            self.indexer.into_feature(),
            self.actions,
            self.tables,
            self.decisions,
        )
    }

    fn epsilon_greedy(&mut self, state: usize, epsilon: f64) -> Result<(usize, bool)> {
        if self.rng.random::<f64>() < epsilon {
            Ok((self.rng.random_range(0..self.actions.len()), true))
        } else {
            Ok((self.tables.greedy(state)?, false))
        }
    }

    fn decide(&mut self, state: usize) -> Result<usize> {
        let epsilon = self.epsilon.value();
        let (action, explored) = self.epsilon_greedy(state, epsilon)?;
        let reward = self.reward;

        let previous = self.pending;
        let td_error = match previous {
            Some((s, a)) => Some(self.tables.update(s, a, reward, state, action)?),
            None => None,
        };

        self.epsilon.next();
        self.reward = 0.0;
        self.pending = Some((state, action));
        self.gate.set(action);
        self.decisions += 1;
        self.episode_decisions += 1;

        self.telemetry.on_decision(&DecisionEvent {
            decision: self.decisions,
            previous,
            state,
            action,
            reward,
            td_error,
            epsilon,
            explored,
        });
        Ok(action)
    }
}

impl<F: StateFeature + 'static> Agent for SarsaLambdaAgent<F> {
    fn select_action(&mut self, frames: &dyn FrameSource) -> Result<usize> {
        let state = self.indexer.process(frames)?;
        if let Some(action) = self.gate.next() {
            self.telemetry.on_repeat(action);
            return Ok(action);
        }
        self.decide(state)
    }

    fn receive_reward(&mut self, reward: f64) {
        self.reward += reward;
        self.telemetry.on_reward(reward, self.reward);
    }

    fn on_episode_start(&mut self) -> Result<()> {
        self.tables.reset_traces();
        self.indexer.reset();
        Ok(())
    }

    fn on_episode_end(&mut self) -> Result<()> {
        let reward = self.reward;
        let terminal_td_error = match self.pending {
            Some((state, action)) => Some(self.tables.terminal_update(state, action, reward)?),
            None => None,
        };

        self.tables.reset_traces();
        self.indexer.reset();
        self.gate.clear();
        self.pending = None;
        self.reward = 0.0;

        let event = EpisodeReset {
            decisions: self.episode_decisions,
            terminal_td_error,
            reward,
        };
        debug!(
            decisions = event.decisions,
            reward,
            td_error = ?terminal_td_error,
            epsilon = self.epsilon.value(),
            "episode closed"
        );
        self.telemetry.on_episode_reset(&event);
        self.episode_decisions = 0;
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn settings(&self) -> Settings {
        let mut settings = self.config.settings();
        settings.insert("agent".into(), json!(Self::NAME));
        settings.insert("feature".into(), json!(self.indexer.name()));
        settings.insert("states".into(), json!(self.indexer.len()));
        settings.insert(
            "actions".into(),
            json!(self.actions.iter().map(|a| a.0).collect::<Vec<_>>()),
        );
        settings
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        self.config.seed = Some(seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
