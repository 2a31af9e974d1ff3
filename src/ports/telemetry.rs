//! Telemetry port - structured events emitted by the learner
//!
//! A [`Telemetry`] value is handed to the learner as a capability. The learner
//! never prints; everything it wants to report goes through these hooks.

use serde::Serialize;

/// One completed decision step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionEvent {
    /// Decisions taken so far in the run, including this one.
    pub decision: u64,
    /// Previous state and action; `None` on the first decision of an episode.
    pub previous: Option<(usize, usize)>,
    pub state: usize,
    pub action: usize,
    /// Reward consumed by this step's update.
    pub reward: f64,
    /// `None` when no update was performed (first decision of an episode).
    pub td_error: Option<f64>,
    pub epsilon: f64,
    pub explored: bool,
}

/// Episode boundary handled by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpisodeReset {
    /// Decisions taken during the episode that just ended.
    pub decisions: u64,
    /// TD error of the terminal update, if a transition was pending.
    pub terminal_td_error: Option<f64>,
    /// Reward drained by the terminal update.
    pub reward: f64,
}

/// Observability hooks for a learner.
///
/// All methods default to no-ops.
pub trait Telemetry: Send {
    fn on_decision(&mut self, _event: &DecisionEvent) {}

    /// A skipped tick: `action` was repeated without learning.
    fn on_repeat(&mut self, _action: usize) {}

    /// A reward arrived; `pending` is the accumulated total after adding it.
    fn on_reward(&mut self, _reward: f64, _pending: f64) {}

    fn on_episode_reset(&mut self, _event: &EpisodeReset) {}
}
