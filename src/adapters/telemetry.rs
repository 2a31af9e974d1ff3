//! Telemetry sinks for the learner.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::ports::{DecisionEvent, EpisodeReset, Telemetry};

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {}

/// Forwards learner events to `tracing`.
///
/// Decisions are logged at `trace` level, skipped ticks are not logged at
/// all, and episode resets are logged at `debug`. Every `summary_every`
/// decisions an `info` line with the running mean TD error is emitted.
#[derive(Debug, Clone)]
pub struct TracingTelemetry {
    summary_every: u64,
    td_sum: f64,
    td_count: u64,
}

impl TracingTelemetry {
    pub fn new() -> Self {
        Self::with_summary_every(10_000)
    }

    pub fn with_summary_every(decisions: u64) -> Self {
        Self {
            summary_every: decisions.max(1),
            td_sum: 0.0,
            td_count: 0,
        }
    }
}

impl Default for TracingTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry for TracingTelemetry {
    fn on_decision(&mut self, event: &DecisionEvent) {
        trace!(
            decision = event.decision,
            state = event.state,
            action = event.action,
            reward = event.reward,
            td_error = ?event.td_error,
            epsilon = event.epsilon,
            explored = event.explored,
            "decision"
        );

        if let Some(td) = event.td_error {
            self.td_sum += td.abs();
            self.td_count += 1;
        }
        if event.decision % self.summary_every == 0 && self.td_count > 0 {
            info!(
                decisions = event.decision,
                mean_abs_td_error = self.td_sum / self.td_count as f64,
                epsilon = event.epsilon,
                "learning progress"
            );
            self.td_sum = 0.0;
            self.td_count = 0;
        }
    }

    fn on_episode_reset(&mut self, event: &EpisodeReset) {
        debug!(
            decisions = event.decisions,
            reward = event.reward,
            terminal_td_error = ?event.terminal_td_error,
            "traces reset"
        );
    }
}

/// Running totals collected by [`CounterTelemetry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetryCounters {
    pub decisions: u64,
    pub updates: u64,
    pub explorations: u64,
    pub repeats: u64,
    pub rewards: u64,
    pub reward_total: f64,
    pub episodes: u64,
    pub abs_td_error_total: f64,
}

impl TelemetryCounters {
    pub fn mean_abs_td_error(&self) -> Option<f64> {
        (self.updates > 0).then(|| self.abs_td_error_total / self.updates as f64)
    }

    pub fn exploration_rate(&self) -> Option<f64> {
        (self.decisions > 0).then(|| self.explorations as f64 / self.decisions as f64)
    }
}

/// Counts events into shared [`TelemetryCounters`].
///
/// Clones share the same counters, so a handle kept by the caller can read
/// what the learner recorded.
#[derive(Debug, Clone, Default)]
pub struct CounterTelemetry {
    counters: Arc<Mutex<TelemetryCounters>>,
}

impl CounterTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TelemetryCounters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with<F: FnOnce(&mut TelemetryCounters)>(&self, f: F) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *counters);
    }
}

impl Telemetry for CounterTelemetry {
    fn on_decision(&mut self, event: &DecisionEvent) {
        self.with(|c| {
            c.decisions += 1;
            if event.explored {
                c.explorations += 1;
            }
            if let Some(td) = event.td_error {
                c.updates += 1;
                c.abs_td_error_total += td.abs();
            }
        });
    }

    fn on_repeat(&mut self, _action: usize) {
        self.with(|c| c.repeats += 1);
    }

    fn on_reward(&mut self, reward: f64, _pending: f64) {
        self.with(|c| {
            c.rewards += 1;
            c.reward_total += reward;
        });
    }

    fn on_episode_reset(&mut self, event: &EpisodeReset) {
        self.with(|c| {
            c.episodes += 1;
            if let Some(td) = event.terminal_td_error {
                c.updates += 1;
                c.abs_td_error_total += td.abs();
            }
        });
    }
}

/// Feeds every event to both sinks, first `A` then `B`.
impl<A: Telemetry, B: Telemetry> Telemetry for (A, B) {
    fn on_decision(&mut self, event: &DecisionEvent) {
        self.0.on_decision(event);
        self.1.on_decision(event);
    }

    fn on_repeat(&mut self, action: usize) {
        self.0.on_repeat(action);
        self.1.on_repeat(action);
    }

    fn on_reward(&mut self, reward: f64, pending: f64) {
        self.0.on_reward(reward, pending);
        self.1.on_reward(reward, pending);
    }

    fn on_episode_reset(&mut self, event: &EpisodeReset) {
        self.0.on_episode_reset(event);
        self.1.on_episode_reset(event);
    }
}
