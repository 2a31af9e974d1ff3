//! Observer port - abstraction for run observation and data collection
//!
//! Observers receive episode-loop events from the
//! [`EpisodeRunner`](crate::pipeline::EpisodeRunner) without coupling the loop
//! to any output format.

use crate::{
    Result,
    pipeline::{EpisodeSummary, RunSummary},
    ports::Settings,
    types::ActionId,
};

/// Observer trait for monitoring a run
///
/// # Event Sequence
///
/// 1. `on_run_start(settings, planned_episodes)` - once
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(...)` - for every tick
///    - `on_episode_end(summary)`
/// 3. `on_run_end(summary)` - once
///
/// # Examples
///
/// ```no_run
/// use pong_sarsa::{pipeline::EpisodeSummary, ports::Observer};
///
/// struct RewardLog(Vec<f64>);
///
/// impl Observer for RewardLog {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> pong_sarsa::Result<()> {
///         self.0.push(summary.total_reward);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called once before the first episode.
    ///
    /// `planned_episodes` is `None` when the run is bounded by a frame budget.
    fn on_run_start(&mut self, _settings: &Settings, _planned_episodes: Option<usize>) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after every executed tick with the action taken and the reward
    /// it earned.
    fn on_step(&mut self, _episode: usize, _step: u64, _action: ActionId, _reward: f64) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called once after the last episode. Use this to flush outputs.
    fn on_run_end(&mut self, _summary: &RunSummary) -> Result<()> {
        Ok(())
    }
}
