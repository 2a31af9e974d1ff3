//! Agent port - the contract between an episode loop and a learning agent
//!
//! The harness drives an agent with exactly four kinds of calls:
//!
//! 1. `select_action(frames)` once per game tick, returning an index into the
//!    legal action set supplied at construction
//! 2. `receive_reward(r)` zero or more times per tick
//! 3. `on_episode_start()` / `on_episode_end()` at episode boundaries
//! 4. `settings()` whenever it wants to log the agent's configuration

use std::{any::Any, collections::BTreeMap};

use crate::{Result, ports::FrameSource};

/// Flat key/value view of an agent's configuration, for logging.
pub type Settings = BTreeMap<String, serde_json::Value>;

/// Agent trait - unified interface for learning and baseline agents
///
/// # Examples
///
/// ```no_run
/// use pong_sarsa::ports::{Agent, Environment};
///
/// fn play_tick<A: Agent, E: Environment>(agent: &mut A, env: &mut E) -> pong_sarsa::Result<()> {
///     let index = agent.select_action(&*env)?;
///     let action = env.legal_actions().id(index)?;
///     let reward = env.act(action);
///     agent.receive_reward(reward);
///     Ok(())
/// }
/// ```
pub trait Agent: Send {
    /// Choose the action for the current tick.
    ///
    /// `frames` gives access to the current raw observation; agents read it
    /// at most once per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the perceived state falls outside the agent's
    /// enumerated state domain or the frame has the wrong shape.
    fn select_action(&mut self, frames: &dyn FrameSource) -> Result<usize>;

    /// Accumulate a reward observed since the last decision.
    ///
    /// Rewards arriving between two decisions are summed.
    fn receive_reward(&mut self, reward: f64);

    /// Called before the first tick of an episode.
    fn on_episode_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once after the last tick of an episode.
    fn on_episode_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Agent name, used in logs and summaries.
    fn name(&self) -> &str;

    /// Current configuration as a flat mapping.
    fn settings(&self) -> Settings;

    /// Reseed the agent's random number generator.
    ///
    /// Stateless agents can ignore it.
    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }

    /// Enable downcasting to concrete types (e.g. for persistence).
    fn as_any(&self) -> &dyn Any;
}
