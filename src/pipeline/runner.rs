//! Episode loop driving an agent against an environment

use std::{path::Path, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Error, Result,
    ports::{Agent, Environment, Observer},
    types::ActionSet,
};

/// Length of a run: exactly one of an episode count or a frame budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of complete episodes to play
    pub episodes: Option<usize>,
    /// Environment frames to consume; the episode in progress when the
    /// budget runs out is cut short
    pub frames: Option<u64>,
    /// Seed for the agent (and `seed + 1` for the environment)
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn episodes(episodes: usize) -> Self {
        Self {
            episodes: Some(episodes),
            frames: None,
            seed: None,
        }
    }

    pub fn frames(frames: u64) -> Self {
        Self {
            episodes: None,
            frames: Some(frames),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidRunLength`] unless exactly one of `episodes`
    /// and `frames` is set.
    pub fn validate(&self) -> Result<()> {
        match (self.episodes, self.frames) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (episodes, frames) => Err(Error::InvalidRunLength { episodes, frames }),
        }
    }
}

/// Outcome of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Zero-based episode index within the run
    pub episode: usize,
    /// Ticks executed
    pub frames: u64,
    /// Sum of rewards returned by the environment
    pub total_reward: f64,
    pub duration_secs: f64,
    /// Whether the environment reported game over (false when the frame
    /// budget cut the episode short)
    pub completed: bool,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub agent: String,
    pub episodes: usize,
    pub frames: u64,
    /// Total reward per episode, in order
    pub rewards: Vec<f64>,
    pub duration_secs: f64,
}

impl RunSummary {
    pub fn mean_reward(&self) -> Option<f64> {
        if self.rewards.is_empty() {
            None
        } else {
            Some(self.rewards.iter().sum::<f64>() / self.rewards.len() as f64)
        }
    }

    pub fn best_reward(&self) -> Option<f64> {
        self.rewards.iter().copied().reduce(f64::max)
    }

    /// Save summary to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load summary from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let summary = serde_json::from_reader(file)?;
        Ok(summary)
    }
}

/// Plays episodes until the configured episode count or frame budget is
/// reached.
///
/// Per tick: `select_action`, map the index to an action id, `act`, then
/// `receive_reward`. After each episode the agent is told the episode ended
/// and the environment is reset.
///
/// # Examples
///
/// ```
/// use pong_sarsa::agents::UniformRandomAgent;
/// use pong_sarsa::pipeline::{EpisodeRunner, RunConfig};
/// use pong_sarsa::sim::{CourtConfig, SimulatedPong};
///
/// let mut env = SimulatedPong::new(CourtConfig::default(), 1)?;
/// let mut agent = UniformRandomAgent::new(3);
/// let summary = EpisodeRunner::new(RunConfig::frames(300).with_seed(1))?.run(&mut agent, &mut env)?;
/// assert_eq!(summary.frames, 300);
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
pub struct EpisodeRunner {
    config: RunConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl EpisodeRunner {
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observers: Vec::new(),
        })
    }

    /// Add an observer to the runner
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run<E: Environment>(&mut self, agent: &mut dyn Agent, env: &mut E) -> Result<RunSummary> {
        if let Some(seed) = self.config.seed {
            agent.set_rng_seed(seed)?;
            env.set_rng_seed(seed.wrapping_add(1));
        }

        let actions = env.legal_actions();
        let settings = agent.settings();
        info!(
            agent = agent.name(),
            actions = %actions,
            episodes = ?self.config.episodes,
            frames = ?self.config.frames,
            "starting run"
        );
        for observer in &mut self.observers {
            observer.on_run_start(&settings, self.config.episodes)?;
        }

        let start = Instant::now();
        let start_frame = env.frame_number();
        let mut rewards = Vec::new();

        while !self.finished(rewards.len(), env.frame_number() - start_frame) {
            let summary = self.run_episode(rewards.len(), agent, env, &actions, start_frame)?;
            rewards.push(summary.total_reward);

            if summary.frames == 0 && self.config.frames.is_some() {
                warn!(
                    episode = summary.episode,
                    "environment produced an empty episode, stopping run"
                );
                break;
            }
        }

        let summary = RunSummary {
            agent: agent.name().to_string(),
            episodes: rewards.len(),
            frames: env.frame_number() - start_frame,
            rewards,
            duration_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            episodes = summary.episodes,
            frames = summary.frames,
            mean_reward = ?summary.mean_reward(),
            duration_secs = summary.duration_secs,
            "run finished"
        );
        for observer in &mut self.observers {
            observer.on_run_end(&summary)?;
        }
        Ok(summary)
    }

    fn run_episode<E: Environment>(
        &mut self,
        episode: usize,
        agent: &mut dyn Agent,
        env: &mut E,
        actions: &ActionSet,
        start_frame: u64,
    ) -> Result<EpisodeSummary> {
        agent.on_episode_start()?;
        for observer in &mut self.observers {
            observer.on_episode_start(episode)?;
        }

        let start = Instant::now();
        let mut frames = 0u64;
        let mut total_reward = 0.0;
        while !env.game_over() && !self.budget_spent(env.frame_number() - start_frame) {
            let index = agent.select_action(&*env)?;
            let action = actions.id(index)?;
            let reward = env.act(action);
            agent.receive_reward(reward);

            total_reward += reward;
            frames += 1;
            for observer in &mut self.observers {
                observer.on_step(episode, frames, action, reward)?;
            }
        }

        let completed = env.game_over();
        agent.on_episode_end()?;
        env.reset();

        let summary = EpisodeSummary {
            episode,
            frames,
            total_reward,
            duration_secs: start.elapsed().as_secs_f64(),
            completed,
        };
        info!(
            episode,
            frames,
            total_reward,
            completed,
            "episode finished"
        );
        for observer in &mut self.observers {
            observer.on_episode_end(&summary)?;
        }
        Ok(summary)
    }

    fn budget_spent(&self, frames: u64) -> bool {
        self.config.frames.is_some_and(|budget| frames >= budget)
    }

    fn finished(&self, episodes: usize, frames: u64) -> bool {
        match self.config.episodes {
            Some(target) => episodes >= target,
            None => self.budget_spent(frames),
        }
    }
}
