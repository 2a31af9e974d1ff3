//! Uniform random baseline

use std::any::Any;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;

use crate::{
    Result,
    ports::{Agent, FrameSource, Settings},
};

/// Picks every action with equal probability and never learns.
///
/// Useful as a floor when judging a learner's episode rewards.
#[derive(Debug, Clone)]
pub struct UniformRandomAgent {
    actions: usize,
    rng: StdRng,
    seed: Option<u64>,
}

impl UniformRandomAgent {
    pub const NAME: &'static str = "uniform-random";

    /// `actions` is the size of the legal action set.
    pub fn new(actions: usize) -> Self {
        Self {
            actions: actions.max(1),
            rng: StdRng::from_rng(&mut rand::rng()),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        self
    }
}

impl Agent for UniformRandomAgent {
    fn select_action(&mut self, _frames: &dyn FrameSource) -> Result<usize> {
        Ok(self.rng.random_range(0..self.actions))
    }

    fn receive_reward(&mut self, _reward: f64) {}

    fn name(&self) -> &str {
        Self::NAME
    }

    fn settings(&self) -> Settings {
        let mut settings = Settings::new();
        settings.insert("agent".into(), json!(Self::NAME));
        settings.insert("actions".into(), json!(self.actions));
        settings.insert("seed".into(), json!(self.seed));
        settings
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
