//! Vertical ball offset relative to the agent paddle

use super::StateFeature;
use crate::{
    Result,
    pong::{PLAY_HEIGHT, PositionTracker},
    ports::FrameSource,
};

/// `ball_y - agent_y` in play-field rows.
///
/// Cheap and coarse: it says whether the ball is above or below the paddle
/// and by how much, but nothing about where the ball is heading.
#[derive(Debug, Clone, Default)]
pub struct RelativeBall {
    tracker: PositionTracker,
}

impl RelativeBall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }
}

impl StateFeature for RelativeBall {
    type Value = i32;

    fn name(&self) -> &str {
        "relative-ball"
    }

    fn process(&mut self, frames: &dyn FrameSource) -> Result<i32> {
        let pos = self.tracker.update(frames)?;
        Ok(pos.ball.1 - pos.agent_y)
    }

    fn enumerate_states(&self) -> Vec<i32> {
        let span = PLAY_HEIGHT as i32 - 1;
        (-span..=span).collect()
    }
}
