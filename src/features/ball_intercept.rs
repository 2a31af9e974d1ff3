//! Predicted ball intercept row on the agent's paddle plane

use super::StateFeature;
use crate::{
    Result,
    pong::{Court, InterceptPredictor, PLAY_HEIGHT, PositionTracker},
    ports::FrameSource,
};

/// Row at which the ball is predicted to reach the agent's paddle plane.
///
/// Velocity comes from the displacement between consecutive calls, so the
/// feature must see every tick, not only decision ticks. The continuous
/// prediction is rounded to the nearest row. The default court bounces the
/// ball inside the play field, so the domain is exactly [`PLAY_HEIGHT`] rows;
/// a wider court passed to [`BallIntercept::with_court`] can yield rows the
/// domain does not list, which [`StateIndexer`](super::StateIndexer) reports
/// as out of domain.
#[derive(Debug, Clone, Default)]
pub struct BallIntercept {
    tracker: PositionTracker,
    predictor: InterceptPredictor,
}

impl BallIntercept {
    pub fn new() -> Self {
        Self::with_court(Court::default())
    }

    pub fn with_court(court: Court) -> Self {
        Self {
            tracker: PositionTracker::new(),
            predictor: InterceptPredictor::new(court),
        }
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }
}

impl StateFeature for BallIntercept {
    type Value = i32;

    fn name(&self) -> &str {
        "ball-intercept"
    }

    fn process(&mut self, frames: &dyn FrameSource) -> Result<i32> {
        let ball = self.tracker.update(frames)?.ball;
        let row = self.predictor.observe(ball);
        Ok(row.round() as i32)
    }

    fn enumerate_states(&self) -> Vec<i32> {
        (0..PLAY_HEIGHT as i32).collect()
    }

    fn reset(&mut self) {
        self.predictor.reset();
    }
}
