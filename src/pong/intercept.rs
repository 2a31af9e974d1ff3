//! Ballistic prediction of where the ball meets the agent's paddle plane
//!
//! The ball is advanced from edge event to edge event. At every event the side
//! plane in the direction of travel is tried first; only when the ball would
//! leave the field vertically before reaching it does the top or bottom wall
//! take the bounce. Side bounces flip the x velocity, wall bounces flip y.

use super::{AGENT_X, OPPONENT_X, PLAY_HEIGHT};

/// Upper bound on simulated edge events per prediction.
pub const MAX_BOUNCES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Opponent,
    Top,
    Agent,
    Bottom,
}

/// Reflection boundaries in tracker coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Court {
    pub opponent_x: f64,
    pub agent_x: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Court {
    fn default() -> Self {
        Self {
            opponent_x: OPPONENT_X as f64,
            agent_x: AGENT_X as f64,
            top: 0.0,
            bottom: (PLAY_HEIGHT - 1) as f64,
        }
    }
}

type Vec2 = (f64, f64);

/// Predict the row at which a ball at `ball` moving by `velocity` per tick
/// crosses the agent plane.
///
/// A ball with no horizontal motion, or one already at or behind the agent
/// plane while moving towards it, yields its current row. If the bounce
/// ceiling is reached the row of the last simulated event is returned.
pub fn predict_intercept(court: &Court, ball: Vec2, velocity: Vec2) -> f64 {
    let (mut pos, mut vel) = (ball, velocity);

    if vel.0 > 0.0 && pos.0 >= court.agent_x {
        return pos.1;
    }

    for _ in 0..MAX_BOUNCES {
        if vel.0 == 0.0 {
            return pos.1;
        }
        let (next, reflected, edge) = next_event(court, pos, vel);
        pos = next;
        vel = reflected;
        if edge == Edge::Agent {
            return pos.1;
        }
    }

    tracing::debug!(
        x = pos.0,
        y = pos.1,
        "intercept prediction hit the bounce ceiling"
    );
    pos.1
}

/// Next edge hit by the ball, with the velocity reflected about that edge.
fn next_event(court: &Court, pos: Vec2, vel: Vec2) -> (Vec2, Vec2, Edge) {
    let (side_x, side) = if vel.0 < 0.0 {
        (court.opponent_x, Edge::Opponent)
    } else {
        (court.agent_x, Edge::Agent)
    };

    let t = ((side_x - pos.0) / vel.0).max(0.0);
    let side_y = pos.1 + t * vel.1;
    if vel.1 == 0.0 || (court.top..=court.bottom).contains(&side_y) {
        return ((side_x, side_y), (-vel.0, vel.1), side);
    }

    let (wall_y, wall) = if vel.1 > 0.0 {
        (court.bottom, Edge::Bottom)
    } else {
        (court.top, Edge::Top)
    };
    let t = ((wall_y - pos.1) / vel.1).max(0.0);
    ((pos.0 + t * vel.0, wall_y), (vel.0, -vel.1), wall)
}

/// Remembers the previous ball position so velocity can be derived from
/// consecutive observations.
#[derive(Debug, Clone, Default)]
pub struct InterceptPredictor {
    court: Court,
    last_ball: Option<(i32, i32)>,
}

impl InterceptPredictor {
    pub fn new(court: Court) -> Self {
        Self {
            court,
            last_ball: None,
        }
    }

    /// Record `ball` and predict its intercept row.
    ///
    /// The first observation has no velocity and predicts the ball's own row.
    pub fn observe(&mut self, ball: (i32, i32)) -> f64 {
        let velocity = match self.last_ball {
            Some((x, y)) => ((ball.0 - x) as f64, (ball.1 - y) as f64),
            None => (0.0, 0.0),
        };
        self.last_ball = Some(ball);
        predict_intercept(&self.court, (ball.0 as f64, ball.1 as f64), velocity)
    }

    pub fn court(&self) -> &Court {
        &self.court
    }

    pub fn reset(&mut self) {
        self.last_ball = None;
    }
}
