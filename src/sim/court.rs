//! Deterministic Pong court rendering Atari-style frames

use ndarray::{Array2, ArrayView2, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    pong::{
        AGENT_COLOR, AGENT_X, BACKGROUND_COLOR, BALL_COLOR, FRAME_HEIGHT, FRAME_WIDTH,
        OPPONENT_COLOR, OPPONENT_X, PLAY_AREA_BOTTOM, PLAY_AREA_TOP, PLAY_HEIGHT,
    },
    ports::{Environment, FrameSource},
    types::{ActionId, ActionSet},
};

pub const NOOP: ActionId = ActionId(0);
pub const UP: ActionId = ActionId(2);
pub const DOWN: ActionId = ActionId(5);

/// Colour of the score bar and the bottom border.
const BORDER_COLOR: u8 = 236;
const PADDLE_WIDTH: i32 = 4;
const BALL_WIDTH: i32 = 2;
const BALL_HEIGHT: i32 = 4;

/// Geometry and pacing of a [`SimulatedPong`] court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    pub paddle_height: i32,
    /// Rows the agent paddle moves per tick
    pub agent_speed: i32,
    /// Rows the opponent paddle moves per tick while tracking the ball
    pub opponent_speed: i32,
    /// Horizontal ball speed in columns per tick
    pub ball_speed: i32,
    /// Largest vertical ball speed after a paddle hit
    pub max_ball_dy: i32,
    /// Blank ticks between a point and the next serve
    pub serve_delay: u32,
    /// Points that end the episode
    pub points_to_win: u32,
    /// Hard cap on ticks per episode
    pub max_episode_frames: Option<u64>,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            paddle_height: 16,
            agent_speed: 3,
            opponent_speed: 2,
            ball_speed: 2,
            max_ball_dy: 3,
            serve_delay: 20,
            points_to_win: 21,
            max_episode_frames: None,
        }
    }
}

impl CourtConfig {
    pub fn with_points_to_win(mut self, points: u32) -> Self {
        self.points_to_win = points;
        self
    }

    pub fn with_max_episode_frames(mut self, frames: u64) -> Self {
        self.max_episode_frames = Some(frames);
        self
    }

    pub fn with_serve_delay(mut self, ticks: u32) -> Self {
        self.serve_delay = ticks;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::InvalidConfiguration {
                message: message.to_string(),
            })
        };
        if self.paddle_height < 1 || self.paddle_height > PLAY_HEIGHT as i32 {
            return invalid("paddle_height must fit the play field");
        }
        if self.agent_speed < 1 || self.opponent_speed < 0 {
            return invalid("paddle speeds must be positive");
        }
        // The ball must not tunnel through a 4 column paddle.
        if !(1..=PADDLE_WIDTH).contains(&self.ball_speed) {
            return invalid("ball_speed must be between 1 and 4");
        }
        if self.max_ball_dy < 1 {
            return invalid("max_ball_dy must be at least 1");
        }
        if self.points_to_win == 0 {
            return invalid("points_to_win must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ball {
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
}

/// Score of the current episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub agent: u32,
    pub opponent: u32,
}

/// Two-paddle Pong with the Atari 2600 screen layout.
///
/// The agent controls the right paddle (columns `140..144`) with the action
/// codes `0` (no-op), `2` (up) and `5` (down). The opponent tracks the ball
/// at a limited speed. A point is worth `+1` to the scorer's side and `-1`
/// to the other, as seen by the agent. After each point the ball is hidden
/// for `serve_delay` ticks, which exercises the tracker's holdover.
///
/// # Examples
///
/// ```
/// use pong_sarsa::ports::Environment;
/// use pong_sarsa::sim::{CourtConfig, SimulatedPong};
///
/// let mut court = SimulatedPong::new(CourtConfig::default().with_max_episode_frames(500), 7)?;
/// let up = court.legal_actions().id(1)?;
/// let mut total = 0.0;
/// while !court.game_over() {
///     total += court.act(up);
/// }
/// assert_eq!(court.episode_frame_number(), 500);
/// assert_eq!(total, court.score().agent as f64 - court.score().opponent as f64);
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedPong {
    config: CourtConfig,
    actions: ActionSet,
    rng: StdRng,
    frame: Array2<u8>,
    agent_y: i32,
    opponent_y: i32,
    ball: Option<Ball>,
    serve_timer: u32,
    serve_left: bool,
    score: Score,
    frame_number: u64,
    episode_frames: u64,
}

impl SimulatedPong {
    pub fn new(config: CourtConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut court = Self {
            actions: ActionSet::new(vec![NOOP, UP, DOWN])?,
            rng: StdRng::seed_from_u64(seed),
            frame: Array2::from_elem((FRAME_HEIGHT, FRAME_WIDTH), BACKGROUND_COLOR),
            agent_y: 0,
            opponent_y: 0,
            ball: None,
            serve_timer: 0,
            serve_left: false,
            score: Score::default(),
            frame_number: 0,
            episode_frames: 0,
            config,
        };
        court.start_episode();
        Ok(court)
    }

    pub fn config(&self) -> &CourtConfig {
        &self.config
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// Ticks executed in the current episode.
    pub fn episode_frame_number(&self) -> u64 {
        self.episode_frames
    }

    /// Top row of the agent paddle in play-field coordinates.
    pub fn agent_y(&self) -> i32 {
        self.agent_y
    }

    /// Ball top-left corner in play-field rows and screen columns, if in play.
    pub fn ball(&self) -> Option<(i32, i32)> {
        self.ball.map(|b| (b.x, b.y))
    }

    pub fn frame(&self) -> ArrayView2<'_, u8> {
        self.frame.view()
    }

    fn paddle_range(&self) -> i32 {
        PLAY_HEIGHT as i32 - self.config.paddle_height
    }

    fn start_episode(&mut self) {
        let centre = self.paddle_range() / 2;
        self.agent_y = centre;
        self.opponent_y = centre;
        self.score = Score::default();
        self.episode_frames = 0;
        self.serve_left = self.rng.random::<bool>();
        self.schedule_serve();
        self.render();
    }

    fn schedule_serve(&mut self) {
        self.ball = None;
        self.serve_timer = self.config.serve_delay;
        if self.serve_timer == 0 {
            self.serve();
        }
    }

    fn serve(&mut self) {
        let dy = self.rng.random_range(1..=self.config.max_ball_dy.min(2));
        let dy = if self.rng.random::<bool>() { dy } else { -dy };
        let dx = if self.serve_left {
            -self.config.ball_speed
        } else {
            self.config.ball_speed
        };
        self.ball = Some(Ball {
            x: FRAME_WIDTH as i32 / 2 - BALL_WIDTH / 2,
            y: self.rng.random_range(20..PLAY_HEIGHT as i32 - 20),
            dx,
            dy,
        });
    }

    fn move_paddles(&mut self, action: ActionId) {
        let range = self.paddle_range();
        let step = match action {
            UP => -self.config.agent_speed,
            DOWN => self.config.agent_speed,
            _ => 0,
        };
        self.agent_y = (self.agent_y + step).clamp(0, range);

        if let Some(ball) = self.ball {
            let target = ball.y + BALL_HEIGHT / 2 - self.config.paddle_height / 2;
            let speed = self.config.opponent_speed;
            let delta = (target - self.opponent_y).clamp(-speed, speed);
            self.opponent_y = (self.opponent_y + delta).clamp(0, range);
        }
    }

    /// Advance the ball one tick; returns the agent's reward.
    fn move_ball(&mut self) -> f64 {
        let Some(mut ball) = self.ball else {
            return 0.0;
        };
        let bottom = PLAY_HEIGHT as i32 - BALL_HEIGHT;

        ball.x += ball.dx;
        ball.y += ball.dy;
        if ball.y < 0 {
            ball.y = -ball.y;
            ball.dy = -ball.dy;
        } else if ball.y > bottom {
            ball.y = 2 * bottom - ball.y;
            ball.dy = -ball.dy;
        }

        let agent_face = AGENT_X as i32;
        let opponent_face = OPPONENT_X as i32 + 1;
        if ball.dx > 0
            && ball.x + BALL_WIDTH > agent_face
            && ball.x < agent_face + PADDLE_WIDTH
            && self.overlaps(ball.y, self.agent_y)
        {
            ball.x = agent_face - BALL_WIDTH;
            ball.dx = -ball.dx;
            ball.dy = self.deflect(ball.y, self.agent_y);
        } else if ball.dx < 0
            && ball.x < opponent_face
            && ball.x + BALL_WIDTH > opponent_face - PADDLE_WIDTH
            && self.overlaps(ball.y, self.opponent_y)
        {
            ball.x = opponent_face;
            ball.dx = -ball.dx;
            ball.dy = self.deflect(ball.y, self.opponent_y);
        }

        if ball.x + BALL_WIDTH >= FRAME_WIDTH as i32 {
            self.score.opponent += 1;
            self.serve_left = false;
            self.schedule_serve();
            -1.0
        } else if ball.x <= 0 {
            self.score.agent += 1;
            self.serve_left = true;
            self.schedule_serve();
            1.0
        } else {
            self.ball = Some(ball);
            0.0
        }
    }

    fn overlaps(&self, ball_y: i32, paddle_y: i32) -> bool {
        ball_y < paddle_y + self.config.paddle_height && ball_y + BALL_HEIGHT > paddle_y
    }

    /// Vertical speed after a hit: steeper towards the paddle ends.
    fn deflect(&self, ball_y: i32, paddle_y: i32) -> i32 {
        let half = self.config.paddle_height as f64 / 2.0;
        let offset = (ball_y as f64 + BALL_HEIGHT as f64 / 2.0 - paddle_y as f64 - half) / half;
        let dy = (offset * self.config.max_ball_dy as f64).round() as i32;
        let dy = dy.clamp(-self.config.max_ball_dy, self.config.max_ball_dy);
        if dy == 0 { 1 } else { dy }
    }

    fn render(&mut self) {
        let top = PLAY_AREA_TOP as i32;
        self.frame.fill(BACKGROUND_COLOR);
        self.frame.slice_mut(s![..PLAY_AREA_TOP, ..]).fill(BORDER_COLOR);
        self.frame.slice_mut(s![PLAY_AREA_BOTTOM.., ..]).fill(BORDER_COLOR);

        let paddle = (self.config.paddle_height, PADDLE_WIDTH);
        let opponent_left = OPPONENT_X as i32 + 1 - PADDLE_WIDTH;
        fill(
            &mut self.frame,
            (top + self.opponent_y, opponent_left),
            paddle,
            OPPONENT_COLOR,
        );
        fill(
            &mut self.frame,
            (top + self.agent_y, AGENT_X as i32),
            paddle,
            AGENT_COLOR,
        );
        if let Some(ball) = self.ball {
            fill(
                &mut self.frame,
                (top + ball.y, ball.x),
                (BALL_HEIGHT, BALL_WIDTH),
                BALL_COLOR,
            );
        }
    }
}

/// Paint a `(height, width)` rectangle whose top-left corner is `(row, col)`,
/// clipped to the frame.
fn fill(frame: &mut Array2<u8>, (row, col): (i32, i32), (height, width): (i32, i32), color: u8) {
    let rows = row.max(0) as usize..((row + height).max(0) as usize).min(FRAME_HEIGHT);
    let cols = col.max(0) as usize..((col + width).max(0) as usize).min(FRAME_WIDTH);
    if rows.is_empty() || cols.is_empty() {
        return;
    }
    frame.slice_mut(s![rows, cols]).fill(color);
}

impl FrameSource for SimulatedPong {
    fn raw_frame(&self) -> ArrayView2<'_, u8> {
        self.frame.view()
    }
}

impl Environment for SimulatedPong {
    fn legal_actions(&self) -> ActionSet {
        self.actions.clone()
    }

    fn act(&mut self, action: ActionId) -> f64 {
        if self.game_over() {
            return 0.0;
        }

        self.move_paddles(action);
        let reward = if self.ball.is_some() {
            self.move_ball()
        } else {
            self.serve_timer = self.serve_timer.saturating_sub(1);
            if self.serve_timer == 0 {
                self.serve();
            }
            0.0
        };

        self.frame_number += 1;
        self.episode_frames += 1;
        self.render();
        reward
    }

    fn game_over(&self) -> bool {
        let target = self.config.points_to_win;
        self.score.agent >= target
            || self.score.opponent >= target
            || self
                .config
                .max_episode_frames
                .is_some_and(|cap| self.episode_frames >= cap)
    }

    fn reset(&mut self) {
        self.start_episode();
    }

    fn frame_number(&self) -> u64 {
        self.frame_number
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pong::PositionTracker;

    fn court(config: CourtConfig) -> SimulatedPong {
        SimulatedPong::new(config, 3).unwrap()
    }

    fn run_until_ball(court: &mut SimulatedPong) {
        while court.ball().is_none() {
            court.act(NOOP);
        }
    }

    #[test]
    fn test_serve_pause_hides_ball() {
        let mut court = court(CourtConfig::default().with_serve_delay(5));
        assert!(court.ball().is_none());
        assert!(!court.frame().iter().any(|&p| p == BALL_COLOR));
        for _ in 0..5 {
            court.act(NOOP);
        }
        assert!(court.ball().is_some());
        assert!(court.frame().iter().any(|&p| p == BALL_COLOR));
    }

    #[test]
    fn test_tracker_reads_rendered_positions() {
        let mut court = court(CourtConfig::default().with_serve_delay(0));
        court.act(UP);
        let mut tracker = PositionTracker::new();
        let positions = *tracker.update(&court).unwrap();

        let (ball_x, ball_y) = court.ball().unwrap();
        // 2x4 ball: column centroid x + 0.5 rounds up, row centroid y + 1.5 rounds up.
        assert_eq!(positions.ball, (ball_x + 1, ball_y + 2));
        assert_eq!(positions.agent_y, court.agent_y() + 8);
    }

    #[test]
    fn test_agent_paddle_moves_and_clamps() {
        let mut court = court(CourtConfig::default().with_serve_delay(1_000));
        let start = court.agent_y();
        court.act(UP);
        assert_eq!(court.agent_y(), start - 3);
        for _ in 0..100 {
            court.act(UP);
        }
        assert_eq!(court.agent_y(), 0);
        for _ in 0..100 {
            court.act(DOWN);
        }
        assert_eq!(court.agent_y(), PLAY_HEIGHT as i32 - 16);
    }

    #[test]
    fn test_missed_ball_scores_for_opponent() {
        let mut court = court(CourtConfig::default().with_points_to_win(1).with_serve_delay(3));
        court.agent_y = 0;
        court.ball = Some(Ball {
            x: 150,
            y: 140,
            dx: 2,
            dy: 1,
        });

        let rewards: Vec<f64> = (0..4).map(|_| court.act(NOOP)).collect();
        assert_eq!(rewards, vec![0.0, 0.0, 0.0, -1.0]);
        assert_eq!(court.score(), Score { agent: 0, opponent: 1 });
        assert!(court.ball().is_none());
        assert!(court.game_over());
        assert_eq!(court.act(NOOP), 0.0);
    }

    #[test]
    fn test_ball_past_opponent_scores_for_agent() {
        let config = CourtConfig {
            opponent_speed: 0,
            ..CourtConfig::default().with_serve_delay(2)
        };
        let mut court = court(config);
        court.opponent_y = 0;
        court.ball = Some(Ball {
            x: 6,
            y: 140,
            dx: -2,
            dy: -1,
        });

        let rewards: Vec<f64> = (0..3).map(|_| court.act(NOOP)).collect();
        assert_eq!(rewards, vec![0.0, 0.0, 1.0]);
        assert_eq!(court.score().agent, 1);
        assert!(!court.game_over());

        // Hidden for the serve delay, then served towards the opponent.
        court.act(NOOP);
        assert!(court.ball().is_none());
        court.act(NOOP);
        let ball = court.ball.unwrap();
        assert!(ball.dx < 0);
    }

    #[test]
    fn test_agent_paddle_returns_ball() {
        let mut court = court(CourtConfig::default().with_serve_delay(1_000));
        court.agent_y = 100;
        court.ball = Some(Ball {
            x: 136,
            y: 104,
            dx: 2,
            dy: 1,
        });

        assert_eq!(court.act(NOOP), 0.0);
        assert_eq!(court.act(NOOP), 0.0);
        let ball = court.ball.unwrap();
        assert_eq!(ball.x, 138);
        assert_eq!(ball.dx, -2);
        assert_ne!(ball.dy, 0);
    }

    #[test]
    fn test_episode_frame_cap_and_reset() {
        let mut court = court(CourtConfig::default().with_max_episode_frames(10));
        for _ in 0..10 {
            court.act(DOWN);
        }
        assert!(court.game_over());
        assert_eq!(court.frame_number(), 10);

        court.reset();
        assert!(!court.game_over());
        assert_eq!(court.episode_frame_number(), 0);
        assert_eq!(court.frame_number(), 10);
        assert_eq!(court.score(), Score::default());
    }

    #[test]
    fn test_same_seed_same_game() {
        let config = CourtConfig::default().with_serve_delay(0);
        let mut a = SimulatedPong::new(config.clone(), 11).unwrap();
        let mut b = SimulatedPong::new(config, 11).unwrap();
        run_until_ball(&mut a);
        run_until_ball(&mut b);
        for _ in 0..500 {
            assert_eq!(a.act(NOOP), b.act(NOOP));
        }
        assert_eq!(a.frame(), b.frame());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CourtConfig {
            ball_speed: 9,
            ..CourtConfig::default()
        };
        assert!(matches!(
            SimulatedPong::new(config, 0),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
