//! Pong screen geometry and perception
//!
//! Coordinates follow the Atari 2600 Pong screen: a `210 × 160` palette frame
//! whose play field spans rows `34..194`. Tracked positions are expressed in
//! play-field rows (row 0 is screen row 34) and screen columns.

pub mod intercept;
pub mod positions;

pub use intercept::{Court, Edge, InterceptPredictor, MAX_BOUNCES, predict_intercept};
pub use positions::{PositionTracker, Positions};

pub const FRAME_HEIGHT: usize = 210;
pub const FRAME_WIDTH: usize = 160;

pub const PLAY_AREA_TOP: usize = 34;
pub const PLAY_AREA_BOTTOM: usize = 194;
/// Rows in the cropped play field.
pub const PLAY_HEIGHT: usize = PLAY_AREA_BOTTOM - PLAY_AREA_TOP;

pub const BALL_COLOR: u8 = 14;
pub const BACKGROUND_COLOR: u8 = 34;

pub const AGENT_COLOR: u8 = 200;
/// Agent paddle face; the paddle occupies columns 140..=143.
pub const AGENT_X: usize = 140;

pub const OPPONENT_COLOR: u8 = 56;
/// Opponent paddle face; the paddle occupies columns 16..=19.
pub const OPPONENT_X: usize = 19;
