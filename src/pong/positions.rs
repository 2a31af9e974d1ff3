//! Object positions recovered from raw frames

use ndarray::{ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};

use super::{
    AGENT_COLOR, AGENT_X, BALL_COLOR, FRAME_HEIGHT, FRAME_WIDTH, OPPONENT_COLOR, OPPONENT_X,
    PLAY_AREA_BOTTOM, PLAY_AREA_TOP,
};
use crate::{Error, Result, ports::FrameSource};

/// Last known positions of the three game objects.
///
/// Rows are play-field relative, columns are screen columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positions {
    pub agent_y: i32,
    pub opponent_y: i32,
    /// `(x, y)`
    pub ball: (i32, i32),
}

/// Tracks paddle and ball positions across ticks.
///
/// When an object is not drawn in a frame (serve pause, flicker) the previous
/// value is kept; a miss is never reported to the caller.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    positions: Positions,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    /// Read the current frame from `frames` and refresh the estimates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameShape`] if the frame is not `210 × 160`.
    pub fn update(&mut self, frames: &dyn FrameSource) -> Result<&Positions> {
        self.update_from(frames.raw_frame())?;
        Ok(&self.positions)
    }

    pub fn update_from(&mut self, frame: ArrayView2<'_, u8>) -> Result<()> {
        if frame.dim() != (FRAME_HEIGHT, FRAME_WIDTH) {
            return Err(Error::FrameShape {
                expected: (FRAME_HEIGHT, FRAME_WIDTH),
                actual: frame.dim(),
            });
        }

        let field = frame.slice(s![PLAY_AREA_TOP..PLAY_AREA_BOTTOM, ..]);

        if let Some(y) = color_centroid(field.column(AGENT_X), AGENT_COLOR) {
            self.positions.agent_y = y;
        }
        if let Some(y) = color_centroid(field.column(OPPONENT_X), OPPONENT_COLOR) {
            self.positions.opponent_y = y;
        }

        // Row and column projections of the ball colour over the whole field.
        let rows = field
            .rows()
            .into_iter()
            .map(|row| row.iter().any(|&p| p == BALL_COLOR));
        let columns = field
            .columns()
            .into_iter()
            .map(|column| column.iter().any(|&p| p == BALL_COLOR));
        if let (Some(x), Some(y)) = (centroid(columns), centroid(rows)) {
            self.positions.ball = (x, y);
        }

        Ok(())
    }
}

fn color_centroid(line: ArrayView1<'_, u8>, color: u8) -> Option<i32> {
    centroid(line.iter().map(|&p| p == color))
}

/// Rounded mean index of the `true` entries, `None` if there are none.
fn centroid<I>(hits: I) -> Option<i32>
where
    I: IntoIterator<Item = bool>,
{
    let (sum, count) = hits
        .into_iter()
        .enumerate()
        .filter(|(_, hit)| *hit)
        .fold((0usize, 0usize), |(sum, count), (idx, _)| (sum + idx, count + 1));

    if count == 0 {
        None
    } else {
        Some((sum as f64 / count as f64).round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::pong::BACKGROUND_COLOR;

    fn blank() -> Array2<u8> {
        Array2::from_elem((FRAME_HEIGHT, FRAME_WIDTH), BACKGROUND_COLOR)
    }

    fn paint(frame: &mut Array2<u8>, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>, color: u8) {
        frame
            .slice_mut(s![rows.start + PLAY_AREA_TOP..rows.end + PLAY_AREA_TOP, cols])
            .fill(color);
    }

    #[test]
    fn test_tracks_all_objects() {
        let mut frame = blank();
        paint(&mut frame, 40..56, 140..144, AGENT_COLOR);
        paint(&mut frame, 100..116, 16..20, OPPONENT_COLOR);
        paint(&mut frame, 70..74, 80..82, BALL_COLOR);

        let mut tracker = PositionTracker::new();
        tracker.update_from(frame.view()).unwrap();

        let pos = tracker.positions();
        // 40..56 has mean 47.5 which rounds away from zero
        assert_eq!(pos.agent_y, 48);
        assert_eq!(pos.opponent_y, 108);
        assert_eq!(pos.ball, (81, 72));
    }

    #[test]
    fn test_missing_ball_keeps_last_position() {
        let mut frame = blank();
        paint(&mut frame, 10..14, 30..32, BALL_COLOR);
        let mut tracker = PositionTracker::new();
        tracker.update_from(frame.view()).unwrap();
        let before = tracker.positions().ball;

        tracker.update_from(blank().view()).unwrap();
        assert_eq!(tracker.positions().ball, before);
    }

    #[test]
    fn test_missing_paddles_keep_last_position() {
        let mut frame = blank();
        paint(&mut frame, 0..16, 140..144, AGENT_COLOR);
        paint(&mut frame, 144..160, 16..20, OPPONENT_COLOR);
        let mut tracker = PositionTracker::new();
        tracker.update_from(frame.view()).unwrap();

        tracker.update_from(blank().view()).unwrap();
        assert_eq!(tracker.positions().agent_y, 8);
        assert_eq!(tracker.positions().opponent_y, 152);
    }

    #[test]
    fn test_ignores_objects_outside_play_band() {
        let mut frame = blank();
        // Score area above the play field uses the ball colour in some palettes.
        frame.slice_mut(s![0..10, 60..70]).fill(BALL_COLOR);
        let mut tracker = PositionTracker::new();
        tracker.update_from(frame.view()).unwrap();
        assert_eq!(tracker.positions().ball, (0, 0));
    }

    #[test]
    fn test_rejects_wrong_frame_shape() {
        let frame = Array2::<u8>::zeros((84, 84));
        let mut tracker = PositionTracker::new();
        let err = tracker.update_from(frame.view()).unwrap_err();
        assert!(matches!(err, Error::FrameShape { actual: (84, 84), .. }));
    }
}
