//! Environment port - the emulator side of the episode loop

use ndarray::{Array2, ArrayView2};

use crate::types::{ActionId, ActionSet};

/// Raw observation accessor.
///
/// Returns the current tick's palette frame (`210 × 160` for Pong).
pub trait FrameSource {
    fn raw_frame(&self) -> ArrayView2<'_, u8>;
}

impl FrameSource for Array2<u8> {
    fn raw_frame(&self) -> ArrayView2<'_, u8> {
        self.view()
    }
}

impl FrameSource for ArrayView2<'_, u8> {
    fn raw_frame(&self) -> ArrayView2<'_, u8> {
        self.view()
    }
}

/// A single-player game the episode runner can drive.
pub trait Environment: FrameSource {
    /// Ordered legal action set; fixed for the lifetime of the environment.
    fn legal_actions(&self) -> ActionSet;

    /// Execute one tick with `action` and return the reward earned during it.
    fn act(&mut self, action: ActionId) -> f64;

    fn game_over(&self) -> bool;

    /// Start a new episode.
    fn reset(&mut self);

    /// Ticks executed since the environment was created.
    fn frame_number(&self) -> u64;

    fn set_rng_seed(&mut self, _seed: u64) {}
}
