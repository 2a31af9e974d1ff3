//! Simulated environments
//!
//! [`SimulatedPong`] stands in for an Atari emulator: it renders frames with
//! the same palette and geometry, so the position tracker and both state
//! features run unchanged against it.

pub mod court;

pub use court::{CourtConfig, DOWN, NOOP, SimulatedPong, Score, UP};
