//! Subcommands of the pong-sarsa binary

pub mod inspect;
pub mod train;
