//! CLI infrastructure for the pong-sarsa binary
//!
//! `train` runs an agent on the simulated court and can save what it
//! learned; `inspect` reports on a saved agent.

pub mod commands;
pub mod config;
pub mod output;
