//! Application layer - dependency injection and agent configuration.
//!
//! [`App`] wires the persistence adapter into the domain; CLI commands and
//! integration tests create, save and load agents through it.

pub mod config;
pub mod container;

pub use config::AgentConfig;
pub use container::{App, AppBuilder};
