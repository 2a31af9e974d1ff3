//! Ports (trait boundaries) for external collaborators.
//!
//! The learning core owns these traits; the emulator harness, persistence
//! and observation layers implement them.

pub mod agent;
pub mod environment;
pub mod observer;
pub mod repository;
pub mod telemetry;

pub use agent::{Agent, Settings};
pub use environment::{Environment, FrameSource};
pub use observer::Observer;
pub use repository::AgentRepository;
pub use telemetry::{DecisionEvent, EpisodeReset, Telemetry};
