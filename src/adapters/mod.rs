//! Adapters implementing domain ports.
//!
//! Infrastructure implementations of the traits defined in the ports module:
//! persistence of saved agents and sinks for learner telemetry.

pub mod in_memory_repository;
pub mod msgpack_repository;
pub mod telemetry;

pub use in_memory_repository::InMemoryRepository;
pub use msgpack_repository::MsgPackRepository;
pub use telemetry::{CounterTelemetry, NoopTelemetry, TelemetryCounters, TracingTelemetry};
