//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use pong_sarsa::{
    SarsaConfig,
    app::{AgentConfig, App},
    features::FeatureKind,
    ports::Environment,
    sarsa::SarsaLambdaAgent,
    sim::{CourtConfig, SimulatedPong},
};

/// A short-serve court whose episodes end after `points` points or
/// `max_frames` ticks, whichever comes first.
pub fn quick_court(points: u32, max_frames: u64, seed: u64) -> SimulatedPong {
    let config = CourtConfig::default()
        .with_points_to_win(points)
        .with_max_episode_frames(max_frames)
        .with_serve_delay(5);
    SimulatedPong::new(config, seed).unwrap()
}

/// A learner with a fast-decaying epsilon and a visible learning rate.
pub fn learner(feature: FeatureKind, court: &SimulatedPong) -> SarsaLambdaAgent {
    let sarsa = SarsaConfig::default()
        .with_learning_rate(0.1)
        .with_epsilon(vec![(0, 1.0), (500, 0.1)]);
    App::for_testing()
        .with_default_seed(11)
        .build()
        .create_agent(AgentConfig::new(feature).with_sarsa(sarsa), court.legal_actions())
        .unwrap()
}
