//! Saving and restoring trained agents.

mod common;

use std::path::Path;

use common::{learner, quick_court};
use pong_sarsa::{
    adapters::{InMemoryRepository, MsgPackRepository},
    app::App,
    features::FeatureKind,
    pipeline::{EpisodeRunner, RunConfig},
    ports::AgentRepository,
    sarsa::{SavedSarsaAgent, TrainingMetadata},
};
use tempfile::tempdir;

fn trained(feature: FeatureKind) -> pong_sarsa::SarsaLambdaAgent {
    let mut court = quick_court(1_000, 100_000, 6);
    let mut agent = learner(feature, &court);
    EpisodeRunner::new(RunConfig::frames(2_000).with_seed(4))
        .unwrap()
        .run(&mut agent, &mut court)
        .unwrap();
    agent
}

#[test]
fn test_msgpack_round_trip_preserves_learning() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("agent.msgpack");
    let agent = trained(FeatureKind::BallIntercept);

    let metadata = TrainingMetadata {
        frames_trained: Some(2_000),
        seed: Some(4),
        ..TrainingMetadata::default()
    };
    let repo = MsgPackRepository::new();
    repo.save(&SavedSarsaAgent::from_agent(&agent, metadata.clone()), &path)
        .unwrap();

    let saved = repo.load(&path).unwrap();
    assert_eq!(saved.metadata, metadata);
    assert_eq!(saved.feature, FeatureKind::BallIntercept);
    assert_eq!(saved.shape(), (160, 3));

    let restored = saved.to_agent().unwrap();
    assert_eq!(restored.tables().q(), agent.tables().q());
    assert_eq!(restored.decisions(), agent.decisions());
    assert_eq!(restored.epsilon(), agent.epsilon());
    assert_eq!(restored.config(), agent.config());
}

#[test]
fn test_restored_agent_keeps_training() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("agent.msgpack");
    let agent = trained(FeatureKind::RelativeBall);
    SavedSarsaAgent::from_agent(&agent, TrainingMetadata::default())
        .save_to_file(&path)
        .unwrap();

    let mut restored = SavedSarsaAgent::load_from_file(&path)
        .unwrap()
        .to_agent()
        .unwrap();
    let before = restored.decisions();
    let mut court = quick_court(1_000, 100_000, 7);
    EpisodeRunner::new(RunConfig::frames(400).with_seed(9))
        .unwrap()
        .run(&mut restored, &mut court)
        .unwrap();
    assert_eq!(restored.decisions(), before + 100);
}

#[test]
fn test_app_with_in_memory_repository() {
    let repo = InMemoryRepository::new();
    let app = App::for_testing()
        .with_repository(repo.clone())
        .with_default_seed(42)
        .build();

    let agent = trained(FeatureKind::RelativeBall);
    let path = Path::new("memory/agent");
    app.save_agent(&agent, TrainingMetadata::default(), path).unwrap();
    assert_eq!(repo.count(), 1);

    let loaded = app.load_agent(path).unwrap();
    assert_eq!(loaded.tables().q(), agent.tables().q());
    assert_eq!(loaded.config().seed, Some(42));
}

#[test]
fn test_loading_garbage_fails() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("agent.msgpack");
    std::fs::write(&path, b"definitely not msgpack").unwrap();

    assert!(MsgPackRepository::new().load(&path).is_err());
    assert!(SavedSarsaAgent::load_from_file(&path).is_err());
}
