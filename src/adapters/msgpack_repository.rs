//! MessagePack implementation of the agent repository.
//!
//! This adapter implements the AgentRepository port using rmp_serde for
//! compact binary serialization of the dense Q and E tables.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use crate::{Result, error::Error, ports::AgentRepository, sarsa::SavedSarsaAgent};

/// MessagePack-based agent repository.
///
/// # Examples
///
/// ```no_run
/// use pong_sarsa::adapters::MsgPackRepository;
/// use pong_sarsa::features::FeatureKind;
/// use pong_sarsa::ports::AgentRepository;
/// use pong_sarsa::sarsa::{SarsaConfig, SarsaLambdaAgent, SavedSarsaAgent, TrainingMetadata};
/// use pong_sarsa::types::ActionSet;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let agent = SarsaLambdaAgent::new(
///     SarsaConfig::default(),
///     FeatureKind::RelativeBall.build(),
///     ActionSet::from_codes([0, 2, 5])?,
/// )?;
///
/// repo.save(&SavedSarsaAgent::from_agent(&agent, TrainingMetadata::default()), Path::new("agent.msgpack"))?;
/// let loaded = repo.load(Path::new("agent.msgpack"))?;
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl AgentRepository for MsgPackRepository {
    fn save(&self, agent: &SavedSarsaAgent, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, agent).map_err(|e| Error::SerializationContext {
            operation: "serialize agent to MessagePack".to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedSarsaAgent> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize agent from MessagePack".to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        features::FeatureKind,
        sarsa::{SarsaConfig, SarsaLambdaAgent, TrainingMetadata},
        types::ActionSet,
    };

    fn saved() -> SavedSarsaAgent {
        let agent = SarsaLambdaAgent::new(
            SarsaConfig::default().with_seed(1),
            FeatureKind::RelativeBall.build(),
            ActionSet::from_codes([0, 2, 5]).unwrap(),
        )
        .unwrap();
        SavedSarsaAgent::from_agent(&agent, TrainingMetadata::default())
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("agent.msgpack");

        let repo = MsgPackRepository::new();
        let saved = saved();
        repo.save(&saved, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(loaded.shape(), (319, 3));
        assert_eq!(loaded.config, saved.config);
        assert_eq!(loaded.actions, saved.actions);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.load(Path::new("/tmp/nonexistent_pong_sarsa_12345.msgpack"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_load_garbage_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("garbage.msgpack");
        std::fs::write(&file_path, b"not msgpack").unwrap();

        let result = MsgPackRepository::new().load(&file_path);
        assert!(matches!(result, Err(Error::SerializationContext { .. })));
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.save(&saved(), Path::new("/invalid_dir_12345/agent.msgpack"));
        assert!(result.is_err());
    }
}
