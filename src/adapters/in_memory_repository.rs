//! In-memory agent repository for testing.
//!
//! This adapter provides a pure in-memory implementation of AgentRepository,
//! enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{Result, error::Error, ports::AgentRepository, sarsa::SavedSarsaAgent};

type Storage = HashMap<String, Vec<u8>>;

/// In-memory repository for testing.
///
/// Stores encoded agents in a shared HashMap keyed by path.
///
/// # Examples
///
/// ```
/// use pong_sarsa::adapters::InMemoryRepository;
/// use pong_sarsa::features::FeatureKind;
/// use pong_sarsa::ports::AgentRepository;
/// use pong_sarsa::sarsa::{SarsaConfig, SarsaLambdaAgent, SavedSarsaAgent, TrainingMetadata};
/// use pong_sarsa::types::ActionSet;
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let agent = SarsaLambdaAgent::new(
///     SarsaConfig::default(),
///     FeatureKind::BallIntercept.build(),
///     ActionSet::from_codes([0, 2, 5])?,
/// )?;
///
/// repo.save(&SavedSarsaAgent::from_agent(&agent, TrainingMetadata::default()), Path::new("agent"))?;
/// let loaded = repo.load(Path::new("agent"))?;
/// assert_eq!(loaded.shape(), (160, 3));
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<Storage>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of agents currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still usable.
    fn storage(&self) -> MutexGuard<'_, Storage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl AgentRepository for InMemoryRepository {
    fn save(&self, agent: &SavedSarsaAgent, path: &Path) -> Result<()> {
        let bytes = rmp_serde::to_vec(agent).map_err(|e| Error::SerializationContext {
            operation: "serialize agent for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedSarsaAgent> {
        let storage = self.storage();
        let bytes = storage.get(&key(path)).ok_or_else(|| Error::Io {
            operation: format!("load agent from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize agent from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}
