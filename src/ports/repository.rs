//! Repository port for learner persistence.

use std::path::Path;

use crate::{Result, sarsa::SavedSarsaAgent};

/// Port for persisting and loading trained SARSA(λ) agents.
///
/// # Examples
///
/// ```no_run
/// use pong_sarsa::adapters::MsgPackRepository;
/// use pong_sarsa::ports::AgentRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository::new();
/// let saved = repo.load(Path::new("agent.msgpack"))?;
/// println!("{} states", saved.shape().0);
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
pub trait AgentRepository {
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization fails.
    fn save(&self, agent: &SavedSarsaAgent, path: &Path) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not a saved agent.
    fn load(&self, path: &Path) -> Result<SavedSarsaAgent>;
}
