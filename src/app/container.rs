//! Dependency injection container for the application.
//!
//! The container owns infrastructure dependencies (the agent repository) and
//! provides factory methods for creating domain objects.

use std::{path::Path, sync::Arc};

use tracing::debug;

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    features::AnyFeature,
    ports::AgentRepository,
    sarsa::{SarsaLambdaAgent, SavedSarsaAgent, TrainingMetadata},
    types::ActionSet,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use pong_sarsa::app::{AgentConfig, App};
/// use pong_sarsa::features::FeatureKind;
/// use pong_sarsa::types::ActionSet;
///
/// let app = App::new();
/// let actions = ActionSet::from_codes([0, 2, 5])?;
/// let agent = app.create_agent(AgentConfig::new(FeatureKind::RelativeBall).with_seed(42), actions)?;
/// assert_eq!(agent.tables().shape(), (319, 3));
/// # Ok::<(), pong_sarsa::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use pong_sarsa::app::App;
/// use pong_sarsa::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    repository: Arc<dyn AgentRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults: [`MsgPackRepository`]
    /// persistence and no default seed.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn AgentRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    pub fn default_seed(&self) -> Option<u64> {
        self.default_seed
    }

    /// Create a fresh agent over `actions`.
    ///
    /// The seed comes from `config`, falling back to the container default.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the hyperparameters are out of range
    /// or `actions` is empty.
    pub fn create_agent(&self, config: AgentConfig, actions: ActionSet) -> Result<SarsaLambdaAgent> {
        let seed = config.seed().or(self.default_seed);
        let agent = SarsaLambdaAgent::new(config.sarsa, config.feature.build(), actions)?;
        debug!(feature = %config.feature, seed = ?seed, "created agent");
        Ok(match seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        })
    }

    /// Load an agent from persistent storage.
    ///
    /// Learned tables and the epsilon position are restored as saved. The
    /// container's default seed, if any, reseeds the agent.
    pub fn load_agent(&self, path: &Path) -> Result<SarsaLambdaAgent> {
        let saved = self.load_saved(path)?;
        let agent = saved.to_agent()?;
        Ok(match self.default_seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        })
    }

    /// Load the raw saved form, for inspection without rebuilding the agent.
    pub fn load_saved(&self, path: &Path) -> Result<SavedSarsaAgent> {
        self.repository.load(path)
    }

    /// Save an agent to persistent storage.
    pub fn save_agent(
        &self,
        agent: &SarsaLambdaAgent<AnyFeature>,
        metadata: TrainingMetadata,
        path: &Path,
    ) -> Result<()> {
        self.repository.save(&SavedSarsaAgent::from_agent(agent, metadata), path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
///
/// Primarily used for testing to inject in-memory repositories and control
/// randomness.
pub struct AppBuilder {
    repository: Option<Arc<dyn AgentRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    pub fn with_repository<R>(mut self, repository: R) -> Self
    where
        R: AgentRepository + Send + Sync + 'static,
    {
        self.repository = Some(Arc::new(repository));
        self
    }

    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Unset dependencies fall back to production defaults.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
