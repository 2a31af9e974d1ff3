//! Serialization support for SARSA(λ) agents.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{agent::SarsaLambdaAgent, config::SarsaConfig, tables::EligibilityTables};
use crate::{
    Error, Result,
    features::{AnyFeature, FeatureKind, StateFeature},
    types::ActionSet,
};

/// How a saved agent was trained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Episodes completed before saving
    pub episodes_trained: Option<usize>,
    /// Environment frames consumed before saving
    pub frames_trained: Option<u64>,
    /// Seed of the training run (if any)
    pub seed: Option<u64>,
    /// Name of the environment the agent was trained in
    pub environment: Option<String>,
}

/// On-disk form of a [`SarsaLambdaAgent`] over a built-in feature.
///
/// Q and E are stored as dense `(N, M)` arrays next to everything needed to
/// rebuild the state indexer, so a restored agent resumes exactly where the
/// saved one stopped (apart from the RNG stream).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSarsaAgent {
    pub version: u32,
    pub config: SarsaConfig,
    pub feature: FeatureKind,
    pub actions: ActionSet,
    /// Decisions taken so far; positions the epsilon schedule on restore
    pub decisions: u64,
    q: Array2<f64>,
    e: Array2<f64>,
    pub metadata: TrainingMetadata,
}

impl SavedSarsaAgent {
    pub const VERSION: u32 = 1;

    pub fn from_agent(agent: &SarsaLambdaAgent<AnyFeature>, metadata: TrainingMetadata) -> Self {
        let tables = agent.tables();
        Self {
            version: Self::VERSION,
            config: agent.config().clone(),
            feature: agent.indexer().feature().kind(),
            actions: agent.actions().clone(),
            decisions: agent.decisions(),
            q: tables.q().clone(),
            e: tables.e().clone(),
            metadata,
        }
    }

    /// Consume an agent without copying its tables.
    pub fn from_owned(agent: SarsaLambdaAgent<AnyFeature>, metadata: TrainingMetadata) -> Self {
        let (config, feature, actions, tables, decisions) = agent.into_parts();
        let (q, e) = tables.into_arrays();
        Self {
            version: Self::VERSION,
            config,
            feature: feature.kind(),
            actions,
            decisions,
            q,
            e,
            metadata,
        }
    }

    /// Rebuild the agent, checking both tables against the feature's domain
    /// and the action set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableShapeMismatch`] if either table does not have
    /// shape `(N, M)`, or [`Error::InvalidConfiguration`] for an unknown
    /// format version.
    pub fn to_agent(&self) -> Result<SarsaLambdaAgent<AnyFeature>> {
        if self.version != Self::VERSION {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "unsupported agent save format version {}, expected {}",
                    self.version,
                    Self::VERSION
                ),
            });
        }

        let feature = self.feature.build();
        let expected = (feature.enumerate_states().len(), self.actions.len());
        for (table, values) in [("action values", &self.q), ("eligibility traces", &self.e)] {
            if values.dim() != expected {
                return Err(Error::TableShapeMismatch {
                    table: table.to_string(),
                    expected,
                    actual: values.dim(),
                });
            }
        }

        let tables =
            EligibilityTables::from_arrays(self.q.clone(), self.e.clone(), self.config.td_params())?;
        SarsaLambdaAgent::restore(
            self.config.clone(),
            feature,
            self.actions.clone(),
            tables,
            self.decisions,
        )
    }

    /// `(N, M)` of the stored tables.
    pub fn shape(&self) -> (usize, usize) {
        self.q.dim()
    }

    pub fn q(&self) -> &Array2<f64> {
        &self.q
    }

    pub fn e(&self) -> &Array2<f64> {
        &self.e
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create file: {}", path.as_ref().display()))?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, self).context("Failed to serialize SARSA agent")?;

        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open file: {}", path.as_ref().display()))?;
        let reader = BufReader::new(file);

        rmp_serde::decode::from_read(reader).context("Failed to deserialize SARSA agent")
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::ports::Agent;

    fn trained_agent() -> SarsaLambdaAgent<AnyFeature> {
        let config = SarsaConfig::default()
            .with_frames_per_action(1)
            .with_learning_rate(0.5)
            .with_seed(9);
        let mut agent = SarsaLambdaAgent::new(
            config,
            FeatureKind::BallIntercept.build(),
            ActionSet::from_codes([0, 2, 5]).unwrap(),
        )
        .unwrap();

        let frame = Array2::<u8>::zeros((210, 160));
        for _ in 0..3 {
            agent.select_action(&frame).unwrap();
            agent.receive_reward(1.0);
        }
        agent
    }

    #[test]
    fn test_msgpack_roundtrip() -> anyhow::Result<()> {
        let agent = trained_agent();
        assert!(agent.tables().visited() > 0);

        let saved = SavedSarsaAgent::from_agent(&agent, TrainingMetadata::default());
        let bytes = rmp_serde::to_vec(&saved)?;
        let loaded: SavedSarsaAgent = rmp_serde::from_slice(&bytes)?;
        let restored = loaded.to_agent()?;

        assert_eq!(restored.tables().q(), agent.tables().q());
        assert_eq!(restored.tables().e(), agent.tables().e());
        assert_eq!(restored.decisions(), 3);
        assert_eq!(restored.epsilon(), agent.epsilon());
        assert_eq!(restored.indexer().len(), 160);
        Ok(())
    }

    #[test]
    fn test_from_owned_matches_from_agent() {
        let agent = trained_agent();
        let copied = SavedSarsaAgent::from_agent(&agent, TrainingMetadata::default());
        let owned = SavedSarsaAgent::from_owned(agent, TrainingMetadata::default());
        assert_eq!(copied.q(), owned.q());
        assert_eq!(copied.shape(), (160, 3));
        assert_eq!(owned.feature, FeatureKind::BallIntercept);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut saved = SavedSarsaAgent::from_agent(&trained_agent(), TrainingMetadata::default());
        saved.feature = FeatureKind::RelativeBall;
        let err = saved.to_agent().err().unwrap();
        assert!(matches!(
            err,
            Error::TableShapeMismatch {
                expected: (319, 3),
                actual: (160, 3),
                ..
            }
        ));

        let mut saved = SavedSarsaAgent::from_agent(&trained_agent(), TrainingMetadata::default());
        saved.e = Array2::zeros((160, 2));
        assert!(matches!(
            saved.to_agent(),
            Err(Error::TableShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut saved = SavedSarsaAgent::from_agent(&trained_agent(), TrainingMetadata::default());
        saved.version = 99;
        assert!(matches!(
            saved.to_agent(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
