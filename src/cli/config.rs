//! Training configuration files for the CLI
//!
//! A JSON file holds the whole training setup; command-line flags override
//! individual fields.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{app::AgentConfig, pipeline::RunConfig, sim::CourtConfig};

/// Episodes played when neither the file nor the flags set a run length.
pub const DEFAULT_EPISODES: usize = 10;

/// Everything `train` needs, as read from `--config`.
///
/// ```json
/// {
///   "agent": { "feature": "ball-intercept", "sarsa": { "lambda": 0.8 } },
///   "court": { "points_to_win": 5 },
///   "episodes": 200,
///   "seed": 7
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingFile {
    pub agent: AgentConfig,
    pub court: CourtConfig,
    pub episodes: Option<usize>,
    pub frames: Option<u64>,
    pub seed: Option<u64>,
}

impl TrainingFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Run length and seed, defaulting to [`DEFAULT_EPISODES`] episodes.
    pub fn run_config(&self) -> RunConfig {
        let mut run = match (self.episodes, self.frames) {
            (None, None) => RunConfig::episodes(DEFAULT_EPISODES),
            (episodes, frames) => RunConfig {
                episodes,
                frames,
                seed: None,
            },
        };
        run.seed = self.seed;
        run
    }
}
