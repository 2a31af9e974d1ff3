//! Discrete state features over tracked Pong positions
//!
//! A [`StateFeature`] turns the current frame into a small hashable value and
//! can list, up front, every value it will ever produce. The
//! [`StateIndexer`] relies on that listing to size the learner's tables.
//!
//! ## Variants
//!
//! | Feature | Value | Domain size |
//! |---------|-------|-------------|
//! | [`RelativeBall`] | `ball_y - agent_y` | 319 |
//! | [`BallIntercept`] | predicted intercept row | 160 |

pub mod ball_intercept;
pub mod indexer;
pub mod relative_ball;

use std::{fmt, hash::Hash, str::FromStr};

use serde::{Deserialize, Serialize};

pub use ball_intercept::BallIntercept;
pub use indexer::StateIndexer;
pub use relative_ball::RelativeBall;

use crate::{Error, Result, ports::FrameSource};

/// A discrete projection of the game state with a finite, known domain.
pub trait StateFeature: Send {
    type Value: Copy + Eq + Hash + fmt::Debug + Send;

    /// Short identifier used in errors and settings.
    fn name(&self) -> &str;

    /// Compute the feature for the current frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be read (wrong shape) or, for
    /// derived features, the value falls outside the enumerated domain.
    fn process(&mut self, frames: &dyn FrameSource) -> Result<Self::Value>;

    /// Every value `process` can return.
    fn enumerate_states(&self) -> Vec<Self::Value>;

    /// Forget per-episode history (e.g. the previous ball position).
    fn reset(&mut self) {}
}

/// Selector for the built-in features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    #[default]
    RelativeBall,
    BallIntercept,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 2] = [FeatureKind::RelativeBall, FeatureKind::BallIntercept];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::RelativeBall => "relative-ball",
            FeatureKind::BallIntercept => "ball-intercept",
        }
    }

    pub fn build(self) -> AnyFeature {
        match self {
            FeatureKind::RelativeBall => AnyFeature::RelativeBall(RelativeBall::new()),
            FeatureKind::BallIntercept => AnyFeature::BallIntercept(BallIntercept::new()),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        FeatureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::ParseFeatureKind {
                input: s.to_string(),
                expected: "relative-ball, ball-intercept".to_string(),
            })
    }
}

/// Either built-in feature, chosen at run time.
#[derive(Debug, Clone)]
pub enum AnyFeature {
    RelativeBall(RelativeBall),
    BallIntercept(BallIntercept),
}

impl AnyFeature {
    pub fn kind(&self) -> FeatureKind {
        match self {
            AnyFeature::RelativeBall(_) => FeatureKind::RelativeBall,
            AnyFeature::BallIntercept(_) => FeatureKind::BallIntercept,
        }
    }
}

impl StateFeature for AnyFeature {
    type Value = i32;

    fn name(&self) -> &str {
        match self {
            AnyFeature::RelativeBall(f) => f.name(),
            AnyFeature::BallIntercept(f) => f.name(),
        }
    }

    fn process(&mut self, frames: &dyn FrameSource) -> Result<i32> {
        match self {
            AnyFeature::RelativeBall(f) => f.process(frames),
            AnyFeature::BallIntercept(f) => f.process(frames),
        }
    }

    fn enumerate_states(&self) -> Vec<i32> {
        match self {
            AnyFeature::RelativeBall(f) => f.enumerate_states(),
            AnyFeature::BallIntercept(f) => f.enumerate_states(),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyFeature::RelativeBall(f) => f.reset(),
            AnyFeature::BallIntercept(f) => f.reset(),
        }
    }
}
