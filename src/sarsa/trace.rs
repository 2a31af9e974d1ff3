//! Eligibility trace update rules

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How the trace of the visited `(s, a)` pair is bumped before the update.
///
/// | Rule | `E(s,a)` after the visit |
/// |------|--------------------------|
/// | Accumulating | `E + 1` |
/// | Replacing | `1` |
/// | Dutch | `E (1 - α) + 1` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceRule {
    Accumulating,
    #[default]
    Replacing,
    Dutch,
}

impl TraceRule {
    pub const ALL: [TraceRule; 3] = [TraceRule::Accumulating, TraceRule::Replacing, TraceRule::Dutch];

    /// New trace value for a visited pair holding `trace`.
    #[inline]
    pub fn bump(self, trace: f64, learning_rate: f64) -> f64 {
        match self {
            TraceRule::Accumulating => trace + 1.0,
            TraceRule::Replacing => 1.0,
            TraceRule::Dutch => trace * (1.0 - learning_rate) + 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TraceRule::Accumulating => "accumulating",
            TraceRule::Replacing => "replacing",
            TraceRule::Dutch => "dutch",
        }
    }
}

impl fmt::Display for TraceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraceRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        TraceRule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == normalized)
            .ok_or_else(|| Error::ParseTraceRule {
                input: s.to_string(),
                expected: "accumulating, replacing, dutch".to_string(),
            })
    }
}
