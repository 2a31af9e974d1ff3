//! Dense indexing of a feature's enumerated domain

use std::{collections::HashMap, ops::Range};

use super::StateFeature;
use crate::{Error, Result, ports::FrameSource};

/// Maps every value of a [`StateFeature`]'s domain to a dense index in
/// `[0, N)`.
///
/// The domain is enumerated exactly once, at construction. A value produced
/// later that is not in that enumeration is reported as
/// [`Error::StateOutOfDomain`]; it is never clamped or wrapped, since the
/// learner's tables are sized to `N`.
///
/// # Examples
///
/// ```
/// use pong_sarsa::features::{RelativeBall, StateFeature, StateIndexer};
///
/// let indexer = StateIndexer::new(RelativeBall::new()).unwrap();
/// assert_eq!(indexer.len(), 319);
/// let idx = indexer.index(&-3).unwrap();
/// assert_eq!(indexer.value(idx), Some(&-3));
/// ```
#[derive(Debug, Clone)]
pub struct StateIndexer<F: StateFeature> {
    feature: F,
    values: Vec<F::Value>,
    lookup: HashMap<F::Value, usize>,
}

impl<F: StateFeature> StateIndexer<F> {
    /// # Errors
    ///
    /// Returns [`Error::EmptyStateEnumeration`] if the feature enumerates no
    /// values and [`Error::DuplicateState`] if a value is listed twice.
    pub fn new(feature: F) -> Result<Self> {
        let values = feature.enumerate_states();
        if values.is_empty() {
            return Err(Error::EmptyStateEnumeration {
                feature: feature.name().to_string(),
            });
        }

        let mut lookup = HashMap::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            if lookup.insert(*value, idx).is_some() {
                return Err(Error::DuplicateState {
                    feature: feature.name().to_string(),
                    value: format!("{value:?}"),
                });
            }
        }

        Ok(Self {
            feature,
            values,
            lookup,
        })
    }

    /// Index of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateOutOfDomain`] if `value` was not enumerated.
    pub fn index(&self, value: &F::Value) -> Result<usize> {
        self.lookup
            .get(value)
            .copied()
            .ok_or_else(|| Error::StateOutOfDomain {
                feature: self.feature.name().to_string(),
                value: format!("{value:?}"),
            })
    }

    pub fn value(&self, index: usize) -> Option<&F::Value> {
        self.values.get(index)
    }

    /// Number of states `N`.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn indices(&self) -> Range<usize> {
        0..self.values.len()
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    pub fn into_feature(self) -> F {
        self.feature
    }
}

impl<F: StateFeature> StateFeature for StateIndexer<F> {
    type Value = usize;

    fn name(&self) -> &str {
        self.feature.name()
    }

    /// Index of the wrapped feature's current value.
    fn process(&mut self, frames: &dyn FrameSource) -> Result<usize> {
        let value = self.feature.process(frames)?;
        self.index(&value)
    }

    fn enumerate_states(&self) -> Vec<usize> {
        self.indices().collect()
    }

    fn reset(&mut self) {
        self.feature.reset();
    }
}
