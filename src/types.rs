//! Newtype wrappers for the harness-facing vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of an action as understood by the environment (e.g. an ALE
/// action code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub i32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered legal action set, fixed for a run.
///
/// Agents select actions by index into this set; the harness maps the index
/// back to an [`ActionId`] before acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet(Vec<ActionId>);

impl ActionSet {
    /// # Errors
    ///
    /// Returns [`Error::EmptyActionSet`] if `actions` is empty.
    pub fn new(actions: Vec<ActionId>) -> Result<Self> {
        if actions.is_empty() {
            return Err(Error::EmptyActionSet);
        }
        Ok(Self(actions))
    }

    pub fn from_codes<I>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = i32>,
    {
        Self::new(codes.into_iter().map(ActionId).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`Error::ActionOutOfRange`] if `index` is not a legal index.
    pub fn id(&self, index: usize) -> Result<ActionId> {
        self.0.get(index).copied().ok_or(Error::ActionOutOfRange {
            index,
            len: self.0.len(),
        })
    }

    pub fn position(&self, id: ActionId) -> Option<usize> {
        self.0.iter().position(|&a| a == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_action_set_rejected() {
        assert!(matches!(ActionSet::new(vec![]), Err(Error::EmptyActionSet)));
    }

    #[test]
    fn test_index_mapping() {
        let actions = ActionSet::from_codes([0, 2, 5]).unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions.id(1).unwrap(), ActionId(2));
        assert_eq!(actions.position(ActionId(5)), Some(2));
        assert!(matches!(
            actions.id(3),
            Err(Error::ActionOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(actions.to_string(), "[0, 2, 5]");
    }
}
