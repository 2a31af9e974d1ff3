//! Dense action-value and eligibility tables

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::trace::TraceRule;
use crate::{Error, Result};

/// Step-size parameters of the TD(λ) update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdParams {
    pub trace: TraceRule,
    /// α
    pub learning_rate: f64,
    /// γ
    pub discount: f64,
    /// λ
    pub lambda: f64,
}

/// Q and E tables of shape `(N, M)`.
///
/// Both tables are allocated once and never resized. Every update checks its
/// indices before touching either table, so a failed call leaves them as
/// they were.
#[derive(Debug, Clone)]
pub struct EligibilityTables {
    q: Array2<f64>,
    e: Array2<f64>,
    params: TdParams,
}

impl EligibilityTables {
    /// Zero-initialised tables for `states` × `actions`.
    pub fn new(states: usize, actions: usize, params: TdParams) -> Result<Self> {
        if actions == 0 {
            return Err(Error::EmptyActionSet);
        }
        if states == 0 {
            return Err(Error::EmptyStateEnumeration {
                feature: "eligibility tables".to_string(),
            });
        }
        Ok(Self {
            q: Array2::zeros((states, actions)),
            e: Array2::zeros((states, actions)),
            params,
        })
    }

    /// Rebuild from stored tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableShapeMismatch`] if the two tables differ in shape.
    pub fn from_arrays(q: Array2<f64>, e: Array2<f64>, params: TdParams) -> Result<Self> {
        if q.dim() != e.dim() {
            return Err(Error::TableShapeMismatch {
                table: "eligibility traces".to_string(),
                expected: q.dim(),
                actual: e.dim(),
            });
        }
        if q.is_empty() {
            return Err(Error::EmptyActionSet);
        }
        Ok(Self { q, e, params })
    }

    /// `(N, M)`
    pub fn shape(&self) -> (usize, usize) {
        self.q.dim()
    }

    pub fn q(&self) -> &Array2<f64> {
        &self.q
    }

    pub fn e(&self) -> &Array2<f64> {
        &self.e
    }

    pub fn params(&self) -> &TdParams {
        &self.params
    }

    pub fn action_values(&self, state: usize) -> Result<ArrayView1<'_, f64>> {
        self.check(state, 0)?;
        Ok(self.q.row(state))
    }

    #[cfg(test)]
    pub(crate) fn q_mut(&mut self) -> &mut Array2<f64> {
        &mut self.q
    }

    #[cfg(test)]
    pub(crate) fn e_mut(&mut self) -> &mut Array2<f64> {
        &mut self.e
    }

    /// Lowest-index action with the largest value in `state`.
    pub fn greedy(&self, state: usize) -> Result<usize> {
        let row = self.action_values(state)?;
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        Ok(best)
    }

    /// One SARSA(λ) step from `(state, action)` to `(next_state, next_action)`.
    ///
    /// Returns the TD error.
    pub fn update(
        &mut self,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
        next_action: usize,
    ) -> Result<f64> {
        self.check(state, action)?;
        self.check(next_state, next_action)?;

        let td_error = reward + self.params.discount * self.q[[next_state, next_action]]
            - self.q[[state, action]];
        self.apply(state, action, td_error);
        self.e *= self.params.discount * self.params.lambda;
        Ok(td_error)
    }

    /// Update for a transition into a terminal state, whose value is zero.
    ///
    /// Traces are not decayed; the caller resets them afterwards.
    pub fn terminal_update(&mut self, state: usize, action: usize, reward: f64) -> Result<f64> {
        self.check(state, action)?;

        let td_error = reward - self.q[[state, action]];
        self.apply(state, action, td_error);
        Ok(td_error)
    }

    pub fn reset_traces(&mut self) {
        self.e.fill(0.0);
    }

    /// Largest trace currently held, for diagnostics.
    pub fn max_trace(&self) -> f64 {
        self.e.fold(0.0, |acc, &t| acc.max(t))
    }

    /// Number of `(s, a)` pairs whose value has moved away from zero.
    pub fn visited(&self) -> usize {
        self.q.iter().filter(|&&v| v != 0.0).count()
    }

    pub(crate) fn into_arrays(self) -> (Array2<f64>, Array2<f64>) {
        (self.q, self.e)
    }

    fn apply(&mut self, state: usize, action: usize, td_error: f64) {
        let trace = &mut self.e[[state, action]];
        *trace = self.params.trace.bump(*trace, self.params.learning_rate);
        self.q.scaled_add(self.params.learning_rate * td_error, &self.e);
    }

    fn check(&self, state: usize, action: usize) -> Result<()> {
        let (states, actions) = self.q.dim();
        if state >= states {
            return Err(Error::StateOutOfDomain {
                feature: "eligibility tables".to_string(),
                value: state.to_string(),
            });
        }
        if action >= actions {
            return Err(Error::ActionOutOfRange {
                index: action,
                len: actions,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn params(trace: TraceRule) -> TdParams {
        TdParams {
            trace,
            learning_rate: 0.1,
            discount: 0.9,
            lambda: 0.5,
        }
    }

    #[test]
    fn test_worked_example() {
        let mut tables = EligibilityTables::new(5, 2, params(TraceRule::Replacing)).unwrap();
        assert_eq!(tables.greedy(2).unwrap(), 0);

        let td = tables.update(0, 0, 1.0, 2, 0).unwrap();
        assert!((td - 1.0).abs() < TOL);
        assert!((tables.q()[[0, 0]] - 0.1).abs() < TOL);
        assert!((tables.e()[[0, 0]] - 0.45).abs() < TOL);

        let untouched = tables.q().iter().filter(|&&v| v == 0.0).count();
        assert_eq!(untouched, 9);
    }

    #[test]
    fn test_trace_rules_on_revisit() {
        // Pre-existing trace of 0.5 on the visited pair, zero TD error so only
        // the trace bump and decay are visible.
        let cases = [
            (TraceRule::Accumulating, 1.5),
            (TraceRule::Replacing, 1.0),
            (TraceRule::Dutch, 0.5 * 0.9 + 1.0),
        ];
        for (rule, bumped) in cases {
            let mut tables = EligibilityTables::new(3, 2, params(rule)).unwrap();
            tables.e_mut()[[1, 1]] = 0.5;
            tables.e_mut()[[2, 0]] = 0.2;

            let td = tables.update(1, 1, 0.0, 2, 0).unwrap();
            assert_eq!(td, 0.0);
            assert!(
                (tables.e()[[1, 1]] - bumped * 0.45).abs() < TOL,
                "{rule}: got {}",
                tables.e()[[1, 1]]
            );
            assert!((tables.e()[[2, 0]] - 0.2 * 0.45).abs() < TOL);
        }
    }

    #[test]
    fn test_trace_rules_update_values() {
        // Zero Q everywhere and r = 1, so d = 1 and α d = 0.1.
        let cases = [
            (TraceRule::Accumulating, 1.5),
            (TraceRule::Replacing, 1.0),
            (TraceRule::Dutch, 0.5 * 0.9 + 1.0),
        ];
        for (rule, bumped) in cases {
            let mut tables = EligibilityTables::new(3, 2, params(rule)).unwrap();
            tables.e_mut()[[1, 1]] = 0.5;
            tables.e_mut()[[2, 0]] = 0.2;

            let td = tables.update(1, 1, 1.0, 2, 0).unwrap();
            assert!((td - 1.0).abs() < TOL);
            assert!(
                (tables.q()[[1, 1]] - 0.1 * bumped).abs() < TOL,
                "{rule}: got {}",
                tables.q()[[1, 1]]
            );
            assert!((tables.q()[[2, 0]] - 0.1 * 0.2).abs() < TOL, "{rule}");
            assert_eq!(tables.q()[[0, 0]], 0.0);
            assert!((tables.e()[[1, 1]] - bumped * 0.45).abs() < TOL, "{rule}");
            assert!((tables.e()[[2, 0]] - 0.2 * 0.45).abs() < TOL, "{rule}");
        }
    }

    #[test]
    fn test_update_spreads_over_all_traces() {
        let mut tables = EligibilityTables::new(3, 2, params(TraceRule::Replacing)).unwrap();
        tables.e_mut()[[2, 1]] = 0.5;

        tables.update(0, 1, 2.0, 1, 0).unwrap();
        // d = 2, α d = 0.2
        assert!((tables.q()[[0, 1]] - 0.2).abs() < TOL);
        assert!((tables.q()[[2, 1]] - 0.1).abs() < TOL);
        assert_eq!(tables.q()[[1, 0]], 0.0);
    }

    #[test]
    fn test_td_error_bootstraps_from_next_pair() {
        let mut tables = EligibilityTables::new(2, 2, params(TraceRule::Replacing)).unwrap();
        tables.q_mut()[[1, 1]] = 2.0;
        tables.q_mut()[[0, 0]] = 0.5;

        let td = tables.update(0, 0, 0.0, 1, 1).unwrap();
        assert!((td - (0.9 * 2.0 - 0.5)).abs() < TOL);
    }

    #[test]
    fn test_terminal_update_has_no_bootstrap() {
        let mut tables = EligibilityTables::new(2, 2, params(TraceRule::Accumulating)).unwrap();
        tables.q_mut()[[0, 1]] = 0.25;
        tables.q_mut()[[1, 1]] = 10.0;

        let td = tables.terminal_update(0, 1, -1.0).unwrap();
        assert!((td + 1.25).abs() < TOL);
        assert!((tables.q()[[0, 1]] - (0.25 - 0.125)).abs() < TOL);
        assert_eq!(tables.e()[[0, 1]], 1.0);

        tables.reset_traces();
        assert_eq!(tables.max_trace(), 0.0);
    }

    #[test]
    fn test_greedy_breaks_ties_by_lowest_index() {
        let mut tables = EligibilityTables::new(1, 3, params(TraceRule::Replacing)).unwrap();
        tables.q_mut()[[0, 1]] = 1.0;
        tables.q_mut()[[0, 2]] = 1.0;
        assert_eq!(tables.greedy(0).unwrap(), 1);
    }

    #[test]
    fn test_out_of_range_update_leaves_tables_untouched() {
        let mut tables = EligibilityTables::new(2, 2, params(TraceRule::Replacing)).unwrap();
        tables.e_mut()[[0, 0]] = 1.0;

        assert!(matches!(
            tables.update(0, 0, 1.0, 5, 0),
            Err(Error::StateOutOfDomain { .. })
        ));
        assert!(matches!(
            tables.update(0, 0, 1.0, 1, 2),
            Err(Error::ActionOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(tables.visited(), 0);
        assert_eq!(tables.e()[[0, 0]], 1.0);
    }

    #[test]
    fn test_shape_checks() {
        assert!(matches!(
            EligibilityTables::new(3, 0, params(TraceRule::Replacing)),
            Err(Error::EmptyActionSet)
        ));
        let result = EligibilityTables::from_arrays(
            Array2::zeros((3, 2)),
            Array2::zeros((2, 3)),
            params(TraceRule::Replacing),
        );
        assert!(matches!(result, Err(Error::TableShapeMismatch { .. })));
    }
}
