//! Step-driven scalar schedules
//!
//! - [`LinearSchedule`] interpolates between `(step, value)` anchor points and
//!   drives the exploration rate.
//! - [`RepeatGate`] replays a chosen action a fixed number of times and drives
//!   frame-skip gating.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Piecewise-linear schedule over a step counter.
///
/// Before the first anchor the first value holds, after the last anchor the
/// last value holds.
///
/// # Examples
///
/// ```
/// use pong_sarsa::schedule::LinearSchedule;
///
/// let mut epsilon = LinearSchedule::new(vec![(0, 1.0), (10, 0.0)]).unwrap();
/// assert_eq!(epsilon.next(), 1.0);
/// assert!((epsilon.value_at(5) - 0.5).abs() < 1e-12);
/// assert_eq!(epsilon.value_at(100), 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct LinearSchedule {
    anchors: Vec<(u64, f64)>,
    step: u64,
}

impl LinearSchedule {
    /// Create a schedule from anchor points sorted by strictly increasing step.
    pub fn new(anchors: Vec<(u64, f64)>) -> Result<Self> {
        validate_anchors(&anchors)?;
        Ok(Self { anchors, step: 0 })
    }

    /// Value at an arbitrary step, without touching the counter.
    pub fn value_at(&self, step: u64) -> f64 {
        let (first_step, first_value) = self.anchors[0];
        if step <= first_step {
            return first_value;
        }

        for window in self.anchors.windows(2) {
            let (s0, v0) = window[0];
            let (s1, v1) = window[1];
            if step <= s1 {
                let t = (step - s0) as f64 / (s1 - s0) as f64;
                return v0 + (v1 - v0) * t;
            }
        }

        self.anchors[self.anchors.len() - 1].1
    }

    /// Value at the current step.
    pub fn value(&self) -> f64 {
        self.value_at(self.step)
    }

    /// Returns the value at the current step and advances the counter.
    pub fn next(&mut self) -> f64 {
        let value = self.value();
        self.step = self.step.saturating_add(1);
        value
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Jump to `step`, e.g. when resuming a saved learner.
    pub fn set_step(&mut self, step: u64) {
        self.step = step;
    }

    pub fn anchors(&self) -> &[(u64, f64)] {
        &self.anchors
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }
}

#[derive(Deserialize)]
struct RawSchedule {
    anchors: Vec<(u64, f64)>,
    #[serde(default)]
    step: u64,
}

impl TryFrom<RawSchedule> for LinearSchedule {
    type Error = Error;

    fn try_from(raw: RawSchedule) -> Result<Self> {
        let mut schedule = LinearSchedule::new(raw.anchors)?;
        schedule.set_step(raw.step);
        Ok(schedule)
    }
}

fn validate_anchors(anchors: &[(u64, f64)]) -> Result<()> {
    if anchors.is_empty() {
        return Err(Error::InvalidConfiguration {
            message: "schedule needs at least one anchor point".to_string(),
        });
    }
    if let Some((_, value)) = anchors.iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidConfiguration {
            message: format!("schedule value {value} is not finite"),
        });
    }
    if anchors.windows(2).any(|w| w[1].0 <= w[0].0) {
        return Err(Error::InvalidConfiguration {
            message: "schedule anchor steps must be strictly increasing".to_string(),
        });
    }
    Ok(())
}

impl FromStr for LinearSchedule {
    type Err = Error;

    /// Parses `step:value` pairs separated by commas, e.g. `0:1.0,10000:0.1`.
    fn from_str(s: &str) -> Result<Self> {
        let parse_err = |reason: String| Error::ParseSchedule {
            input: s.to_string(),
            reason,
        };

        let mut anchors = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (step, value) = part
                .split_once(':')
                .ok_or_else(|| parse_err(format!("'{part}' is not of the form step:value")))?;
            let step = step
                .trim()
                .parse::<f64>()
                .map_err(|e| parse_err(format!("bad step '{step}': {e}")))?;
            if step < 0.0 || step.fract() != 0.0 {
                return Err(parse_err(format!("step {step} is not a whole number")));
            }
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|e| parse_err(format!("bad value '{value}': {e}")))?;
            anchors.push((step as u64, value));
        }

        LinearSchedule::new(anchors).map_err(|e| parse_err(e.to_string()))
    }
}

/// Replays one action a fixed number of times before yielding control.
///
/// After [`RepeatGate::set`], the next `repeats` calls to [`RepeatGate::next`]
/// return the stored action; the call after that returns `None`, meaning a
/// fresh decision is due.
#[derive(Debug, Clone)]
pub struct RepeatGate {
    repeats: usize,
    remaining: usize,
    action: Option<usize>,
}

impl RepeatGate {
    pub fn new(repeats: usize) -> Self {
        Self {
            repeats,
            remaining: 0,
            action: None,
        }
    }

    /// Gate for acting once every `frames_per_action` ticks.
    pub fn every(frames_per_action: usize) -> Self {
        Self::new(frames_per_action.saturating_sub(1))
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.action
    }

    pub fn set(&mut self, action: usize) {
        self.action = Some(action);
        self.remaining = self.repeats;
    }

    pub fn clear(&mut self) {
        self.action = None;
        self.remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation_between_anchors() {
        let schedule = LinearSchedule::new(vec![(0, 1.0), (10_000, 0.1)]).unwrap();
        assert_eq!(schedule.value_at(0), 1.0);
        assert!((schedule.value_at(5_000) - 0.55).abs() < 1e-12);
        assert!((schedule.value_at(10_000) - 0.1).abs() < 1e-12);
        assert!((schedule.value_at(50_000) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_segments() {
        let schedule = LinearSchedule::new(vec![(10, 1.0), (20, 0.5), (40, 0.5), (50, 0.0)]).unwrap();
        assert_eq!(schedule.value_at(3), 1.0);
        assert!((schedule.value_at(15) - 0.75).abs() < 1e-12);
        assert!((schedule.value_at(30) - 0.5).abs() < 1e-12);
        assert!((schedule.value_at(45) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_next_advances_counter() {
        let mut schedule = LinearSchedule::new(vec![(0, 1.0), (4, 0.0)]).unwrap();
        let values: Vec<f64> = (0..6).map(|_| schedule.next()).collect();
        assert_eq!(values, vec![1.0, 0.75, 0.5, 0.25, 0.0, 0.0]);
        assert_eq!(schedule.step(), 6);
        schedule.reset();
        assert_eq!(schedule.value(), 1.0);
    }

    #[test]
    fn test_rejects_unsorted_or_empty_anchors() {
        assert!(LinearSchedule::new(vec![]).is_err());
        assert!(LinearSchedule::new(vec![(5, 1.0), (5, 0.0)]).is_err());
        assert!(LinearSchedule::new(vec![(0, f64::NAN)]).is_err());
    }

    #[test]
    fn test_parse_schedule() {
        let schedule: LinearSchedule = "0:1.0, 1e4:0.1".parse().unwrap();
        assert_eq!(schedule.anchors(), &[(0, 1.0), (10_000, 0.1)]);
        assert!("0-1.0".parse::<LinearSchedule>().is_err());
        assert!("0:1.0,-5:0.1".parse::<LinearSchedule>().is_err());
    }

    #[test]
    fn test_deserialize_validates_anchors() {
        let schedule: LinearSchedule =
            serde_json::from_str(r#"{"anchors": [[0, 1.0], [10, 0.0]], "step": 4}"#).unwrap();
        assert_eq!(schedule.step(), 4);
        assert!((schedule.value() - 0.6).abs() < 1e-12);

        assert!(serde_json::from_str::<LinearSchedule>(r#"{"anchors": [], "step": 0}"#).is_err());
        assert!(serde_json::from_str::<LinearSchedule>(r#"{"anchors": [[5, 1.0], [2, 0.0]]}"#).is_err());
    }

    #[test]
    fn test_repeat_gate_cycle() {
        let mut gate = RepeatGate::every(4);
        assert_eq!(gate.next(), None);
        gate.set(2);
        assert_eq!(gate.next(), Some(2));
        assert_eq!(gate.next(), Some(2));
        assert_eq!(gate.next(), Some(2));
        assert_eq!(gate.next(), None);
    }

    #[test]
    fn test_repeat_gate_single_frame_never_repeats() {
        let mut gate = RepeatGate::every(1);
        gate.set(1);
        assert_eq!(gate.next(), None);
        gate.clear();
        assert_eq!(gate.next(), None);
    }
}
