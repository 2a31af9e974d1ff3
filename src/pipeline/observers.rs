//! Observer implementations for the episode runner
//!
//! Observers allow composable data collection during a run without coupling
//! the episode loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::runner::{EpisodeSummary, RunSummary};
use crate::{
    Error, Result,
    ports::{Observer, Settings},
    types::ActionId,
};

/// Progress bar observer - shows run progress
///
/// A bar when the episode count is known, a spinner for frame-budget runs.
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    reward_sum: f64,
    episodes: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            reward_sum: 0.0,
            episodes: 0,
        }
    }

    fn message(&self, last: f64) -> String {
        let mean = if self.episodes == 0 {
            0.0
        } else {
            self.reward_sum / self.episodes as f64
        };
        format!("last {last:+.0} mean {mean:+.2}")
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn template_error(e: impl std::fmt::Display) -> Error {
    Error::ProgressBarTemplate {
        message: e.to_string(),
    }
}

impl Observer for ProgressObserver {
    fn on_run_start(&mut self, _settings: &Settings, planned_episodes: Option<usize>) -> Result<()> {
        let pb = match planned_episodes {
            Some(total) => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                        .map_err(template_error)?
                        .progress_chars("=>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("[{elapsed_precise}] {spinner} {pos} episodes ({msg})")
                        .map_err(template_error)?,
                );
                pb
            }
        };
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.episodes += 1;
        self.reward_sum += summary.total_reward;

        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.episodes as u64);
            pb.set_message(self.message(summary.total_reward));
        }
        Ok(())
    }

    fn on_run_end(&mut self, summary: &RunSummary) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            let last = summary.rewards.last().copied().unwrap_or(0.0);
            pb.finish_with_message(self.message(last));
        }
        Ok(())
    }
}

/// Summary of run metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub frames: u64,
    pub mean_reward: f64,
    pub best_reward: Option<f64>,
    /// Mean reward over the trailing window
    pub recent_mean_reward: f64,
    pub mean_episode_length: f64,
    /// Share of ticks that paid a non-zero reward
    pub reward_density: f64,
}

#[derive(Debug, Default)]
struct Metrics {
    rewards: Vec<f64>,
    lengths: Vec<u64>,
    frames: u64,
    rewarded_frames: u64,
}

/// Metrics observer - tracks episode rewards
///
/// Clones share the same metrics, so a handle kept by the caller can read
/// them after the observer has been boxed into a runner.
#[derive(Debug, Clone)]
pub struct MetricsObserver {
    window: usize,
    metrics: Arc<Mutex<Metrics>>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::with_window(100)
    }

    /// `window` episodes make up the trailing mean.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            metrics: Arc::default(),
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        let mean = |values: &[f64]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };
        let recent_start = metrics.rewards.len().saturating_sub(self.window);
        let episodes = metrics.rewards.len();

        MetricsSummary {
            episodes,
            frames: metrics.frames,
            mean_reward: mean(&metrics.rewards),
            best_reward: metrics.rewards.iter().copied().reduce(f64::max),
            recent_mean_reward: mean(&metrics.rewards[recent_start..]),
            mean_episode_length: if episodes == 0 {
                0.0
            } else {
                metrics.lengths.iter().sum::<u64>() as f64 / episodes as f64
            },
            reward_density: if metrics.frames == 0 {
                0.0
            } else {
                metrics.rewarded_frames as f64 / metrics.frames as f64
            },
        }
    }

    fn metrics(&self) -> std::sync::MutexGuard<'_, Metrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_step(&mut self, _episode: usize, _step: u64, _action: ActionId, reward: f64) -> Result<()> {
        let mut metrics = self.metrics();
        metrics.frames += 1;
        if reward != 0.0 {
            metrics.rewarded_frames += 1;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let mut metrics = self.metrics();
        metrics.rewards.push(summary.total_reward);
        metrics.lengths.push(summary.frames);
        Ok(())
    }
}

/// One line of the JSONL observation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Observation {
    RunStart {
        settings: Settings,
        planned_episodes: Option<usize>,
    },
    Episode(EpisodeSummary),
    RunEnd(RunSummary),
}

/// JSONL observer - exports observations to JSON Lines format
///
/// Writes the agent settings first, then one line per episode, then the run
/// summary.
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(|source| Error::Io {
            operation: format!("create observation file {}", path.as_ref().display()),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, observation: &Observation) -> Result<()> {
        serde_json::to_writer(&mut self.writer, observation)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }
}

impl Observer for JsonlObserver {
    fn on_run_start(&mut self, settings: &Settings, planned_episodes: Option<usize>) -> Result<()> {
        self.write(&Observation::RunStart {
            settings: settings.clone(),
            planned_episodes,
        })
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.write(&Observation::Episode(summary.clone()))?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_run_end(&mut self, summary: &RunSummary) -> Result<()> {
        self.write(&Observation::RunEnd(summary.clone()))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader};

    use serde_json::json;

    use super::*;

    fn episode(episode: usize, frames: u64, total_reward: f64) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            frames,
            total_reward,
            duration_secs: 0.0,
            completed: true,
        }
    }

    #[test]
    fn test_metrics_summary() {
        let handle = MetricsObserver::with_window(2);
        let mut observer = handle.clone();

        for (i, reward) in [-21.0, -15.0, -9.0].into_iter().enumerate() {
            observer.on_step(i, 1, ActionId(0), reward).unwrap();
            observer.on_step(i, 2, ActionId(0), 0.0).unwrap();
            observer.on_episode_end(&episode(i, 2, reward)).unwrap();
        }

        let summary = handle.summary();
        assert_eq!(summary.episodes, 3);
        assert_eq!(summary.mean_reward, -15.0);
        assert_eq!(summary.best_reward, Some(-9.0));
        assert_eq!(summary.recent_mean_reward, -12.0);
        assert_eq!(summary.mean_episode_length, 2.0);
        assert_eq!(summary.reward_density, 0.5);
    }

    #[test]
    fn test_empty_metrics() {
        let summary = MetricsObserver::new().summary();
        assert_eq!(summary, MetricsSummary::default());
    }

    #[test]
    fn test_jsonl_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.jsonl");
        let mut observer = JsonlObserver::new(&path).unwrap();

        let mut settings = Settings::new();
        settings.insert("agent".into(), json!("sarsa-lambda"));
        observer.on_run_start(&settings, Some(2)).unwrap();
        observer.on_episode_end(&episode(0, 10, -1.0)).unwrap();
        observer.on_episode_end(&episode(1, 12, 1.0)).unwrap();
        observer
            .on_run_end(&RunSummary {
                agent: "sarsa-lambda".into(),
                episodes: 2,
                frames: 22,
                rewards: vec![-1.0, 1.0],
                duration_secs: 0.0,
            })
            .unwrap();
        drop(observer);

        let lines: Vec<serde_json::Value> = BufReader::new(File::open(&path).unwrap())
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["event"], "run_start");
        assert_eq!(lines[0]["settings"]["agent"], "sarsa-lambda");
        assert_eq!(lines[1]["event"], "episode");
        assert_eq!(lines[2]["frames"], 12);
        assert_eq!(lines[3]["event"], "run_end");
    }
}
