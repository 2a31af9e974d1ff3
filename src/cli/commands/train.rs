//! Train command - run an agent on the simulated court

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;
use tracing::info;

use crate::{
    adapters::{CounterTelemetry, TelemetryCounters, TracingTelemetry},
    agents::UniformRandomAgent,
    app::App,
    cli::{
        config::TrainingFile,
        output::{format_number, format_optional, print_section, print_stats_table, print_subsection},
    },
    features::FeatureKind,
    pipeline::{
        EpisodeRunner, JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver, RunSummary,
    },
    ports::{Agent, Environment, Settings},
    sarsa::{TraceRule, TrainingMetadata},
    schedule::LinearSchedule,
    sim::SimulatedPong,
};

/// Environment name recorded in saved agents.
pub const ENVIRONMENT_NAME: &str = "simulated-pong";

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    environment: &'static str,
    run: RunSummary,
    metrics: MetricsSummary,
    settings: Settings,
    learner: Option<TelemetryCounters>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name means a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train an agent on the simulated court", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Agent to run
    #[arg(long, value_enum, default_value_t = AgentKind::Sarsa)]
    pub agent: AgentKind,

    /// JSON training configuration; the flags below override its fields
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Continue training a saved SARSA(λ) agent (its hyperparameters are kept)
    #[arg(
        long,
        conflicts_with_all = ["feature", "trace", "alpha", "gamma", "lambda", "epsilon", "frames_per_action"]
    )]
    pub resume: Option<PathBuf>,

    /// Number of episodes to play
    #[arg(long, short = 'e', conflicts_with = "frames")]
    pub episodes: Option<usize>,

    /// Frame budget for the run
    #[arg(long, short = 'f')]
    pub frames: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// State feature (relative-ball or ball-intercept)
    #[arg(long)]
    pub feature: Option<FeatureKind>,

    /// Eligibility trace rule (accumulating, replacing, or dutch)
    #[arg(long)]
    pub trace: Option<TraceRule>,

    /// Learning rate α (0.0-1.0]
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor γ (0.0-1.0)
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Trace decay λ (0.0-1.0)
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Epsilon anchors as step:value pairs over decisions (e.g. 0:1.0,10000:0.1)
    #[arg(long)]
    pub epsilon: Option<String>,

    /// Frames each chosen action is held for
    #[arg(long)]
    pub frames_per_action: Option<usize>,

    /// Points that end an episode
    #[arg(long)]
    pub points_to_win: Option<u32>,

    /// Hard cap on ticks per episode
    #[arg(long)]
    pub max_episode_frames: Option<u64>,

    /// Output file for the trained agent
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Optional file for JSONL observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    /// SARSA(λ) with eligibility traces
    Sarsa,
    /// Uniform random baseline (never learns)
    Random,
}

impl TrainArgs {
    /// Layer the flags over `--config` (or the defaults) and validate the
    /// result.
    pub fn resolve(&self) -> Result<TrainingFile> {
        let mut setup = match &self.config {
            Some(path) => TrainingFile::load(path)?,
            None => TrainingFile::default(),
        };

        if let Some(feature) = self.feature {
            setup.agent.feature = feature;
        }

        let sarsa = &mut setup.agent.sarsa;
        if let Some(trace) = self.trace {
            sarsa.trace = trace;
        }
        if let Some(alpha) = self.alpha {
            sarsa.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            sarsa.discount = gamma;
        }
        if let Some(lambda) = self.lambda {
            sarsa.lambda = lambda;
        }
        if let Some(frames) = self.frames_per_action {
            sarsa.frames_per_action = frames;
        }
        if let Some(anchors) = &self.epsilon {
            sarsa.epsilon = anchors.parse::<LinearSchedule>()?.anchors().to_vec();
        }

        if let Some(points) = self.points_to_win {
            setup.court.points_to_win = points;
        }
        if let Some(frames) = self.max_episode_frames {
            setup.court.max_episode_frames = Some(frames);
        }

        // A run length on the command line replaces the file's entirely.
        if self.episodes.is_some() || self.frames.is_some() {
            setup.episodes = self.episodes;
            setup.frames = self.frames;
        }
        if let Some(seed) = self.seed {
            setup.seed = Some(seed);
        }

        setup.agent.sarsa.validate()?;
        setup.court.validate()?;
        setup.run_config().validate()?;
        Ok(setup)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let setup = args.resolve()?;
    if args.agent == AgentKind::Random && (args.output.is_some() || args.resume.is_some()) {
        bail!("--output and --resume are only supported for the sarsa agent");
    }
    let summary_path = args.summary.as_deref().map(sanitize_summary_path);

    let mut env = SimulatedPong::new(setup.court.clone(), setup.seed.unwrap_or_else(rand::random))?;
    let actions = env.legal_actions();

    let metrics = MetricsObserver::new();
    let mut runner = EpisodeRunner::new(setup.run_config())?.with_observer(Box::new(metrics.clone()));
    if !args.no_progress {
        runner = runner.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to open observation file {}", path.display()))?;
        runner = runner.with_observer(Box::new(observer));
    }

    let app = App::new();
    let (summary, settings, counters) = match args.agent {
        AgentKind::Random => {
            let mut agent = UniformRandomAgent::new(actions.len());
            if let Some(seed) = setup.seed {
                agent = agent.with_seed(seed);
            }
            let summary = runner.run(&mut agent, &mut env)?;
            (summary, agent.settings(), None)
        }
        AgentKind::Sarsa => {
            let (agent, previous) = match &args.resume {
                Some(path) => {
                    let saved = app
                        .load_saved(path)
                        .with_context(|| format!("Failed to load agent from {}", path.display()))?;
                    if saved.actions != actions {
                        bail!(
                            "saved agent acts over [{}] but the court offers [{}]",
                            saved.actions,
                            actions
                        );
                    }
                    info!(
                        path = %path.display(),
                        decisions = saved.decisions,
                        "resuming saved agent"
                    );
                    (saved.to_agent()?, saved.metadata)
                }
                None => (
                    app.create_agent(setup.agent.clone(), actions.clone())?,
                    TrainingMetadata::default(),
                ),
            };

            let counters = CounterTelemetry::new();
            let mut agent = agent.with_telemetry((counters.clone(), TracingTelemetry::new()));
            let summary = runner.run(&mut agent, &mut env)?;

            if let Some(path) = &args.output {
                let metadata = TrainingMetadata {
                    episodes_trained: Some(previous.episodes_trained.unwrap_or(0) + summary.episodes),
                    frames_trained: Some(previous.frames_trained.unwrap_or(0) + summary.frames),
                    seed: setup.seed.or(previous.seed),
                    environment: Some(ENVIRONMENT_NAME.to_string()),
                };
                app.save_agent(&agent, metadata, path)
                    .with_context(|| format!("Failed to save agent to {}", path.display()))?;
                println!("Saved agent to {}", path.display());
            }
            (summary, agent.settings(), Some(counters.snapshot()))
        }
    };

    let metrics = metrics.summary();
    report(&summary, &metrics, counters.as_ref());

    if let Some(path) = summary_path {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        to_writer_pretty(
            file,
            &TrainingSummaryFile {
                environment: ENVIRONMENT_NAME,
                run: summary,
                metrics,
                settings,
                learner: counters,
            },
        )?;
        println!("Wrote summary to {}", path.display());
    }

    Ok(())
}

fn report(summary: &RunSummary, metrics: &MetricsSummary, counters: Option<&TelemetryCounters>) {
    print_section(&format!("Training Results ({})", summary.agent));
    print_stats_table(&[
        ("Episodes", format_number(summary.episodes as u64)),
        ("Frames", format_number(summary.frames)),
        (
            "Mean reward",
            format_optional(summary.mean_reward().map(|r| format!("{r:+.2}"))),
        ),
        (
            "Best reward",
            format_optional(summary.best_reward().map(|r| format!("{r:+.0}"))),
        ),
        ("Recent mean", format!("{:+.2}", metrics.recent_mean_reward)),
        ("Episode length", format!("{:.1}", metrics.mean_episode_length)),
        ("Reward density", format!("{:.4}", metrics.reward_density)),
        ("Duration", format!("{:.1}s", summary.duration_secs)),
    ]);

    if let Some(counters) = counters {
        print_subsection("Learner");
        print_stats_table(&[
            ("Decisions", format_number(counters.decisions)),
            ("Updates", format_number(counters.updates)),
            ("Repeated ticks", format_number(counters.repeats)),
            (
                "Exploration rate",
                format_optional(counters.exploration_rate().map(|r| format!("{r:.3}"))),
            ),
            (
                "Mean |TD error|",
                format_optional(counters.mean_abs_td_error().map(|e| format!("{e:.5}"))),
            ),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> TrainArgs {
        TrainArgs::try_parse_from(std::iter::once("train").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_sanitize_summary_path() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/run")),
            PathBuf::from("out/run.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/run.JSON")),
            PathBuf::from("out/run.JSON")
        );
        let dir = format!("out{}", std::path::MAIN_SEPARATOR);
        assert_eq!(
            sanitize_summary_path(Path::new(&dir)),
            Path::new("out").join("training_summary.json")
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "--feature",
            "ball-intercept",
            "--trace",
            "dutch",
            "--alpha",
            "0.05",
            "--epsilon",
            "0:0.5,100:0.0",
            "--frames",
            "1000",
            "--seed",
            "9",
        ]);
        let setup = args.resolve().unwrap();
        assert_eq!(setup.agent.feature, FeatureKind::BallIntercept);
        assert_eq!(setup.agent.sarsa.trace, TraceRule::Dutch);
        assert_eq!(setup.agent.sarsa.learning_rate, 0.05);
        assert_eq!(setup.agent.sarsa.epsilon, vec![(0, 0.5), (100, 0.0)]);
        assert_eq!(setup.frames, Some(1000));
        assert_eq!(setup.episodes, None);
        assert_eq!(setup.seed, Some(9));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(
            &path,
            r#"{"agent": {"sarsa": {"lambda": 0.9}}, "frames": 500, "court": {"points_to_win": 3}}"#,
        )
        .unwrap();

        let config = path.to_string_lossy().into_owned();
        let setup = parse(&["--config", &config, "--episodes", "2"]).resolve().unwrap();
        assert_eq!(setup.agent.sarsa.lambda, 0.9);
        assert_eq!(setup.court.points_to_win, 3);
        assert_eq!(setup.episodes, Some(2));
        assert_eq!(setup.frames, None);
    }

    #[test]
    fn test_invalid_hyperparameter_rejected() {
        assert!(parse(&["--lambda", "1.5"]).resolve().is_err());
        assert!(parse(&["--epsilon", "10:1.0,5:0.1"]).resolve().is_err());
    }

    #[test]
    fn test_episodes_and_frames_conflict() {
        let result = TrainArgs::try_parse_from(["train", "--episodes", "1", "--frames", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resume_rejects_hyperparameter_flags() {
        for flag in [
            ["--alpha", "0.1"],
            ["--gamma", "0.5"],
            ["--lambda", "0.9"],
            ["--trace", "dutch"],
            ["--feature", "ball-intercept"],
            ["--epsilon", "0:0.5"],
            ["--frames-per-action", "2"],
        ] {
            let result = TrainArgs::try_parse_from(
                ["train", "--resume", "agent.msgpack"].into_iter().chain(flag),
            );
            assert!(result.is_err(), "{} accepted with --resume", flag[0]);
        }
        assert!(TrainArgs::try_parse_from(["train", "--resume", "agent.msgpack", "--seed", "3"]).is_ok());
    }

    #[test]
    fn test_random_agent_cannot_save() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("agent.msgpack");
        let output = output.to_string_lossy().into_owned();
        let args = parse(&["--agent", "random", "--output", &output, "--no-progress"]);
        assert!(execute(args).is_err());
    }
}
