//! Inspect command - report on a saved agent

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::{
    app::App,
    cli::output::{format_number, format_optional, print_section, print_stats_table, print_subsection},
    sarsa::SavedSarsaAgent,
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a saved SARSA(λ) agent")]
pub struct InspectArgs {
    /// Saved agent file
    pub agent: PathBuf,

    /// Print the report as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Statistics over one saved agent's tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub states: usize,
    pub actions: usize,
    /// States with at least one non-zero action value
    pub visited_states: usize,
    pub nonzero_values: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub mean_value: f64,
    pub max_trace: f64,
    /// Over visited states, how often each action is the greedy choice
    pub greedy_counts: Vec<usize>,
}

impl TableReport {
    pub fn from_tables(q: &Array2<f64>, e: &Array2<f64>) -> Self {
        let (states, actions) = q.dim();
        let mut greedy_counts = vec![0; actions];
        let mut visited_states = 0;

        for row in q.axis_iter(Axis(0)) {
            if row.iter().all(|&v| v == 0.0) {
                continue;
            }
            visited_states += 1;
            // Lowest index wins ties, as in action selection.
            let mut best = 0;
            for (a, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = a;
                }
            }
            greedy_counts[best] += 1;
        }

        let fold = |init: f64, f: fn(f64, f64) -> f64| q.iter().copied().fold(init, f);
        let (min_value, max_value) = if q.is_empty() {
            (0.0, 0.0)
        } else {
            (fold(f64::INFINITY, f64::min), fold(f64::NEG_INFINITY, f64::max))
        };

        Self {
            states,
            actions,
            visited_states,
            nonzero_values: q.iter().filter(|&&v| v != 0.0).count(),
            min_value,
            max_value,
            mean_value: q.mean().unwrap_or(0.0),
            max_trace: e.iter().fold(0.0, |m, &v| m.max(v.abs())),
            greedy_counts,
        }
    }
}

#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    version: u32,
    feature: String,
    actions: Vec<i32>,
    decisions: u64,
    epsilon: f64,
    config: &'a crate::sarsa::SarsaConfig,
    metadata: &'a crate::sarsa::TrainingMetadata,
    tables: TableReport,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let app = App::new();
    let saved = app
        .load_saved(&args.agent)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;
    // Rebuilding checks the tables against the feature's state domain.
    saved
        .to_agent()
        .with_context(|| format!("Saved agent {} is inconsistent", args.agent.display()))?;

    let report = build_report(&saved)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&args.agent, &report);
    }
    Ok(())
}

fn build_report(saved: &SavedSarsaAgent) -> Result<InspectReport<'_>> {
    Ok(InspectReport {
        version: saved.version,
        feature: saved.feature.to_string(),
        actions: saved.actions.iter().map(|a| a.0).collect(),
        decisions: saved.decisions,
        epsilon: saved.config.epsilon_schedule()?.value_at(saved.decisions),
        config: &saved.config,
        metadata: &saved.metadata,
        tables: TableReport::from_tables(saved.q(), saved.e()),
    })
}

fn print_report(path: &std::path::Path, report: &InspectReport<'_>) {
    print_section(&format!("Agent {}", path.display()));
    let actions = report
        .actions
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    print_stats_table(&[
        ("Format version", report.version.to_string()),
        ("Feature", report.feature.clone()),
        ("Actions", actions),
        ("Decisions", format_number(report.decisions)),
        ("Current epsilon", format!("{:.4}", report.epsilon)),
    ]);

    print_subsection("Hyperparameters");
    let config = report.config;
    print_stats_table(&[
        ("Frames per action", config.frames_per_action.to_string()),
        ("Trace rule", config.trace.to_string()),
        ("Learning rate", config.learning_rate.to_string()),
        ("Discount", config.discount.to_string()),
        ("Lambda", config.lambda.to_string()),
        ("Epsilon anchors", format!("{:?}", config.epsilon)),
    ]);

    print_subsection("Training");
    let metadata = report.metadata;
    print_stats_table(&[
        ("Episodes", format_optional(metadata.episodes_trained)),
        ("Frames", format_optional(metadata.frames_trained.map(format_number))),
        ("Seed", format_optional(metadata.seed)),
        ("Environment", format_optional(metadata.environment.as_deref())),
    ]);

    print_subsection("Tables");
    let tables = &report.tables;
    let greedy = report
        .actions
        .iter()
        .zip(&tables.greedy_counts)
        .map(|(action, count)| format!("{action}:{count}"))
        .collect::<Vec<_>>()
        .join(" ");
    print_stats_table(&[
        ("Shape", format!("{} x {}", tables.states, tables.actions)),
        (
            "Visited states",
            format!("{} / {}", tables.visited_states, tables.states),
        ),
        ("Non-zero values", format_number(tables.nonzero_values as u64)),
        (
            "Value range",
            format!("[{:.5}, {:.5}]", tables.min_value, tables.max_value),
        ),
        ("Mean value", format!("{:.6}", tables.mean_value)),
        ("Max |trace|", format!("{:.5}", tables.max_trace)),
        ("Greedy actions", greedy),
    ]);
}
