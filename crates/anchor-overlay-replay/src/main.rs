//! Replay a scripted marker-tracking scenario through the synchronizer.
//!
//! Reads a JSON scenario (descriptor catalog, policy, ordered steps),
//! runs it against a recording scene backend, and writes a JSON report
//! of per-step summaries plus the final overlay states.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use log::{info, LevelFilter};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use anchor_overlay::{
    MarkerDeltas, OverlayRecord, OverlaySynchronizer, RecordingScene, SelectError, SyncPolicy,
    TickSummary,
};
use anchor_overlay_core::{init_with_level, ConfigError, OverlayDescriptor};

#[derive(Debug, Parser)]
#[command(
    name = "anchor-overlay-replay",
    about = "Replay a marker-tracking scenario and report the resulting overlay state"
)]
struct Args {
    /// Scenario JSON file.
    scenario: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level filter (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("initial selection failed: {0}")]
    InitialSelect(#[from] SelectError),
}

#[derive(Debug, Deserialize)]
struct Scenario {
    descriptors: Vec<OverlayDescriptor>,
    #[serde(default = "Vector3::zeros")]
    default_offset: Vector3<f32>,
    #[serde(default)]
    policy: SyncPolicy,
    /// Selector applied before the first step.
    #[serde(default)]
    select: Option<String>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Select { key: String },
    Tick { deltas: MarkerDeltas },
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: usize,
    op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<TickSummary>,
    /// Non-fatal step failures (e.g. selecting an unknown key).
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    steps: Vec<StepReport>,
    selected: Option<String>,
    prompt: String,
    bound_markers: Vec<String>,
    overlays: Vec<OverlayRecord>,
    idle_instances: usize,
}

fn main() -> Result<(), ReplayError> {
    let args = Args::parse();
    let level = LevelFilter::from_str(&args.log_level).unwrap_or(LevelFilter::Info);
    let _ = init_with_level(level);
    run(args)
}

fn run(args: Args) -> Result<(), ReplayError> {
    let scenario = load_scenario(&args.scenario)?;

    let mut sync = OverlaySynchronizer::new(
        scenario.descriptors,
        scenario.default_offset,
        scenario.policy,
        RecordingScene::new(),
    )?;
    if let Some(key) = &scenario.select {
        sync.select_overlay(key)?;
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (idx, step) in scenario.steps.iter().enumerate() {
        steps.push(apply_step(&mut sync, idx, step));
    }

    let report = Report {
        steps,
        selected: sync.selected().map(str::to_owned),
        prompt: sync.prompt().to_owned(),
        bound_markers: sync.bound_markers().map(|m| m.to_string()).collect(),
        overlays: sync.backend().live().cloned().collect(),
        idle_instances: sync.idle_instances(),
    };
    info!(
        "replayed {} steps: {} overlays live, {} idle",
        report.steps.len(),
        report.overlays.len(),
        report.idle_instances
    );
    write_report(args.output.as_deref(), &report)
}

fn apply_step(
    sync: &mut OverlaySynchronizer<RecordingScene>,
    idx: usize,
    step: &Step,
) -> StepReport {
    match step {
        Step::Select { key } => StepReport {
            step: idx,
            op: "select",
            summary: None,
            error: sync.select_overlay(key).err().map(|e| e.to_string()),
        },
        Step::Tick { deltas } => StepReport {
            step: idx,
            op: "tick",
            summary: Some(sync.on_markers_changed(deltas)),
            error: None,
        },
    }
}

fn load_scenario(path: &Path) -> Result<Scenario, ReplayError> {
    let raw = fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_report(output: Option<&Path>, report: &Report) -> Result<(), ReplayError> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => fs::write(path, json).map_err(|source| ReplayError::Write {
            path: path.display().to_string(),
            source,
        }),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
