//! Parkwarden CLI
//!
//! The `parkwarden` command drives the enforcement console without a UI.
//!
//! ## Commands
//!
//! - `replay`: run a scripted event sequence against a fresh console
//! - `actions`: list the actions a bay status allows
//! - `demo`: print the demo zones and bays

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use parkwarden_core::demo::{demo_bays, demo_zones};
use parkwarden_core::obs::ConsoleSpan;
use parkwarden_core::{
    legal_actions_for, ActionKind, Bay, BayStatus, ConsoleConfig, ConsoleEvent, ConsoleOutcome,
    ConsoleSnapshot, EnforcementConsole, EnforcementStore, FileEnforcementStore, LotBook,
    MemoryEnforcementStore, Zone,
};

#[derive(Parser)]
#[command(name = "parkwarden")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parking enforcement console driver", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON event script and print what the console did
    Replay {
        /// Path to the script (JSON)
        script: PathBuf,

        /// Console config file (JSON). Replaces the script's own config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Persist records under this directory instead of in memory
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the actions legal for a bay status
    Actions {
        /// Bay status, e.g. `new-session` or `overstay`
        #[arg(short, long)]
        status: String,

        /// The new session carries a manual-override warning
        #[arg(short, long)]
        warning: bool,
    },

    /// Print the demo zones and bays as JSON
    Demo,
}

/// A recorded operator session.
///
/// Zones and bays default to the demo lot. `at_ms` offsets are relative to
/// `start` and must not decrease.
#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default)]
    zones: Option<Vec<Zone>>,
    #[serde(default)]
    bays: Option<Vec<Bay>>,
    #[serde(default)]
    config: Option<ConsoleConfig>,
    #[serde(default)]
    start: Option<DateTime<Utc>>,
    /// Operator session id attached to every log line.
    #[serde(default)]
    session: Option<String>,
    steps: Vec<ScriptStep>,
}

#[derive(Debug, Deserialize)]
struct ScriptStep {
    #[serde(default)]
    at_ms: i64,
    event: ConsoleEvent,
}

#[derive(Debug, Serialize)]
struct StepReport {
    at_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<ConsoleOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    steps: Vec<StepReport>,
    #[serde(rename = "final")]
    final_state: ConsoleSnapshot,
    records: usize,
}

#[derive(Debug, Serialize)]
struct DemoLot {
    zones: Vec<Zone>,
    bays: Vec<Bay>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    parkwarden_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Replay {
            script,
            config,
            store_dir,
            output,
        } => {
            cmd_replay(
                &script,
                config.as_deref(),
                store_dir.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Commands::Actions { status, warning } => {
            let actions = cmd_actions(&status, warning)?;
            write_output(&actions, None)
        }
        Commands::Demo => write_output(
            &DemoLot {
                zones: demo_zones(),
                bays: demo_bays(),
            },
            None,
        ),
    }
}

async fn cmd_replay(
    script_path: &Path,
    config_path: Option<&Path>,
    store_dir: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let mut script = load_script(script_path)?;
    let config = resolve_config(script.config.take(), config_path)?;

    let report = match store_dir {
        Some(dir) => {
            let store = FileEnforcementStore::new(dir)
                .with_context(|| format!("Failed to open record store at {}", dir.display()))?;
            run_replay(script, config, store).await?
        }
        None => run_replay(script, config, MemoryEnforcementStore::new()).await?,
    };

    let failed = report.steps.iter().filter(|s| s.error.is_some()).count();
    info!(
        event = "replay.finished",
        steps = report.steps.len(),
        failed,
        records = report.records
    );
    write_output(&report, output)
}

fn load_script(path: &Path) -> Result<ReplayScript> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse script {}", path.display()))
}

/// A config file wins over the script's config; the environment wins over both.
fn resolve_config(
    from_script: Option<ConsoleConfig>,
    config_path: Option<&Path>,
) -> Result<ConsoleConfig> {
    let base = match config_path {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => from_script.unwrap_or_default(),
    };
    base.with_env_overrides()
        .context("Invalid console configuration in environment")
}

async fn run_replay<S: EnforcementStore>(
    script: ReplayScript,
    config: ConsoleConfig,
    store: S,
) -> Result<ReplayReport> {
    let session = script.session.as_deref().unwrap_or("replay");
    let _span = ConsoleSpan::enter(session);
    let start = script.start.unwrap_or_else(Utc::now);
    let zones = script.zones.unwrap_or_else(demo_zones);
    let book = LotBook::new(script.bays.unwrap_or_else(demo_bays));

    let mut console = EnforcementConsole::new(config, zones, book, store);
    console
        .start()
        .await
        .context("Configured access token was rejected")?;

    let mut steps = Vec::with_capacity(script.steps.len());
    let mut last_ms = 0;
    for step in script.steps {
        if step.at_ms < last_ms {
            bail!(
                "Step at {}ms comes before the previous step at {}ms",
                step.at_ms,
                last_ms
            );
        }
        last_ms = step.at_ms;

        let now = start + Duration::milliseconds(step.at_ms);
        let report = match console.handle(step.event, now).await {
            Ok(outcome) => StepReport {
                at_ms: step.at_ms,
                outcome: Some(outcome),
                error: None,
            },
            Err(e) => {
                warn!(event = "replay.step_failed", at_ms = step.at_ms, error = %e);
                StepReport {
                    at_ms: step.at_ms,
                    outcome: None,
                    error: Some(e.to_string()),
                }
            }
        };
        steps.push(report);
    }

    let records = console
        .store()
        .records()
        .await
        .context("Failed to read back records")?
        .len();

    Ok(ReplayReport {
        steps,
        final_state: console.snapshot(),
        records,
    })
}

fn cmd_actions(status: &str, warning: bool) -> Result<Vec<ActionKind>> {
    let status: BayStatus = status.parse().map_err(anyhow::Error::msg)?;
    if warning && status != BayStatus::NewSession {
        warn!(
            event = "actions.warning_ignored",
            status = %status,
            "warning flag only applies to new sessions"
        );
    }
    Ok(legal_actions_for(status, warning).iter().collect())
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
