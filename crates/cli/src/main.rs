//! Command-line entry point: runs a scripted encounter end to end.
//!
//! Environment variables (a `.env` file is honored):
//! - `COMBAT_LOG_DIR` - Also write logs to `combat.log` in this directory;
//!   an empty value selects the platform cache directory
//! - `RUST_LOG` - Log filter (default: info)
//! - every `COMBAT_*` variable read by [`TrackerConfig::from_env`]
use std::path::PathBuf;

use anyhow::{Context, Result};
use combat_core::{CombatActionLogEntry, Encounter, Participant, ParticipantKind};
use combat_runtime::{CombatTracker, TrackerConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENCOUNTER_ID: &str = "goblin-ambush";

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = setup_logging()?;

    let config = TrackerConfig::from_env();
    let auto_roll = config.auto_roll;
    let mut tracker = CombatTracker::builder()
        .config(config)
        .build()
        .context("failed to build combat tracker")?;

    let mut encounter = roster();
    if tracker.restore(&mut encounter) {
        tracing::info!("Continuing saved combat for {}", encounter.id);
    } else {
        tracker.start_combat(&mut encounter, auto_roll);
    }

    run_script(&mut tracker, &mut encounter, auto_roll);

    for entry in tracker.history(&encounter.id) {
        println!("{}", describe(&entry));
    }

    let report = tracker.validate(&encounter);
    println!(
        "status={} phase={} rounds={} duration={}ms validation={}",
        encounter.status,
        encounter.combat.phase.as_str(),
        encounter.combat.current_round,
        encounter.combat.total_duration_ms,
        report
    );

    Ok(())
}

fn roster() -> Encounter {
    Encounter::new(ENCOUNTER_ID)
        .with_participant(
            Participant::new("fighter", "Fighter", ParticipantKind::Player, 14).with_initiative(12),
        )
        .with_participant(
            Participant::new("rogue", "Rogue", ParticipantKind::Player, 18).with_initiative(14),
        )
        .with_participant(
            Participant::new("orc", "Orc", ParticipantKind::Monster, 12).with_initiative(11),
        )
}

/// One short fight: a full round, a pause, a reinforcement, a correction and
/// the end.
fn run_script(tracker: &mut CombatTracker, encounter: &mut Encounter, auto_roll: bool) {
    for _ in 0..encounter.combat.initiative_order.len() {
        tracker.next_turn(encounter);
    }

    tracker.pause_combat(encounter);
    tracker.resume_combat(encounter);

    let goblin =
        Participant::new("goblin", "Goblin", ParticipantKind::Monster, 14).with_initiative(10);
    tracker.add_combatant(encounter, goblin, auto_roll);
    tracker.reroll_initiative(encounter, Some(&"orc".into()));

    tracker.next_turn(encounter);
    tracker.previous_turn(encounter);
    tracker.remove_combatant(encounter, &"goblin".into());

    tracker.end_combat(encounter);
}

fn describe(entry: &CombatActionLogEntry) -> String {
    let mut line = format!(
        "[{}] round {} turn {} {}",
        entry.timestamp, entry.round, entry.turn, entry.action
    );
    if let Some(participant) = &entry.participant_id {
        line.push_str(&format!(" {participant}"));
    }
    if !entry.details.is_empty() {
        line.push_str(&format!(" {:?}", entry.details));
    }
    line
}

/// Setup logging to stderr, plus a log file when `COMBAT_LOG_DIR` is set.
fn setup_logging() -> Result<Option<WorkerGuard>> {
    // Create env filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(log_dir) = std::env::var_os("COMBAT_LOG_DIR").map(PathBuf::from) else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    let log_dir = if log_dir.as_os_str().is_empty() {
        default_log_directory()
    } else {
        log_dir
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    // Setup file appender
    let file_appender = tracing_appender::rolling::never(&log_dir, "combat.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/combat.log", log_dir.display());

    Ok(Some(guard))
}

/// Get the platform-specific log directory
fn default_log_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "combat-tracker")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("/tmp/combat-tracker/logs"))
}
