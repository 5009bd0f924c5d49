//! rules-worker: runs one notification cycle over a bookings fixture.
//!
//! Loads the rule source and the durable-record state file, evaluates every
//! booking with a fixed or system clock and prints one JSON line per action
//! result on stdout. Outbound messages go to the log sender.
//!
//! Exits non-zero only when the configuration cannot be used (rule source,
//! bookings file, state file, clock).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::DateTime;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use bookwatch_core::{
    config, Booking, Clock, Config, FixedClock, JsonFileRepository, MemoryRepository,
    RecordRepository, SystemClock,
};
use bookwatch_notify::{Dispatcher, LogSender};
use bookwatch_rules::audit_log::AuditLog;
use bookwatch_rules::{
    ActionRegistry, ActionResult, BookingContext, ConditionRegistry, CycleSummary, RuleEngine,
    RuleStore, Services,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Evaluate booking notification rules once.
#[derive(Parser, Debug)]
#[command(name = "rules-worker", version, about)]
struct Cli {
    /// Rule source (overrides RULES_PATH).
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON list of bookings (overrides BOOKINGS_PATH).
    #[arg(long)]
    bookings: Option<PathBuf>,

    /// Durable record state file (overrides STATE_PATH).
    #[arg(long)]
    state: Option<PathBuf>,

    /// Fixed "now" as RFC 3339, for replays. Defaults to the system clock.
    #[arg(long, env = "BOOKWATCH_NOW")]
    now: Option<String>,

    /// Keep state writes in memory (overrides DRY_RUN).
    #[arg(long)]
    dry_run: Option<bool>,

    /// Offset of the system clock in minutes (overrides UTC_OFFSET_MINUTES).
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    /// Validate the rule source and exit.
    #[arg(long)]
    check: bool,
}

/// One stdout line: the booking identity plus the action result.
#[derive(Serialize)]
struct ResultLine<'a> {
    booking: String,
    #[serde(flatten)]
    result: &'a ActionResult,
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.rules {
        config.engine.rules_path = path.clone();
    }
    if let Some(path) = &cli.bookings {
        config.worker.bookings_path = path.clone();
    }
    if let Some(path) = &cli.state {
        config.worker.state_path = path.clone();
    }
    if let Some(dry_run) = cli.dry_run {
        config.worker.dry_run = dry_run;
    }
    if let Some(minutes) = cli.utc_offset_minutes {
        config.engine.utc_offset_minutes = minutes;
    }
}

fn open_rules(config: &Config) -> anyhow::Result<RuleStore> {
    let conditions = ConditionRegistry::builtins();
    let actions = ActionRegistry::builtins();
    // Validation errors are logged one by one while loading.
    RuleStore::open(&config.engine.rules_path, &conditions, &actions)
        .context("rule source rejected, no booking was processed")
}

fn load_bookings(config: &Config) -> anyhow::Result<Vec<Booking>> {
    let path = &config.worker.bookings_path;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading bookings from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing bookings in {}", path.display()))
}

fn open_repository(config: &Config) -> anyhow::Result<Arc<dyn RecordRepository>> {
    let file = JsonFileRepository::open(&config.worker.state_path)
        .with_context(|| format!("opening state file {}", config.worker.state_path.display()))?;
    if config.worker.dry_run {
        info!("dry run: state file will not be written");
        return Ok(Arc::new(MemoryRepository::with_records(file.snapshot())));
    }
    Ok(Arc::new(file))
}

fn build_clock(config: &Config, now: Option<&str>) -> anyhow::Result<Box<dyn Clock>> {
    match now {
        Some(raw) => {
            let at = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("invalid --now '{raw}', expected RFC 3339"))?;
            Ok(Box::new(FixedClock(at)))
        }
        None => Ok(Box::new(SystemClock::new(config.engine.utc_offset()))),
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    apply_overrides(&mut config, &cli);
    config.log_summary();

    let store = open_rules(&config)?;
    if cli.check {
        let rules = store.current();
        info!(rules = rules.len(), enabled = rules.enabled_count(), "rule source is valid");
        return Ok(());
    }

    let bookings = load_bookings(&config)?;
    let repository = open_repository(&config)?;
    let clock = build_clock(&config, cli.now.as_deref())?;

    let services = Services::new(
        repository,
        Arc::new(Dispatcher::with_default(Arc::new(LogSender))),
    );
    let audit = Arc::new(AuditLog::with_max_entries(config.engine.audit_max_entries));
    let engine = RuleEngine::new(
        store.current(),
        store.conditions().clone(),
        store.actions().clone(),
    )
    .with_audit_log(Arc::clone(&audit));

    let mut contexts = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let id = booking.id.clone();
        match BookingContext::load(booking, clock.as_ref(), services.clone()).await {
            Ok(ctx) => contexts.push(ctx),
            // Without its flags a booking could be notified twice.
            Err(e) => warn!(booking = %id, error = %e, "could not read record state, skipping booking"),
        }
    }

    info!(bookings = contexts.len(), "cycle started");
    let outcomes = engine.process_batch(contexts).await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for outcome in &outcomes {
        for result in &outcome.results {
            let line = ResultLine {
                booking: outcome.booking.to_string(),
                result,
            };
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        }
    }
    out.flush()?;

    let summary = CycleSummary::from_outcomes(&outcomes);
    info!(
        records = summary.records,
        actions = summary.actions,
        failures = summary.failures,
        "cycle complete"
    );
    for line in summary.render().lines() {
        info!("{line}");
    }
    for outcome in outcomes.iter().filter(|o| o.failures().next().is_some()) {
        let booking = outcome.booking.to_string();
        for entry in audit.trail(&booking) {
            warn!(
                booking = %booking,
                rule = %entry.rule_name,
                phase = ?entry.phase,
                "{}", entry.message
            );
        }
    }
    Ok(())
}
