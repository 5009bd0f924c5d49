use std::env;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_i32(profile: &str, key: &str, default: i32) -> i32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

/// Settings built once at start-up and handed by reference to the engine and
/// to every collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub engine: EngineConfig,
    pub worker: WorkerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `BOOKWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("BOOKWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            engine: EngineConfig::from_env_profiled(p),
            worker: WorkerConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  engine:  rules={}, utc_offset_minutes={}, audit_max={}",
            self.engine.rules_path.display(), self.engine.utc_offset_minutes, self.engine.audit_max_entries);
        tracing::info!("  worker:  bookings={}, state={}, dry_run={}",
            self.worker.bookings_path.display(), self.worker.state_path.display(), self.worker.dry_run);
    }
}

// ── Engine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule source (YAML or JSON file).
    pub rules_path: PathBuf,
    /// Local offset used for "now"; hour conditions read the hour in this offset.
    pub utc_offset_minutes: i32,
    /// Per-rule cap of the in-memory audit log.
    pub audit_max_entries: usize,
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_path: PathBuf::from(profiled_env_or(p, "RULES_PATH", "data/rules/booking-rules.yml")),
            utc_offset_minutes: profiled_env_i32(p, "UTC_OFFSET_MINUTES", 0),
            audit_max_entries: profiled_env_usize(p, "AUDIT_MAX_ENTRIES", 500),
        }
    }

    /// The configured offset. Out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!(minutes = self.utc_offset_minutes, "UTC offset out of range, using UTC");
            Utc.fix()
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("data/rules/booking-rules.yml"),
            utc_offset_minutes: 0,
            audit_max_entries: 500,
        }
    }
}

// ── Worker ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// JSON list of bookings fetched for this cycle.
    pub bookings_path: PathBuf,
    /// JSON state file of durable records.
    pub state_path: PathBuf,
    /// Read the state file but keep every write in memory.
    pub dry_run: bool,
}

impl WorkerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            bookings_path: PathBuf::from(profiled_env_or(p, "BOOKINGS_PATH", "data/bookings.json")),
            state_path: PathBuf::from(profiled_env_or(p, "STATE_PATH", "data/state.json")),
            dry_run: profiled_env_bool(p, "DRY_RUN", true),
        }
    }
}
