//! Runtime configuration from the process environment.
//!
//! - `LEGACYRT_TRACE`: `1`, `on`, `true`, `yes` or `stderr` enables JSONL trace
//!   records on stderr. Default off.
//! - `LEGACYRT_CRASH`: `abort` (default), `exit`, or `exit:<code>`.
//!
//! The environment is read once, on the first entry-point call, and the
//! result is sticky for the life of the process.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use legacyrt_core::terminator::{self, CrashAction};

use crate::trace_log;

pub const TRACE_ENV: &str = "LEGACYRT_TRACE";
pub const CRASH_ENV: &str = "LEGACYRT_CRASH";
const DEFAULT_EXIT_CODE: i32 = 1;

static APPLIED: OnceLock<RuntimeConfig> = OnceLock::new();
static TRACE_ENABLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    pub trace: bool,
    pub crash: CrashAction,
}

impl RuntimeConfig {
    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            trace: lookup(TRACE_ENV).is_some_and(|raw| parse_trace_value(&raw)),
            crash: lookup(CRASH_ENV).map_or(CrashAction::Abort, |raw| parse_crash_value(&raw)),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[must_use]
pub fn parse_trace_value(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "on" | "true" | "yes" | "stderr"
    )
}

/// Unrecognised values fall back to abort.
#[must_use]
pub fn parse_crash_value(raw: &str) -> CrashAction {
    let value = raw.trim().to_ascii_lowercase();
    match value.as_str() {
        "exit" => CrashAction::Exit(DEFAULT_EXIT_CODE),
        other => other
            .strip_prefix("exit:")
            .and_then(|code| code.parse::<i32>().ok())
            .map_or(CrashAction::Abort, CrashAction::Exit),
    }
}

/// Installs `config` process-wide.
pub fn apply(config: RuntimeConfig) {
    TRACE_ENABLED.store(config.trace, Ordering::Relaxed);
    terminator::set_crash_action(config.crash);
    let _ = terminator::set_crash_observer(trace_log::record_crash);
}

/// Reads and applies the environment on first use and returns the config in
/// effect. Concurrent first calls wait for the one doing the resolution.
pub fn ensure_applied() -> RuntimeConfig {
    *APPLIED.get_or_init(|| {
        let config = RuntimeConfig::from_env();
        apply(config);
        config
    })
}

#[must_use]
pub fn trace_enabled() -> bool {
    TRACE_ENABLED.load(Ordering::Relaxed)
}
