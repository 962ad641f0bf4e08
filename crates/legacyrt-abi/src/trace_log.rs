//! Structured JSONL trace records.
//!
//! One JSON object per line on stderr, written only while tracing is enabled
//! (see [`runtime_config`](crate::runtime_config)). Absent fields are omitted.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use legacyrt_core::terminator::CrashReport;
use serde::Serialize;

use crate::runtime_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub event: &'static str,
    pub symbol: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl LogEntry {
    #[must_use]
    pub fn new(symbol: &'static str, level: LogLevel, event: &'static str) -> Self {
        Self {
            timestamp_ms: now_ms(),
            level,
            event,
            symbol,
            unit: None,
            index: None,
            length: None,
            status: None,
            value: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: i32) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: i32) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The record as a single JSON line, without the newline.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}

pub fn emit(entry: &LogEntry) {
    if !runtime_config::trace_enabled() {
        return;
    }
    let mut line = entry.to_jsonl();
    line.push('\n');
    let _ = std::io::stderr().lock().write_all(line.as_bytes());
}

/// Crash observer installed by the runtime configuration.
pub(crate) fn record_crash(report: &CrashReport<'_>) {
    emit(
        &LogEntry::new("terminator", LogLevel::Error, "runtime.crash").with_detail(format!(
            "{}:{}: {}",
            report.source_file, report.line, report.message
        )),
    );
}
