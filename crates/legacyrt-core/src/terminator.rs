//! Fatal runtime errors.
//!
//! A [`Terminator`] carries the source location of the runtime call that
//! created it. [`Terminator::crash`] prints the Fortran-style fatal line to
//! stderr, flushes connected output units, and ends the process with the
//! configured [`CrashAction`]. It never returns.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

const ACTION_ABORT: i64 = i64::MIN;

static CRASH_ACTION: AtomicI64 = AtomicI64::new(ACTION_ABORT);
static CRASH_OBSERVER: OnceLock<fn(&CrashReport<'_>)> = OnceLock::new();

/// How the process ends after a fatal error has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrashAction {
    /// `std::process::abort`.
    #[default]
    Abort,
    /// `std::process::exit` with the given status.
    Exit(i32),
}

impl CrashAction {
    fn encode(self) -> i64 {
        match self {
            Self::Abort => ACTION_ABORT,
            Self::Exit(code) => i64::from(code),
        }
    }

    fn decode(raw: i64) -> Self {
        if raw == ACTION_ABORT {
            return Self::Abort;
        }
        i32::try_from(raw).map_or(Self::Abort, Self::Exit)
    }
}

/// Sets the process-wide crash action.
pub fn set_crash_action(action: CrashAction) {
    CRASH_ACTION.store(action.encode(), Ordering::Relaxed);
}

#[must_use]
pub fn crash_action() -> CrashAction {
    CrashAction::decode(CRASH_ACTION.load(Ordering::Relaxed))
}

/// What an observer sees just before the process ends.
#[derive(Debug, Clone, Copy)]
pub struct CrashReport<'a> {
    pub source_file: &'static str,
    pub line: u32,
    pub message: &'a str,
}

/// Installs a hook run ahead of the fatal line. Only the first call wins.
pub fn set_crash_observer(observer: fn(&CrashReport<'_>)) -> bool {
    CRASH_OBSERVER.set(observer).is_ok()
}

/// Source location of a runtime call, used for fatal reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminator {
    source_file: &'static str,
    line: u32,
}

impl Terminator {
    #[must_use]
    pub const fn new(source_file: &'static str, line: u32) -> Self {
        Self { source_file, line }
    }

    /// Terminator at the caller's location.
    #[track_caller]
    #[must_use]
    pub fn here() -> Self {
        let location = std::panic::Location::caller();
        Self::new(location.file(), location.line())
    }

    #[must_use]
    pub const fn source_file(&self) -> &'static str {
        self.source_file
    }

    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// The line written to stderr for `message`.
    #[must_use]
    pub fn fatal_line(&self, message: &str) -> String {
        format!(
            "\nfatal Fortran runtime error({}:{}): {message}\n",
            self.source_file, self.line
        )
    }

    pub fn crash(&self, args: fmt::Arguments<'_>) -> ! {
        let message = args.to_string();
        if let Some(observer) = CRASH_OBSERVER.get() {
            observer(&CrashReport {
                source_file: self.source_file,
                line: self.line,
                message: &message,
            });
        }

        crate::io::flush_output_on_crash();

        let line = self.fatal_line(&message);
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
        drop(stderr);

        match crash_action() {
            CrashAction::Abort => std::process::abort(),
            CrashAction::Exit(code) => std::process::exit(code),
        }
    }

    /// Failure path of [`runtime_check!`](crate::runtime_check).
    pub fn check_failed(&self, predicate: &str, file: &str, line: u32) -> ! {
        self.crash(format_args!(
            "Internal error: RUNTIME_CHECK({predicate}) failed at {file}({line})"
        ))
    }
}

/// Crashes through `$terminator` when `$pred` is false.
#[macro_export]
macro_rules! runtime_check {
    ($terminator:expr, $pred:expr $(,)?) => {
        if !($pred) {
            $terminator.check_failed(stringify!($pred), file!(), line!())
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_action_round_trips_through_atomic_encoding() {
        assert_eq!(CrashAction::decode(CrashAction::Abort.encode()), CrashAction::Abort);
        assert_eq!(CrashAction::decode(CrashAction::Exit(3).encode()), CrashAction::Exit(3));
        assert_eq!(
            CrashAction::decode(CrashAction::Exit(i32::MIN).encode()),
            CrashAction::Exit(i32::MIN)
        );
        assert_eq!(CrashAction::decode(i64::MAX), CrashAction::Abort);
    }

    #[test]
    fn fatal_line_names_file_and_line() {
        let t = Terminator::new("extensions.rs", 42);
        assert_eq!(
            t.fatal_line("GETLOG: login name is empty"),
            "\nfatal Fortran runtime error(extensions.rs:42): GETLOG: login name is empty\n"
        );
    }

    #[test]
    fn here_records_caller_location() {
        let t = Terminator::here();
        assert!(t.source_file().ends_with("terminator.rs"));
        assert!(t.line() > 0);
    }

    #[test]
    fn passing_runtime_check_does_not_crash() {
        let t = Terminator::here();
        crate::runtime_check!(t, 1 + 1 == 2);
    }
}
