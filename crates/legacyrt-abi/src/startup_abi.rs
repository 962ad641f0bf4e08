//! Program-start capture of the argument vector.
//!
//! The compiled main program calls `_FortranAProgramStart` with the C
//! `argc`/`argv` before any user code runs. Processes that never call it fall
//! back to the host's view of argv on first use.

use std::ffi::{CStr, c_char, c_int};

use legacyrt_core::command::{ExecutionEnvironment, install_execution_environment};

use crate::runtime_config;
use crate::trace_log::{self, LogEntry, LogLevel};

/// Maximum number of argv entries scanned at program start.
pub const MAX_STARTUP_SCAN: usize = 4096;

#[must_use]
pub fn normalize_argc(argc: c_int) -> usize {
    usize::try_from(argc).unwrap_or(0).min(MAX_STARTUP_SCAN)
}

/// Copies up to `argc` argv strings, stopping early at a null slot.
///
/// # Safety
///
/// `argv` is null or points to at least `argc` readable pointer slots, each
/// null or a NUL-terminated string.
pub unsafe fn capture_arguments(argc: c_int, argv: *const *const c_char) -> ExecutionEnvironment {
    if argv.is_null() {
        return ExecutionEnvironment::default();
    }

    let mut args = Vec::new();
    for idx in 0..normalize_argc(argc) {
        // SAFETY: caller guarantees `argc` readable slots.
        let entry = unsafe { *argv.add(idx) };
        if entry.is_null() {
            break;
        }
        // SAFETY: non-null argv entries are NUL-terminated strings.
        args.push(unsafe { CStr::from_ptr(entry) }.to_bytes().to_vec());
    }
    ExecutionEnvironment::new(args)
}

/// Records argv for `IARGC`/`GETARG`. Only the first call takes effect.
///
/// # Safety
///
/// Same contract as [`capture_arguments`]. `envp` is not read.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn _FortranAProgramStart(
    argc: c_int,
    argv: *const *const c_char,
    _envp: *const *const c_char,
) {
    runtime_config::ensure_applied();
    // SAFETY: forwarded caller contract.
    let env = unsafe { capture_arguments(argc, argv) };
    let captured = env.argc();
    let event = match install_execution_environment(env) {
        Ok(()) => "startup.argv_captured",
        Err(_) => "startup.argv_already_set",
    };
    trace_log::emit(
        &LogEntry::new("_FortranAProgramStart", LogLevel::Info, event)
            .with_value(i64::try_from(captured).unwrap_or(i64::MAX)),
    );
}
