//! Legacy extension entry points with Fortran-mangled names.
//!
//! ```fortran
//! RESULT = IARGC()
//! CALL GETARG(N, ARG)
//! CALL GETLOG(NAME)
//! CALL FLUSH(N)
//! ```

use std::ffi::c_char;

use legacyrt_core::command;
use legacyrt_core::descriptor::{DEFAULT_CHARACTER_KIND, Descriptor};
use legacyrt_core::io;
use legacyrt_core::login::fetch_login_name_with;
use legacyrt_core::runtime_check;
use legacyrt_core::terminator::Terminator;

use crate::PlatformLoginName;
use crate::runtime_config;
use crate::trace_log::{self, LogEntry, LogLevel};

const CALL_EVENT: &str = "extension.call";

/// Borrows a CHARACTER dummy argument. A null base or a non-positive length
/// yields an empty buffer.
///
/// # Safety
///
/// When `base` is non-null and `length > 0`, `base` must be valid for writes
/// of `length` bytes for `'a` and not aliased elsewhere.
pub(crate) unsafe fn character_buffer<'a>(base: *mut c_char, length: i64) -> &'a mut [u8] {
    let len = usize::try_from(length).unwrap_or(0);
    if base.is_null() || len == 0 {
        return &mut [];
    }
    // SAFETY: caller guarantees `base` addresses `len` writable bytes.
    unsafe { std::slice::from_raw_parts_mut(base.cast::<u8>(), len) }
}

// ---------------------------------------------------------------------------
// IARGC
// ---------------------------------------------------------------------------

/// `IARGC()`: arguments after the program name.
#[unsafe(no_mangle)]
pub extern "C" fn iargc_() -> i32 {
    runtime_config::ensure_applied();
    let count = command::argument_count(command::execution_environment());
    trace_log::emit(&LogEntry::new("iargc_", LogLevel::Trace, CALL_EVENT).with_value(count.into()));
    count
}

// ---------------------------------------------------------------------------
// GETARG
// ---------------------------------------------------------------------------

/// `CALL GETARG(N, ARG)`.
///
/// Status is discarded: an out-of-range `N` leaves `ARG` as the command
/// component left it (blank).
///
/// # Safety
///
/// `n` must point to a readable `i32`; `arg` must be valid for writes of
/// `length` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn getarg_(n: *const i32, arg: *mut c_char, length: i64) {
    runtime_config::ensure_applied();
    let terminator = Terminator::new(file!(), line!());
    runtime_check!(terminator, !n.is_null());
    // SAFETY: checked non-null above; INTEGER dummies arrive by reference.
    let index = unsafe { *n };
    // SAFETY: caller passes the CHARACTER base and its hidden length.
    let storage = unsafe { character_buffer(arg, length) };
    let char_len = storage.len();
    let Some(mut value) = Descriptor::create(DEFAULT_CHARACTER_KIND, char_len, storage, 0) else {
        terminator.crash(format_args!("GETARG: cannot describe CHARACTER*{char_len} argument"))
    };

    let stat = command::get_command_argument(
        command::execution_environment(),
        index,
        Some(&mut value),
        None,
        None,
        &terminator,
    );

    trace_log::emit(
        &LogEntry::new("getarg_", LogLevel::Trace, CALL_EVENT)
            .with_index(index)
            .with_length(length)
            .with_status(stat.code()),
    );
}

// ---------------------------------------------------------------------------
// GETLOG
// ---------------------------------------------------------------------------

/// `CALL GETLOG(NAME)`. Crashes when the platform lookup fails.
///
/// # Safety
///
/// `arg` must be valid for writes of `length` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn getlog_(arg: *mut c_char, length: i64) {
    runtime_config::ensure_applied();
    let terminator = Terminator::new(file!(), line!());
    // SAFETY: caller passes the CHARACTER base and its hidden length.
    let dst = unsafe { character_buffer(arg, length) };

    fetch_login_name_with(&PlatformLoginName::default(), dst, &terminator);

    trace_log::emit(&LogEntry::new("getlog_", LogLevel::Trace, CALL_EVENT).with_length(length));
}

// ---------------------------------------------------------------------------
// FLUSH
// ---------------------------------------------------------------------------

/// `CALL FLUSH(N)`, equivalent to the statement `FLUSH N` with no specifiers.
///
/// # Safety
///
/// `unit` must point to a readable `i32`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn flush_(unit: *const i32) {
    runtime_config::ensure_applied();
    let terminator = Terminator::new(file!(), line!());
    runtime_check!(terminator, !unit.is_null());
    // SAFETY: checked non-null above.
    let unit = unsafe { *unit };

    let cookie = io::begin_flush(unit, terminator);
    let stat = io::end_io_statement(cookie);

    trace_log::emit(
        &LogEntry::new("flush_", LogLevel::Trace, CALL_EVENT)
            .with_unit(unit)
            .with_status(stat.code()),
    );
}
