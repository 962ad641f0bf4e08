//! Process arguments as compiled programs see them.
//!
//! Argument 0 is the program name. [`argument_count`] follows the Fortran
//! convention and does not count it, so the valid `GETARG` indices are
//! `0..=argument_count()`.

use std::ffi::OsString;
use std::sync::OnceLock;

use crate::descriptor::Descriptor;
use crate::pad::{copy_padded, fill_blanks};
use crate::terminator::Terminator;

pub const STAT_OK: i32 = 0;
pub const STAT_VALUE_TOO_SHORT: i32 = -1;
pub const STAT_FAILED: i32 = 1;
pub const STAT_MISSING_ARGUMENT: i32 = 2;

/// Outcome of a command-argument query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStat {
    Ok,
    /// The value did not fit and was truncated.
    ValueTooShort,
    /// The index is out of range.
    Failed,
    /// The argument exists but is empty.
    MissingArgument,
}

impl CommandStat {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => STAT_OK,
            Self::ValueTooShort => STAT_VALUE_TOO_SHORT,
            Self::Failed => STAT_FAILED,
            Self::MissingArgument => STAT_MISSING_ARGUMENT,
        }
    }

    /// Text stored into an ERRMSG descriptor.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "No error",
            Self::ValueTooShort => "Value too short",
            Self::Failed => "Failed",
            Self::MissingArgument => "Missing argument",
        }
    }
}

/// The argument vector captured at program start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    argv: Vec<Vec<u8>>,
}

impl ExecutionEnvironment {
    pub fn new<I, A>(argv: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// Environment of the running process, as the host reports it.
    #[must_use]
    pub fn from_host() -> Self {
        Self::new(std::env::args_os().map(OsString::into_encoded_bytes))
    }

    #[must_use]
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Argument `n`, or `None` when `n` is negative or past the end.
    #[must_use]
    pub fn argument(&self, n: i32) -> Option<&[u8]> {
        let idx = usize::try_from(n).ok()?;
        self.argv.get(idx).map(Vec::as_slice)
    }
}

static EXECUTION_ENVIRONMENT: OnceLock<ExecutionEnvironment> = OnceLock::new();

/// Installs the process-wide environment. Fails, handing `env` back, when one
/// is already in place.
pub fn install_execution_environment(env: ExecutionEnvironment) -> Result<(), ExecutionEnvironment> {
    EXECUTION_ENVIRONMENT.set(env)
}

/// The process-wide environment, captured from the host on first use when
/// nothing was installed.
pub fn execution_environment() -> &'static ExecutionEnvironment {
    EXECUTION_ENVIRONMENT.get_or_init(ExecutionEnvironment::from_host)
}

/// Number of arguments after the program name.
#[must_use]
pub fn argument_count(env: &ExecutionEnvironment) -> i32 {
    match env.argc() {
        0 | 1 => 0,
        argc => i32::try_from(argc - 1).unwrap_or(i32::MAX),
    }
}

/// Retrieves argument `n`.
///
/// `value` is blank-filled before anything else, so on failure it reads as
/// blanks. `length` is set to 0 first and to the argument's length on
/// success. `errmsg` receives the status message for every non-`Ok` result.
pub fn get_command_argument(
    env: &ExecutionEnvironment,
    n: i32,
    mut value: Option<&mut Descriptor<'_>>,
    mut length: Option<&mut i64>,
    errmsg: Option<&mut Descriptor<'_>>,
    terminator: &Terminator,
) -> CommandStat {
    if let Some(v) = value.as_deref_mut() {
        crate::runtime_check!(terminator, v.is_character());
        fill_blanks(v.bytes_mut());
    }
    if let Some(len) = length.as_deref_mut() {
        *len = 0;
    }

    let stat = match env.argument(n) {
        None => CommandStat::Failed,
        Some([]) => CommandStat::MissingArgument,
        Some(arg) => {
            if let Some(len) = length {
                *len = i64::try_from(arg.len()).unwrap_or(i64::MAX);
            }
            match value {
                Some(v) => {
                    let copied = copy_padded(v.bytes_mut(), arg);
                    if copied < arg.len() {
                        CommandStat::ValueTooShort
                    } else {
                        CommandStat::Ok
                    }
                }
                None => CommandStat::Ok,
            }
        }
    };

    if stat != CommandStat::Ok
        && let Some(msg) = errmsg
    {
        crate::runtime_check!(terminator, msg.is_character());
        copy_padded(msg.bytes_mut(), stat.message().as_bytes());
    }
    stat
}
