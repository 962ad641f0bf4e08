//! In-process scenarios over the C entry points.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use legacyrt_abi::extensions_abi::{flush_, getarg_, getlog_, iargc_};
use legacyrt_abi::runtime_config;
use legacyrt_core::io::{ExternalUnit, lock_units, unit_table};
use legacyrt_core::login::{BlankLoginName, LoginError, LoginNameSource, fetch_login_name_with};
use legacyrt_core::terminator::Terminator;
use serde::{Deserialize, Serialize};

/// Errno reported by [`FailingLoginName`] (`ENXIO`, no controlling terminal).
pub const FAILING_LOGIN_ERRNO: i32 = 6;

/// Source that always fails, standing in for a process with no login session.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingLoginName;

impl LoginNameSource for FailingLoginName {
    fn fill(&self, _scratch: &mut [u8]) -> Result<(), LoginError> {
        Err(LoginError::Os(FAILING_LOGIN_ERRNO))
    }
}

/// Errno reported by [`FullDeviceSink`] (`ENOSPC`).
pub const FULL_DEVICE_ERRNO: i32 = 28;

/// Output sink that rejects every write, like a file on a full device.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullDeviceSink;

impl Write for FullDeviceSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from_raw_os_error(FULL_DEVICE_ERRNO))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from_raw_os_error(FULL_DEVICE_ERRNO))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoginSource {
    /// The target's native primitive, through `getlog_`.
    Platform,
    Blank,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgsReport {
    pub count: i32,
    pub width: usize,
    /// `GETARG(n)` for every `n` in `0..=count`, lossily decoded.
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReport {
    pub source: String,
    pub width: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub unit: i32,
    pub flushed: bool,
    /// Whether the written record could be read back from the file.
    pub visible: bool,
}

fn getarg(n: i32, width: usize) -> Vec<u8> {
    let mut buf = vec![0u8; width];
    let length = i64::try_from(width).unwrap_or(i64::MAX);
    // SAFETY: `n` is readable and `buf` is writable for `width` bytes.
    unsafe { getarg_(&n, buf.as_mut_ptr().cast(), length) };
    buf
}

/// `IARGC()` and then `GETARG` into a `width`-byte buffer for each index.
#[must_use]
pub fn probe_arguments(width: usize) -> ArgsReport {
    let count = iargc_();
    let arguments = (0..=count)
        .map(|n| String::from_utf8_lossy(&getarg(n, width)).into_owned())
        .collect();
    ArgsReport {
        count,
        width,
        arguments,
    }
}

/// `GETLOG` into a `width`-byte buffer. A failing source does not return.
#[must_use]
pub fn probe_login(source: LoginSource, width: usize) -> LoginReport {
    runtime_config::ensure_applied();
    let mut buf = vec![0u8; width];
    match source {
        LoginSource::Platform => {
            let length = i64::try_from(width).unwrap_or(i64::MAX);
            // SAFETY: `buf` is writable for `width` bytes.
            unsafe { getlog_(buf.as_mut_ptr().cast(), length) };
        }
        LoginSource::Blank => {
            fetch_login_name_with(&BlankLoginName, &mut buf, &Terminator::here());
        }
        LoginSource::Fail => {
            fetch_login_name_with(&FailingLoginName, &mut buf, &Terminator::here());
        }
    }
    LoginReport {
        source: format!("{source:?}").to_ascii_lowercase(),
        width,
        name: String::from_utf8_lossy(&buf).into_owned(),
    }
}

/// Writes one record to `unit` connected on `path`, optionally `FLUSH`es it,
/// and checks whether the record reached the file.
///
/// Without a path the unit is left as it is, so `FLUSH` of an unconnected or
/// negative unit can be exercised.
pub fn probe_flush(
    unit: i32,
    target: Option<(&Path, &str)>,
    flush: bool,
) -> Result<FlushReport, Box<dyn std::error::Error>> {
    if let Some((path, text)) = target {
        let file = File::create(path)?;
        let mut units = lock_units(unit_table());
        units.connect(ExternalUnit::output(unit, Box::new(file)))?;
        units.write_record(unit, text.as_bytes())?;
    }

    if flush {
        // SAFETY: `unit` is a readable i32.
        unsafe { flush_(&unit) };
    }

    let visible = match target {
        Some((path, text)) => {
            let contents = std::fs::read(path)?;
            contents.starts_with(text.as_bytes())
        }
        None => false,
    };
    Ok(FlushReport {
        unit,
        flushed: flush,
        visible,
    })
}

/// Connects `unit` to a [`FullDeviceSink`], writes `text` and `FLUSH`es it.
/// With no handler the sink failure is fatal, so this returns only if the
/// flush unexpectedly succeeds.
pub fn probe_failing_flush(unit: i32, text: &str) -> Result<FlushReport, Box<dyn std::error::Error>> {
    {
        let mut units = lock_units(unit_table());
        units.connect(ExternalUnit::output(unit, Box::new(FullDeviceSink)))?;
        units.write_record(unit, text.as_bytes())?;
    }
    // SAFETY: `unit` is a readable i32.
    unsafe { flush_(&unit) };
    Ok(FlushReport {
        unit,
        flushed: true,
        visible: false,
    })
}

/// `CALL GETARG` with a null index reference. The entry point's runtime
/// check terminates the process.
pub fn probe_null_index(width: usize) {
    let mut buf = vec![0u8; width];
    let length = i64::try_from(width).unwrap_or(i64::MAX);
    // SAFETY: a null `n` is rejected before any read; `buf` is writable for
    // `width` bytes.
    unsafe { getarg_(std::ptr::null(), buf.as_mut_ptr().cast(), length) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacyrt_core::login::resolve_login_name;

    #[test]
    fn blank_login_probe_is_all_blanks() {
        let report = probe_login(LoginSource::Blank, 12);
        assert_eq!(report.source, "blank");
        assert_eq!(report.name, " ".repeat(12));
    }

    #[test]
    fn failing_source_reports_errno() {
        assert_eq!(
            resolve_login_name(&FailingLoginName).unwrap_err(),
            LoginError::Os(FAILING_LOGIN_ERRNO)
        );
    }

    #[test]
    fn argument_probe_covers_program_name() {
        let report = probe_arguments(4);
        assert!(report.count >= 0);
        assert_eq!(report.arguments.len(), report.count as usize + 1);
        assert!(report.arguments.iter().all(|a| a.len() == 4));
    }

    #[test]
    fn full_device_sink_reports_enospc() {
        let mut sink = FullDeviceSink;
        let err = sink.write_all(b"x").unwrap_err();
        assert_eq!(err.raw_os_error(), Some(FULL_DEVICE_ERRNO));
        assert_eq!(sink.flush().unwrap_err().raw_os_error(), Some(FULL_DEVICE_ERRNO));
    }

    #[test]
    fn flush_probe_without_target_is_not_visible() {
        let report = probe_flush(77, None, true).unwrap();
        assert!(report.flushed);
        assert!(!report.visible);
    }
}
