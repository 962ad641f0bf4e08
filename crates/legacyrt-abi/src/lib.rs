//! C ABI for the legacy Fortran extension subroutines.
//!
//! Compiled Fortran reaches these through trailing-underscore external
//! names (`iargc_`, `getarg_`, `getlog_`, `flush_`), passing scalars by
//! reference and CHARACTER dummies as a base pointer plus a hidden `i64`
//! length. Program start records argv through `_FortranAProgramStart`.
//!
//! The login-name primitive is chosen per target: `getlogin_r` on POSIX,
//! `GetUserNameW` on Windows, and an all-blank name elsewhere.

pub mod extensions_abi;
#[cfg(unix)]
pub mod login_posix;
#[cfg(windows)]
pub mod login_windows;
pub mod runtime_config;
pub mod startup_abi;
pub mod trace_log;

use legacyrt_core::login::{LoginError, LoginName, resolve_login_name};

#[cfg(unix)]
pub type PlatformLoginName = login_posix::PosixLoginName;
#[cfg(windows)]
pub type PlatformLoginName = login_windows::WindowsLoginName;
#[cfg(not(any(unix, windows)))]
pub type PlatformLoginName = legacyrt_core::login::BlankLoginName;

/// Login name through the platform primitive, for callers that want an error
/// instead of the fatal `GETLOG` contract.
pub fn login_name() -> Result<LoginName, LoginError> {
    resolve_login_name(&PlatformLoginName::default())
}
