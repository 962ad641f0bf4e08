//! Login-name resolution behind a platform strategy.
//!
//! A [`LoginNameSource`] writes a NUL-terminated name into a scratch buffer
//! of [`LOGIN_SCRATCH_LEN`] bytes. The ABI crate picks the POSIX or Windows
//! source at build time; [`BlankLoginName`] covers platforms with neither and
//! reports an unknown user as an all-blank name.

use std::fmt;

use crate::pad::{BLANK, c_prefix, copy_padded};
use crate::terminator::Terminator;

/// Longest login name the runtime accepts (Linux `LOGIN_NAME_MAX`, Windows `UNLEN`).
pub const LOGIN_NAME_MAX: usize = 256;
/// Scratch capacity: the name plus its terminator.
pub const LOGIN_SCRATCH_LEN: usize = LOGIN_NAME_MAX + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    /// The OS lookup failed with this error number.
    Os(i32),
    /// The name could not be converted to the runtime's byte encoding.
    Encoding,
    Empty,
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Os(errno) => write!(f, "login name lookup failed (os error {errno})"),
            Self::Encoding => f.write_str("login name is not valid Unicode"),
            Self::Empty => f.write_str("login name is empty"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Platform primitive that produces the current user's login name.
pub trait LoginNameSource {
    /// Writes the name, NUL-terminated, into `scratch`.
    fn fill(&self, scratch: &mut [u8]) -> Result<(), LoginError>;
}

impl<S: LoginNameSource + ?Sized> LoginNameSource for &S {
    fn fill(&self, scratch: &mut [u8]) -> Result<(), LoginError> {
        (**self).fill(scratch)
    }
}

/// Source for platforms with no login-name facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankLoginName;

impl LoginNameSource for BlankLoginName {
    fn fill(&self, scratch: &mut [u8]) -> Result<(), LoginError> {
        if let Some((terminator, name)) = scratch.split_last_mut() {
            name.fill(BLANK);
            *terminator = 0;
        }
        Ok(())
    }
}

/// Narrows a UTF-16 name (up to its first NUL) into `scratch` as UTF-8.
///
/// The result is cut at a character boundary so it fits with its terminator.
pub fn narrow_wide_name(wide: &[u16], scratch: &mut [u8]) -> Result<(), LoginError> {
    let wide = match wide.iter().position(|&c| c == 0) {
        Some(end) => &wide[..end],
        None => wide,
    };
    let name = String::from_utf16(wide).map_err(|_| LoginError::Encoding)?;
    let Some(room) = scratch.len().checked_sub(1) else {
        return Err(LoginError::Empty);
    };

    let mut end = name.len().min(room);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    scratch[..end].copy_from_slice(&name.as_bytes()[..end]);
    scratch[end] = 0;

    if end == 0 {
        Err(LoginError::Empty)
    } else {
        Ok(())
    }
}

/// A resolved login name held in its scratch buffer.
#[derive(Clone)]
pub struct LoginName {
    scratch: [u8; LOGIN_SCRATCH_LEN],
}

impl LoginName {
    /// Name bytes, without the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        c_prefix(&self.scratch)
    }

    /// Fixed-width copy-out into a CHARACTER buffer.
    pub fn copy_padded_into(&self, dst: &mut [u8]) -> usize {
        copy_padded(dst, self.as_bytes())
    }
}

impl fmt::Debug for LoginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoginName")
            .field(&String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

/// Result-returning lookup for Rust callers.
pub fn resolve_login_name<S: LoginNameSource + ?Sized>(source: &S) -> Result<LoginName, LoginError> {
    let mut scratch = [0u8; LOGIN_SCRATCH_LEN];
    source.fill(&mut scratch)?;
    scratch[LOGIN_NAME_MAX] = 0;
    Ok(LoginName { scratch })
}

/// `GETLOG` semantics: copy the name out blank-padded, or crash.
pub fn fetch_login_name_with<S: LoginNameSource + ?Sized>(
    source: &S,
    dst: &mut [u8],
    terminator: &Terminator,
) {
    match resolve_login_name(source) {
        Ok(name) => {
            name.copy_padded_into(dst);
        }
        Err(err) => terminator.crash(format_args!("GETLOG: {err}")),
    }
}
