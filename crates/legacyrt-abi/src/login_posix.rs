//! POSIX login-name primitive.

use std::ffi::{c_char, c_int};

use legacyrt_core::login::{LoginError, LoginNameSource};

unsafe extern "C" {
    #[link_name = "getlogin_r"]
    fn host_getlogin_r(buf: *mut c_char, bufsize: libc::size_t) -> c_int;
}

#[inline]
fn last_host_errno(default_errno: c_int) -> c_int {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(default_errno)
}

/// `getlogin_r(3)`, the reentrant lookup of the session's login name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixLoginName;

impl LoginNameSource for PosixLoginName {
    fn fill(&self, scratch: &mut [u8]) -> Result<(), LoginError> {
        if scratch.is_empty() {
            return Err(LoginError::Os(libc::ERANGE));
        }
        // SAFETY: `scratch` is writable for its full length.
        let rc = unsafe { host_getlogin_r(scratch.as_mut_ptr().cast::<c_char>(), scratch.len()) };
        match rc {
            0 => Ok(()),
            // Some C libraries return -1 and leave the reason in errno.
            -1 => Err(LoginError::Os(last_host_errno(libc::ENOENT))),
            errno => Err(LoginError::Os(errno)),
        }
    }
}
