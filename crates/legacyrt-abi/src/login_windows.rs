//! Windows login-name primitive.

use legacyrt_core::login::{LoginError, LoginNameSource, narrow_wide_name};

/// `UNLEN` from `lmcons.h`.
const UNLEN: usize = 256;

#[link(name = "advapi32")]
unsafe extern "system" {
    #[link_name = "GetUserNameW"]
    fn get_user_name_w(buffer: *mut u16, size: *mut u32) -> i32;
}

/// `GetUserNameW`, narrowed to UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsLoginName;

impl LoginNameSource for WindowsLoginName {
    fn fill(&self, scratch: &mut [u8]) -> Result<(), LoginError> {
        let mut wide = [0u16; UNLEN + 1];
        let mut len = wide.len() as u32;
        // SAFETY: `wide` holds `len` writable UTF-16 units.
        let ok = unsafe { get_user_name_w(wide.as_mut_ptr(), &mut len) };
        if ok == 0 {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(-1);
            return Err(LoginError::Os(errno));
        }
        // `len` counts the terminator.
        let used = (len as usize).min(wide.len());
        narrow_wide_name(&wide[..used], scratch)
    }
}
