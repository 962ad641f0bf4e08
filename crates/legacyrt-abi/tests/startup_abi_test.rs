//! Program-start capture. Kept to a single test: the execution environment
//! can be installed once per process.

use std::ptr;

use legacyrt_abi::extensions_abi::{getarg_, iargc_};
use legacyrt_abi::startup_abi::_FortranAProgramStart;

#[test]
fn program_start_argv_drives_iargc_and_getarg() {
    let argv = [
        c"prog".as_ptr(),
        c"alpha".as_ptr(),
        c"beta".as_ptr(),
        ptr::null(),
    ];
    let envp = [ptr::null()];
    // SAFETY: `argv` holds three C strings and a terminator; `envp` is empty.
    unsafe { _FortranAProgramStart(3, argv.as_ptr(), envp.as_ptr()) };

    assert_eq!(iargc_(), 2);

    let mut buf = [0u8; 10];
    let n = 1i32;
    // SAFETY: `n` is readable and `buf` writable for 10 bytes.
    unsafe { getarg_(&n, buf.as_mut_ptr().cast(), 10) };
    assert_eq!(&buf, b"alpha     ");

    let mut short = [0u8; 2];
    let n = 2i32;
    // SAFETY: as above, two bytes.
    unsafe { getarg_(&n, short.as_mut_ptr().cast(), 2) };
    assert_eq!(&short, b"be");

    // A second start does not replace the first argv.
    let other = [c"other".as_ptr(), ptr::null()];
    // SAFETY: one C string and a terminator.
    unsafe { _FortranAProgramStart(1, other.as_ptr(), envp.as_ptr()) };
    assert_eq!(iargc_(), 2);
}
