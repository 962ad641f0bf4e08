//! Safe core of the legacy Fortran extension runtime.
//!
//! Implements the collaborators the `IARGC`/`GETARG`/`GETLOG`/`FLUSH`
//! entry points delegate to: the execution environment and command-argument
//! retrieval, the external unit table with its statement protocol, the
//! character descriptor, fatal termination, and fixed-width copy-out.
//! Platform primitives and the C ABI live in `legacyrt-abi`.

#![forbid(unsafe_code)]

pub mod command;
pub mod descriptor;
pub mod io;
pub mod login;
pub mod pad;
pub mod terminator;

pub use command::{
    CommandStat, ExecutionEnvironment, argument_count, execution_environment,
    get_command_argument, install_execution_environment,
};
pub use descriptor::Descriptor;
pub use io::{Cookie, IoHandlers, Iostat, begin_flush, end_io_statement};
pub use login::{LoginError, LoginName, LoginNameSource, resolve_login_name};
pub use pad::copy_padded;
pub use terminator::{CrashAction, Terminator};
