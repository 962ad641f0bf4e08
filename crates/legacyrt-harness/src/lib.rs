//! Drives the extension entry points from inside a process and reports what
//! a Fortran caller would observe.
//!
//! The `legacyrt-probe` binary wraps these in subcommands so the process
//! tests can check fatal paths, exit codes and trace output end to end.

pub mod probe;

pub use probe::{ArgsReport, FailingLoginName, FlushReport, LoginReport, LoginSource};
