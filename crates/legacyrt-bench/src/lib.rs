//! Shared fixtures for the copy-out benchmarks.

use legacyrt_core::command::ExecutionEnvironment;

/// CHARACTER widths the benchmarks sweep.
pub const WIDTHS: [usize; 3] = [8, 64, 256];

/// An argv of `count` arguments after the program name, each `arg_len` bytes.
#[must_use]
pub fn sample_environment(count: usize, arg_len: usize) -> ExecutionEnvironment {
    let program = b"bench-prog".to_vec();
    let args = (0..count).map(|i| vec![b'a' + (i % 26) as u8; arg_len]);
    ExecutionEnvironment::new(std::iter::once(program).chain(args))
}
