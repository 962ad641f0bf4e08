//! Copy-out microbenchmarks: blank padding, GETARG retrieval and login-name
//! resolution across CHARACTER widths.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use legacyrt_bench::{WIDTHS, sample_environment};
use legacyrt_core::command::get_command_argument;
use legacyrt_core::descriptor::Descriptor;
use legacyrt_core::login::{BlankLoginName, resolve_login_name};
use legacyrt_core::pad::copy_padded;
use legacyrt_core::terminator::Terminator;

const SOURCE_LEN: usize = 32;

fn bench_copy_padded(c: &mut Criterion) {
    let src = vec![b'x'; SOURCE_LEN];
    let mut group = c.benchmark_group("copy_padded");
    for width in WIDTHS {
        let mut dst = vec![0u8; width];
        group.throughput(Throughput::Bytes(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| black_box(copy_padded(black_box(dst.as_mut_slice()), black_box(src.as_slice()))));
        });
    }
    group.finish();
}

fn bench_get_command_argument(c: &mut Criterion) {
    let env = sample_environment(8, SOURCE_LEN);
    let terminator = Terminator::here();
    let mut group = c.benchmark_group("get_command_argument");
    for width in WIDTHS {
        let mut storage = vec![0u8; width];
        let mut length = 0i64;
        group.throughput(Throughput::Bytes(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let mut value = Descriptor::character(&mut storage);
                let stat = get_command_argument(
                    &env,
                    black_box(3),
                    Some(&mut value),
                    Some(&mut length),
                    None,
                    &terminator,
                );
                black_box(stat)
            });
        });
    }
    group.finish();
}

fn bench_resolve_blank_login(c: &mut Criterion) {
    let mut dst = [0u8; 64];
    c.bench_function("resolve_login_name/blank", |b| {
        b.iter(|| {
            if let Ok(name) = resolve_login_name(&BlankLoginName) {
                black_box(name.copy_padded_into(&mut dst));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_copy_padded,
    bench_get_command_argument,
    bench_resolve_blank_login
);
criterion_main!(benches);
