//! Criterion benches for the carry-less range coder.
//!
//! Symbol streams are deterministic across runs (LCG-based) so results are
//! comparable over time. Throughput is reported in **symbols**.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use alnpack_rc::{AdaptiveModel, RangeDecoder, RangeEncoder};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Deterministic skewed symbol stream of length `n` over `k` symbols.
#[inline]
fn det_symbols(n: usize, k: usize, seed: u64) -> Vec<usize> {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;

    let mut a = A.wrapping_mul(seed).wrapping_add(C);
    (0..n)
        .map(|_| {
            a = a.wrapping_mul(A).wrapping_add(C);
            // Bias toward symbol 0, the shape post-RLE columns take.
            let r = (a >> 16) as usize;
            if r % 4 != 0 {
                0
            } else {
                r % k
            }
        })
        .collect()
}

fn bench_coder(c: &mut Criterion) {
    let n = 1usize << 16;
    let symbols = det_symbols(n, 4, 2024);

    let mut group = c.benchmark_group("range_coder");
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("encode_64k", |b| {
        b.iter(|| {
            let mut enc = RangeEncoder::new();
            let mut m = AdaptiveModel::new(4, 256);
            for &s in &symbols {
                enc.encode(&mut m, black_box(s));
            }
            black_box(enc.finish())
        })
    });

    let mut enc = RangeEncoder::new();
    let mut m = AdaptiveModel::new(4, 256);
    for &s in &symbols {
        enc.encode(&mut m, s);
    }
    let bytes = enc.finish();

    group.bench_function("decode_64k", |b| {
        b.iter(|| {
            let mut dec = RangeDecoder::new(black_box(&bytes));
            let mut m = AdaptiveModel::new(4, 256);
            let mut last = 0usize;
            for _ in 0..n {
                last = dec.decode(&mut m);
            }
            black_box(last)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_coder);
criterion_main!(benches);
