use b3engine::portable;
use b3engine::{Hasher, BLOCK_LEN, CHUNK_LEN, OUT_LEN};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const KIB: usize = 1024;

fn random_input(len: usize) -> Vec<u8> {
    use rand::{RngCore, SeedableRng};
    let mut buf = vec![0; len];
    rand_chacha::ChaCha8Rng::from_seed([7; 32]).fill_bytes(&mut buf);
    buf
}

fn bench_single_compression(c: &mut Criterion) {
    let block = [1; BLOCK_LEN];
    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Bytes(BLOCK_LEN as u64));
    group.bench_function("in_place", |b| {
        let mut cv = [2; 8];
        b.iter(|| portable::compress_in_place(&mut cv, black_box(&block), BLOCK_LEN as u8, 0, 0));
    });
    group.bench_function("xof", |b| {
        let cv = [2; 8];
        b.iter(|| portable::compress_xof(black_box(&cv), black_box(&block), BLOCK_LEN as u8, 0, 0));
    });
    group.finish();
}

fn bench_atonce(c: &mut Criterion) {
    let mut group = c.benchmark_group("atonce");
    for len in [BLOCK_LEN, KIB, 4 * KIB, 16 * KIB, 64 * KIB, 256 * KIB, 1024 * KIB] {
        let input = random_input(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &input, |b, input| {
            b.iter(|| black_box(b3engine::hash(black_box(input))))
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let input = random_input(1024 * KIB);
    let mut group = c.benchmark_group("incremental");
    group.throughput(Throughput::Bytes(input.len() as u64));
    for update_len in [BLOCK_LEN, KIB, CHUNK_LEN + 1, 16 * KIB, 64 * KIB] {
        group.bench_with_input(BenchmarkId::from_parameter(update_len), &input, |b, input| {
            b.iter(|| {
                let mut hasher = Hasher::new();
                for piece in input.chunks(update_len) {
                    hasher.update(piece);
                }
                black_box(hasher.finalize())
            })
        });
    }
    group.finish();
}

fn bench_xof(c: &mut Criterion) {
    let mut group = c.benchmark_group("xof");
    let reader = Hasher::new().update(b"bench").finalize_xof();
    for out_len in [OUT_LEN, BLOCK_LEN, KIB, 64 * KIB] {
        let mut out = vec![0; out_len];
        group.throughput(Throughput::Bytes(out_len as u64));
        group.bench_function(BenchmarkId::from_parameter(out_len), |b| {
            b.iter(|| {
                let mut reader = reader.clone();
                reader.fill(black_box(&mut out));
            })
        });
    }
    group.finish();
}

#[cfg(feature = "rayon")]
fn bench_rayon(c: &mut Criterion) {
    let mut group = c.benchmark_group("rayon");
    for len in [64 * KIB, 256 * KIB, 1024 * KIB, 16 * 1024 * KIB] {
        let input = random_input(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &input, |b, input| {
            b.iter(|| black_box(Hasher::new().update_rayon(black_box(input)).finalize()))
        });
    }
    group.finish();
}

#[cfg(not(feature = "rayon"))]
fn bench_rayon(_: &mut Criterion) {}

criterion_group!(
    benches,
    bench_single_compression,
    bench_atonce,
    bench_incremental,
    bench_xof,
    bench_rayon
);
criterion_main!(benches);
