//! Stream store benchmarks.

use criterion::{Criterion, criterion_group, criterion_main};
use vstdio_core::{OpenMode, StreamStore, Whence};

const LUMP: usize = 64 * 1024;

fn bench_open_read(c: &mut Criterion) {
    let store = StreamStore::new();
    store.install("doom1.wad", vec![0x5Au8; LUMP]);
    let mut dst = vec![0u8; 4096];
    c.bench_function("open_read_4k", |b| {
        b.iter(|| {
            let mut h = store.open("doom1.wad", OpenMode::READ).ok();
            if let Some(h) = h.as_mut() {
                criterion::black_box(h.read(&mut dst).ok());
            }
        });
    });
}

fn bench_seek_overwrite(c: &mut Criterion) {
    let store = StreamStore::new();
    store.install("save.dsg", vec![0u8; LUMP]);
    let Ok(mut h) = store.fopen("save.dsg", "r+") else {
        return;
    };
    let mut pos = 0i64;
    c.bench_function("seek_overwrite_16b", |b| {
        b.iter(|| {
            pos = (pos + 977) % (LUMP as i64 - 16);
            let _ = h.seek(Whence::Start, pos);
            criterion::black_box(h.write(b"0123456789abcdef").ok());
        });
    });
}

fn bench_append_grow(c: &mut Criterion) {
    c.bench_function("append_grow_1k_lines", |b| {
        b.iter(|| {
            let store = StreamStore::new();
            if let Ok(mut h) = store.fopen("log.txt", "a") {
                for _ in 0..1000 {
                    let _ = h.write(b"P_Ticker: tic\n");
                }
            }
            criterion::black_box(store.contents("log.txt").map(|c| c.len()));
        });
    });
}

criterion_group!(
    benches,
    bench_open_read,
    bench_seek_overwrite,
    bench_append_grow
);
criterion_main!(benches);
