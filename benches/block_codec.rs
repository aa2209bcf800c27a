use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

use lzop::{LzopReader, LzopWriter};

fn compress(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut writer = LzopWriter::new(Cursor::new(&mut buf), b"bench").unwrap();
    std::io::Write::write_all(&mut writer, data).unwrap();
    writer.finish().unwrap();
    buf
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut data = vec![0u8; 10_000_000];
    thread_rng().fill(&mut data[2_000_000..6_000_000]); // mixed compressible/incompressible

    let compressed = compress(&data);

    let mut group = c.benchmark_group("lzop");
    group.bench_function("compress 10MB mixed", |b| b.iter(|| compress(black_box(&data))));
    group.bench_function("decompress 10MB mixed", |b| {
        b.iter(|| {
            let mut reader = LzopReader::new(Cursor::new(black_box(&compressed)), true).unwrap();
            let mut out = Vec::new();
            std::io::Read::read_to_end(&mut reader, &mut out).unwrap();
            out
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
