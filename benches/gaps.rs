/// Gap detection benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use betacrew_client::{find_missing, merge, Packet};

fn packets_with_gaps(max_seq: i32, every: i32) -> Vec<Packet> {
    (1..=max_seq)
        .filter(|seq| seq % every != 0 || *seq == max_seq)
        .rev()
        .map(|sequence| Packet {
            symbol: *b"AAPL",
            side: b'B',
            quantity: 1,
            price: 1,
            sequence,
        })
        .collect()
}

fn bench_find_missing(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_missing");

    for max_seq in [256, 10_000, 100_000].iter() {
        let packets = packets_with_gaps(*max_seq, 7);
        group.bench_with_input(BenchmarkId::from_parameter(max_seq), max_seq, |b, _| {
            b.iter(|| find_missing(black_box(&packets)))
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let packets = packets_with_gaps(10_000, 7);

    c.bench_function("merge_10000", |b| {
        b.iter(|| merge(black_box(packets.clone())))
    });
}

criterion_group!(benches, bench_find_missing, bench_merge);
criterion_main!(benches);
