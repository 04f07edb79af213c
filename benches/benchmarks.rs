//! Benchmarks for bloomjoin
//!
//! Run with: cargo bench --features full

// Require all families for benchmarks
#[cfg(not(all(feature = "membership", feature = "codec", feature = "pushdown")))]
compile_error!("Benchmarks require all features. Run: cargo bench --features full");

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use bloomjoin::codec;
use bloomjoin::membership::{LegacyRollingHasher, MembershipFilter};
use bloomjoin::pushdown::{
    Datum, DatumProjector, ProbeSource, PushdownConfig, PushdownScan, Row, SourceError,
    VecRowSource,
};

// ============================================================================
// Membership Filter Benchmarks
// ============================================================================

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("membership_filter");
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert", |b| {
        let mut filter = MembershipFilter::new(1_000_000, 0.01);
        let mut i = 0u64;
        b.iter(|| {
            filter.add(&format!("{}|'k'", i));
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("insert_legacy", |b| {
        let mut filter =
            MembershipFilter::try_with_hasher(1_000_000, 0.01, LegacyRollingHasher).unwrap();
        let mut i = 0u64;
        b.iter(|| {
            filter.add(&format!("{}|'k'", i));
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("check_hit", |b| {
        let mut filter = MembershipFilter::new(100_000, 0.01);
        for i in 0..100_000u64 {
            filter.add(&i.to_string());
        }
        let mut i = 0u64;
        b.iter(|| {
            let result = filter.check(&(i % 100_000).to_string());
            i = i.wrapping_add(1);
            black_box(result)
        });
    });

    group.bench_function("check_miss", |b| {
        let mut filter = MembershipFilter::new(100_000, 0.01);
        for i in 0..100_000u64 {
            filter.add(&i.to_string());
        }
        let mut i = 1_000_000u64;
        b.iter(|| {
            let result = filter.check(&i.to_string());
            i = i.wrapping_add(1);
            black_box(result)
        });
    });

    group.finish();
}

// ============================================================================
// Codec Benchmarks
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for n in [1_000usize, 100_000] {
        let mut filter = MembershipFilter::new(n, 0.01);
        for i in 0..n {
            filter.add(&i.to_string());
        }
        let encoded = codec::encode(&filter);
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_function(format!("encode_{}", n), |b| {
            b.iter(|| black_box(codec::encode(black_box(&filter))));
        });

        group.bench_function(format!("decode_{}", n), |b| {
            b.iter(|| black_box(codec::decode(black_box(&encoded)).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Pushdown Scan Benchmarks
// ============================================================================

struct NullRemote;

impl ProbeSource for NullRemote {
    type Row = ();

    fn next_row(&mut self, query: &str) -> Result<Option<()>, SourceError> {
        black_box(query);
        Ok(None)
    }

    fn rescan(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("pushdown_scan");

    for n in [100usize, 10_000] {
        let rows: Vec<Row> = (0..n)
            .map(|i| {
                Row::new(vec![
                    Datum::Int32(i as i32),
                    Datum::text(format!("name_{}", i)),
                    Datum::numeric(format!("{}.25", i)),
                ])
            })
            .collect();
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("materialize_{}", n), |b| {
            b.iter_batched(
                || {
                    PushdownScan::new(
                        Some(VecRowSource::new(rows.clone())),
                        DatumProjector,
                        NullRemote,
                        "SELECT id, name, amount FROM remote_t",
                        PushdownConfig::default(),
                    )
                    .unwrap()
                },
                |mut scan| {
                    scan.next().unwrap();
                    black_box(scan.remote_query().len())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter, bench_codec, bench_materialize);

criterion_main!(benches);
