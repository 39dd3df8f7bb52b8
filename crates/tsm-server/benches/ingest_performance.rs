/// Performance benchmarks for the ingestion pipeline
///
/// Runs the full coordinator (parse, validate, aggregate, batch) against the
/// in-memory store, so the numbers exclude database latency.
///
/// Run with: cargo bench --bench ingest_performance
use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use tsm_server::ingest::{
    aggregator::aggregate, IngestLimits, IngestionCoordinator, MemoryStore, Upload,
};
use tsm_common::MeasurementRecord;

fn sample_csv(rows: usize) -> Vec<u8> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut out = String::from("Date,ExecutionTime,Value\n");
    for i in 0..rows {
        let ts = start + TimeDelta::seconds(i as i64);
        out.push_str(&format!("{},{},{}\n", ts.to_rfc3339(), i % 97, (i * 7) % 1000));
    }
    out.into_bytes()
}

fn bench_ingest(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("ingest");

    for rows in [100usize, 1_000, 10_000] {
        let content = sample_csv(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &content, |b, content| {
            b.to_async(&rt).iter(|| async {
                let store = MemoryStore::new();
                let mut coordinator =
                    IngestionCoordinator::new(store.unit_of_work(), IngestLimits::default());
                let report = coordinator
                    .ingest(Upload::from_bytes("bench.csv", content.as_slice()))
                    .await
                    .unwrap();
                black_box(report)
            });
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let records: Vec<MeasurementRecord> = (0..10_000)
        .map(|i| MeasurementRecord {
            timestamp: start + TimeDelta::seconds(i),
            execution_time: (i % 97) as f64,
            value: ((i * 7919) % 1000) as f64,
        })
        .collect();

    c.bench_function("aggregate_10000", |b| {
        b.iter(|| aggregate(black_box(&records)).unwrap())
    });
}

criterion_group!(benches, bench_ingest, bench_aggregate);
criterion_main!(benches);
