use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use benchplot::aggregate::aggregate;
use benchplot::cleaner::clean_records;
use benchplot::loader::read_results;
use benchplot::metrics::derive_scaling;
use benchplot::stats::ReductionFunc;
use benchplot::test_helpers::synthetic_results;

fn load_and_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_and_clean");
    for trials in [1, 10, 50] {
        let csv = synthetic_results(4, 3, 64, trials);
        group.bench_with_input(BenchmarkId::new("rows", trials), &csv, |b, csv| {
            b.iter(|| {
                let raw = read_results(csv.as_bytes(), b',').expect("Failed to read results");
                black_box(clean_records(&raw))
            });
        });
    }
    group.finish();
}

fn aggregate_and_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_and_derive");
    for trials in [1, 10, 50] {
        let raw = read_results(synthetic_results(4, 3, 64, trials).as_bytes(), b',')
            .expect("Failed to read results");
        let records = clean_records(&raw);
        for fun in [ReductionFunc::Mean, ReductionFunc::Median] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", fun), trials),
                &records,
                |b, records| b.iter(|| black_box(derive_scaling(aggregate(records, fun)))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, load_and_clean, aggregate_and_derive);
criterion_main!(benches);
