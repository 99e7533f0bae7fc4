//! Benchmarks for sort, join, group-by and harmonization over generated tables.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tablekit::ingestion::find_format;
use tablekit::processing::{Aggregate, GroupBy};
use tablekit::table::Table;
use tablekit::types::{DataType, Value};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn orders(rows: usize) -> Table {
    let mut t = Table::new();
    let ids: Vec<Value> = (0..rows as i64).map(Value::Int).collect();
    let customers: Vec<Value> = (0..rows).map(|i| Value::Int((i * 7919 % 1_000) as i64)).collect();
    let amounts: Vec<Value> = (0..rows)
        .map(|i| if i % 50 == 0 { Value::Null } else { Value::Float((i * 31 % 997) as f64 / 4.0) })
        .collect();
    t.add_column("id", DataType::Int, false, ids).unwrap();
    t.add_column("customer", DataType::Int, false, customers).unwrap();
    t.add_column("amount", DataType::Float, true, amounts).unwrap();
    t
}

fn customers() -> Table {
    let mut t = Table::new();
    t.add_column("customer", DataType::Int, false, (0..1_000).map(Value::Int).collect())
        .unwrap();
    t.add_column(
        "region",
        DataType::Str,
        false,
        (0..1_000).map(|i| Value::from(format!("region-{}", i % 12))).collect(),
    )
    .unwrap();
    t
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    for rows in SIZES {
        let table = orders(rows);
        group.bench_with_input(BenchmarkId::new("two_keys", rows), &table, |b, table| {
            b.iter(|| {
                let mut t = table.clone();
                t.sort(std::hint::black_box(&[("customer", false), ("amount", true)]))
                    .unwrap();
                t
            });
        });
    }
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");
    let right = customers();
    for rows in SIZES {
        let left = orders(rows);
        group.bench_with_input(BenchmarkId::new("left", rows), &left, |b, left| {
            b.iter(|| {
                left.left_join(std::hint::black_box(&right), &["customer"], &["id", "amount", "region"])
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    for rows in SIZES {
        let table = orders(rows);
        group.bench_with_input(BenchmarkId::new("customer", rows), &table, |b, table| {
            b.iter(|| {
                let mut g = GroupBy::new(
                    &["customer"],
                    &[
                        ("amount", Aggregate::Sum),
                        ("amount", Aggregate::Average),
                        ("amount", Aggregate::Median),
                    ],
                )
                .unwrap();
                g.ingest(std::hint::black_box(table)).unwrap();
                g.table().unwrap().len()
            });
        });
    }
    group.finish();
}

fn bench_find_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_format");
    for rows in [1_000, 10_000] {
        let mut raw = Table::new();
        raw.add_column(
            "day",
            DataType::Str,
            true,
            (0..rows).map(|i| Value::from(format!("{:02}/{:02}/20{:02}", i % 28 + 1, i % 12 + 1, i % 30))).collect(),
        )
        .unwrap();
        raw.add_column(
            "amount",
            DataType::Str,
            true,
            (0..rows).map(|i| Value::from(format!("{},{:03}.5", i % 9 + 1, i % 1000))).collect(),
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::new("text_columns", rows), &raw, |b, raw| {
            b.iter(|| {
                let mut t = raw.clone();
                find_format(&mut t).unwrap();
                t
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sort, bench_join, bench_group_by, bench_find_format);
criterion_main!(benches);
