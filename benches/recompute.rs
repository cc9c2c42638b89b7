use std::fmt::Write as _;
use std::path::Path;

use criterion::{Criterion, criterion_group, criterion_main};
use sales_dashboard::{
    columns::Dimension,
    dashboard::{DashboardRequest, compute},
    filter::{Criteria, TypeFilter},
    loader::{LoadOptions, SalesTable, load_from_reader},
};

fn generate_sales(rows: usize) -> String {
    let mut csv =
        String::from("Date,Type,Amount,Qty,Category,Sub Category,CHANNEL,Sales Executive,Part Number\n");
    for i in 0..rows {
        let txn_type = if i % 9 == 0 { "RETURN" } else { "SALE" };
        let channel = match i % 3 {
            0 => "Retail",
            1 => "Online",
            _ => "Wholesale",
        };
        let day = (i % 28) + 1;
        let month = (i % 12) + 1;
        let _ = writeln!(
            csv,
            "{day:02}/{month:02}/2025,{txn_type},{}.{:02},{},Cat-{},Sub-{},{channel},Rep-{},P-{}",
            (i * 37) % 5000,
            i % 100,
            (i % 20) + 1,
            i % 7,
            i % 21,
            i % 15,
            i % 400
        );
    }
    csv
}

fn load(rows: usize) -> SalesTable {
    let csv = generate_sales(rows);
    load_from_reader(csv.as_bytes(), Path::new("bench.csv"), &LoadOptions::default())
        .expect("load generated sales")
}

fn bench_recompute(c: &mut Criterion) {
    let csv = generate_sales(50_000);
    c.bench_function("load_50k_rows", |b| {
        b.iter(|| {
            load_from_reader(csv.as_bytes(), Path::new("bench.csv"), &LoadOptions::default())
                .expect("load")
        })
    });

    let table = load(50_000);
    let unfiltered = DashboardRequest::default();
    c.bench_function("recompute_unfiltered_50k", |b| {
        b.iter(|| compute(&table, &unfiltered))
    });

    let filtered = DashboardRequest {
        criteria: Criteria::default()
            .with_type(TypeFilter::Sale)
            .with_values(Dimension::Channel, ["Retail", "Online"]),
        ..DashboardRequest::default()
    };
    c.bench_function("recompute_filtered_50k", |b| {
        b.iter(|| compute(&table, &filtered))
    });
}

criterion_group!(benches, bench_recompute);
criterion_main!(benches);
