//! Benchmarks for the dashboard query path.
//!
//! Measures filter, sort and paginate over collections of growing size.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use phishguard_query::{
    apply, SortColumn, SortDirection, SortSpec, SubmissionFilter, ViewState,
};
use phishguard_types::{SubmissionId, SubmissionRecord, Variant};

fn make_records(count: usize) -> Vec<SubmissionRecord> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let locations = ["Lobby", "Cafeteria", "Parking", ""];
    (0..count)
        .map(|i| SubmissionRecord {
            id: SubmissionId::new(),
            email: format!("User{}@Dept{}.example.com", i, i % 17),
            variant: if i % 2 == 0 { Variant::A } else { Variant::B },
            location_tag: Some(locations[i % locations.len()].to_string()),
            ip_address: None,
            user_agent: None,
            timestamp: base + Duration::minutes((i * 7 % 20_000) as i64),
            revealed: i % 5 == 0,
        })
        .collect()
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");
    let filter = SubmissionFilter {
        email_query: Some("dept3".into()),
        variant: Some(Variant::A),
        ..Default::default()
    };
    let by_email = SortSpec::new(SortColumn::Email, SortDirection::Ascending);

    for size in [100, 1_000, 10_000] {
        let records = make_records(size);
        group.bench_with_input(
            BenchmarkId::new("filtered_email_sort", size),
            &records,
            |b, records| b.iter(|| apply(black_box(records), &filter, &by_email, &Utc).len()),
        );
        group.bench_with_input(
            BenchmarkId::new("unfiltered_timestamp_sort", size),
            &records,
            |b, records| {
                let everything = SubmissionFilter::default();
                let newest_first = SortSpec::default();
                b.iter(|| apply(black_box(records), &everything, &newest_first, &Utc).len())
            },
        );
    }
    group.finish();
}

fn bench_view(c: &mut Criterion) {
    let records = make_records(10_000);
    let mut view = ViewState::new();
    view.set_page(7);

    c.bench_function("view_page_7_of_10k", |b| {
        b.iter(|| view.view(black_box(&records), &Utc).items.len())
    });
}

criterion_group!(benches, bench_apply, bench_view);
criterion_main!(benches);
