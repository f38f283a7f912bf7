//! Performance benchmarks for mapping, query building and search.
//!
//! These benchmarks measure the in-process parts of the system:
//! - Row to document mapping for a full batch
//! - Query body construction for each intent
//! - In-memory search over indexes of different sizes
//! - A complete rebuild into the in-memory index

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use person_search_sync::domain::{IndexName, TableDescriptor};
use person_search_sync::mapping::DocumentMapper;
use person_search_sync::models::PersonRecord;
use person_search_sync::query::{QueryBuilder, SearchExecutor, SearchIntent};
use person_search_sync::repositories::InMemoryRowStore;
use person_search_sync::search::InMemorySearchIndex;
use person_search_sync::sync::{BulkSyncPipeline, SyncOptions};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

const FIRST_NAMES: [&str; 8] = [
    "Rahul", "Anita", "Priya", "Amit", "Pooja", "Vikram", "Sneha", "Arjun",
];
const LAST_NAMES: [&str; 6] = ["Sharma", "Rao", "Nair", "Gupta", "Mehta", "Kumar"];

/// Generate `n` person rows with varied names and birth dates.
fn generate_records(n: usize) -> Vec<PersonRecord> {
    (0..n)
        .map(|i| {
            let first = FIRST_NAMES[i % FIRST_NAMES.len()];
            let last = LAST_NAMES[(i / FIRST_NAMES.len()) % LAST_NAMES.len()];
            let dob = NaiveDate::from_ymd_opt(
                1960 + (i % 45) as i32,
                1 + (i % 12) as u32,
                1 + (i % 28) as u32,
            )
            .unwrap();
            PersonRecord::named(first, last)
                .with_date_of_birth(dob)
                .with_location("Mumbai", "MH")
                .with_zip_code(format!("{:06}    ", 400000 + i % 1000))
                .with_email(format!("{}.{}{}@randommail.com", first, last, i).to_lowercase())
        })
        .collect()
}

/// Build an index holding `n` documents.
fn seeded_index(rt: &Runtime, n: usize) -> (Arc<InMemorySearchIndex>, IndexName) {
    let table = TableDescriptor::new("persons").unwrap();
    let name = IndexName::new("person_index").unwrap();
    let index = Arc::new(InMemorySearchIndex::new());
    let rows = Arc::new(InMemoryRowStore::with_table(table.clone(), generate_records(n)));

    rt.block_on(
        BulkSyncPipeline::new(rows, index.clone(), SyncOptions::new(1000)).run(&table, &name),
    )
    .unwrap();
    (index, name)
}

fn bench_mapping(c: &mut Criterion) {
    let mapper = DocumentMapper::new();
    let records = generate_records(10_000);

    c.bench_function("map_batch_10000", |b| {
        b.iter(|| black_box(mapper.to_documents(black_box(&records))));
    });
}

fn bench_query_building(c: &mut Criterion) {
    let builder = QueryBuilder::new();
    let intents = [
        SearchIntent::Match {
            field: "FirstName".to_string(),
            text: "Rahul".to_string(),
        },
        SearchIntent::WildcardRange {
            first_name: "Rah".to_string(),
            last_name: "Sharm".to_string(),
            birth_year: 1990,
        },
        SearchIntent::Fuzzy {
            field: "LastName".to_string(),
            value: "Sharmaa".to_string(),
            distance: None,
        },
        SearchIntent::AnyOf {
            first_name: "Rah".to_string(),
            last_name: "Sharm".to_string(),
            birth_year: 1990,
        },
    ];

    let mut group = c.benchmark_group("build_query");
    for intent in &intents {
        group.bench_with_input(BenchmarkId::from_parameter(intent.name()), intent, |b, intent| {
            b.iter(|| black_box(builder.build(black_box(intent)).unwrap()));
        });
    }
    group.finish();
}

fn bench_search_dataset_sizes(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let builder = QueryBuilder::new();
    let query = builder
        .build(&SearchIntent::WildcardRange {
            first_name: "Rah".to_string(),
            last_name: "Sharm".to_string(),
            birth_year: 1990,
        })
        .unwrap();

    let mut group = c.benchmark_group("search_wildcard_range");
    for size in [100, 1_000, 10_000] {
        let (index, name) = seeded_index(&rt, size);
        let executor = SearchExecutor::new(index, name);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.to_async(&rt).iter(|| async {
                let _result = executor.execute(&query, 10).await;
            });
        });
    }
    group.finish();
}

fn bench_fuzzy_search(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (index, name) = seeded_index(&rt, 5_000);
    let executor = SearchExecutor::new(index, name);
    let query = QueryBuilder::new()
        .fuzzy_query("FirstName", "Rahull", Some(2))
        .unwrap();

    c.bench_function("search_fuzzy_5000", |b| {
        b.to_async(&rt).iter(|| async {
            let _result = executor.execute(&query, 10).await;
        });
    });
}

fn bench_rebuild(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let table = TableDescriptor::new("persons").unwrap();
    let name = IndexName::new("person_index").unwrap();
    let rows = Arc::new(InMemoryRowStore::with_table(
        table.clone(),
        generate_records(5_000),
    ));

    let mut group = c.benchmark_group("rebuild_5000");
    for batch_size in [100, 1_000, 5_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                b.to_async(&rt).iter(|| async {
                    let pipeline = BulkSyncPipeline::new(
                        rows.clone(),
                        Arc::new(InMemorySearchIndex::new()),
                        SyncOptions::new(batch_size),
                    );
                    let _summary = pipeline.run(&table, &name).await;
                });
            },
        );
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(50);
    targets = bench_mapping,
        bench_query_building,
        bench_search_dataset_sizes,
        bench_fuzzy_search,
        bench_rebuild
}

criterion_main!(benches);
