use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tempfile::tempdir;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::runtime::Runtime;
use uuid::Uuid;

use cashflow_server::database::Database;
use cashflow_server::entries::{EntriesService, EntryStore};
use cashflow_server::models::{CardBrand, EntryFilter, EntryType, NewEntry};
use cashflow_server::users::UserStore;

// Benchmark constants
const BENCH_BASE_TIME: OffsetDateTime = datetime!(2024-01-01 0:00 UTC);
const BENCH_ENTRY_COUNT: usize = 1000;

async fn setup_benchmark_environment() -> (Database, EntriesService, String, tempfile::TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir.path().to_str().unwrap().to_string();

    let database = Database::open(&data_path).await.unwrap();
    let user_id = Uuid::new_v4().to_string();
    UserStore::new(database.handle())
        .insert(&user_id, "bench", None, "not-a-real-hash", OffsetDateTime::now_utc())
        .await
        .unwrap();
    let service = EntriesService::new(EntryStore::new(database.handle()));

    (database, service, user_id, temp_dir)
}

async fn create_benchmark_entries(service: &EntriesService, user_id: &str, count: usize) {
    for i in 0..count {
        let kind = if i % 4 == 0 {
            EntryType::Income
        } else {
            EntryType::Expense
        };
        service
            .create(
                user_id,
                NewEntry {
                    description: format!("Benchmark Entry {}", i),
                    amount: 10.0 + (i % 100) as f64,
                    kind,
                    card_brand: CardBrand::ALL.get(i % CardBrand::ALL.len()).copied(),
                    occurred_at: Some(BENCH_BASE_TIME + Duration::hours(i as i64)),
                },
            )
            .await
            .unwrap();
    }
}

async fn benchmark_list_first_page(service: &EntriesService, user_id: &str) {
    let list = service.list(user_id, &EntryFilter::default()).await.unwrap();
    black_box(list);
}

async fn benchmark_filtered_list(service: &EntriesService, user_id: &str) {
    let filter = EntryFilter {
        kind: Some(EntryType::Expense),
        query: Some("entry 9".to_string()),
        from: Some(BENCH_BASE_TIME + Duration::days(5)),
        to: Some(BENCH_BASE_TIME + Duration::days(30)),
        ..Default::default()
    };
    let list = service.list(user_id, &filter).await.unwrap();
    black_box(list);
}

async fn benchmark_deep_page(service: &EntriesService, user_id: &str) {
    let filter = EntryFilter {
        limit: 50,
        offset: 900,
        ..Default::default()
    };
    let list = service.list(user_id, &filter).await.unwrap();
    black_box(list);
}

fn criterion_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    // Setup benchmark data once
    let (_database, service, user_id, _temp_dir) = rt.block_on(setup_benchmark_environment());
    rt.block_on(create_benchmark_entries(&service, &user_id, BENCH_ENTRY_COUNT));

    c.bench_function("list_first_page", |b| {
        b.to_async(&rt)
            .iter(|| benchmark_list_first_page(&service, &user_id))
    });

    c.bench_function("filtered_list", |b| {
        b.to_async(&rt)
            .iter(|| benchmark_filtered_list(&service, &user_id))
    });

    c.bench_function("deep_page", |b| {
        b.to_async(&rt)
            .iter(|| benchmark_deep_page(&service, &user_id))
    });

    // Keep temp_dir alive until the end
    std::mem::forget(_temp_dir);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
