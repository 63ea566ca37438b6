use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use std::sync::Arc;
use storefront_core::cart::{MemoryRemoteCart, MemoryStore};
use storefront_core::model::ProductSnapshot;
use storefront_core::model::UserProfile;
use storefront_core::{CartEngine, CartStore, LocalCart, NoticeLog, Session};
use tokio::runtime::Runtime; // To run async code within Criterion
use uuid::Uuid;

// --- Helper: catalog of N products ---
fn catalog(size: usize) -> Vec<ProductSnapshot> {
  (0..size)
    .map(|i| ProductSnapshot {
      product_id: Uuid::new_v4(),
      name: format!("product_{}", i),
      price: Decimal::new(100 + i as i64, 2),
      image_url: None,
    })
    .collect()
}

fn bench_local_cart_add(c: &mut Criterion) {
  let mut group = c.benchmark_group("LocalCartAdd");

  for lines in [10, 100, 500].iter() {
    let products = catalog(*lines);
    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), &products, |b, products| {
      b.iter(|| {
        let mut cart = LocalCart::new();
        // Two passes: the second one sums into existing lines.
        for product in products.iter().chain(products.iter()) {
          cart.add(product, 1).unwrap();
        }
        criterion::black_box(cart.total_amount());
      })
    });
  }
  group.finish();
}

fn bench_guest_cart_persistence(c: &mut Criterion) {
  let mut group = c.benchmark_group("GuestCartPersistence");
  let rt = Runtime::new().unwrap();

  for lines in [10, 100].iter() {
    let products = catalog(*lines);
    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), &products, |b, products| {
      b.to_async(&rt).iter_batched(
        || CartEngine::with_notifier(MemoryStore::new(), MemoryRemoteCart::new(), Arc::new(NoticeLog::new())),
        |engine| {
          let products = products.clone();
          async move {
            for product in &products {
              engine.add_item(product, 1).await.unwrap();
            }
          }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_merge_on_login(c: &mut Criterion) {
  let mut group = c.benchmark_group("MergeOnLogin");
  let rt = Runtime::new().unwrap();
  let user = UserProfile {
    id: Uuid::new_v4(),
    email: "bench@example.com".to_string(),
    full_name: None,
    is_admin: false,
  };

  for lines in [10, 100].iter() {
    let products = catalog(*lines);
    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), &products, |b, products| {
      b.to_async(&rt).iter_batched(
        || {
          // Seed the guest cart synchronously; setup already runs on the runtime.
          let store = MemoryStore::new();
          let mut guest = LocalCart::new();
          for product in products {
            guest.add(product, 2).unwrap();
          }
          store.save(&guest).unwrap();
          let remote = MemoryRemoteCart::with_catalog(products.iter().cloned());
          CartEngine::with_notifier(store, remote, Arc::new(NoticeLog::new()))
        },
        |engine| {
          let session = Session::authenticated(user.clone());
          async move {
            engine.on_session_change(&session).await;
            criterion::black_box(engine.total_items());
          }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_local_cart_add,
  bench_guest_cart_persistence,
  bench_merge_on_login
);
criterion_main!(benches);
