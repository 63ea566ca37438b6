// tests/cart_engine_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::time::Duration;
use storefront_core::cart::RemoteOp;
use storefront_core::{LineState, NoticeLevel, Session, StoreError};
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_anonymous_adds_sum_into_one_line() {
  setup_tracing();
  let p2 = watering_can();
  let h = CartHarness::new(&[p2.clone()]);

  h.engine.add_item(&p2, 1).await.unwrap();
  h.engine.add_item(&p2, 1).await.unwrap();

  assert_eq!(h.engine.lines().len(), 1);
  assert_eq!(h.quantity(p2.product_id), Some(2));
  assert_eq!(h.stored_quantity(p2.product_id), Some(2));
  assert!(h.remote.calls().is_empty(), "guest changes never reach the server");
}

#[tokio::test]
#[serial]
async fn test_add_rejects_zero_quantity() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);

  let err = h.engine.add_item(&p, 0).await.unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)));
  assert!(h.engine.lines().is_empty());
}

#[tokio::test]
#[serial]
async fn test_update_to_zero_removes_line() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.engine.add_item(&p, 3).await.unwrap();

  let result = h.engine.update_quantity(p.product_id, 0).await.unwrap();

  assert!(result.is_none());
  assert!(h.engine.lines().is_empty());
  assert_eq!(h.stored_quantity(p.product_id), None);
}

#[tokio::test]
#[serial]
async fn test_update_of_absent_line_is_noop() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.engine.add_item(&p, 1).await.unwrap();

  let result = h.engine.update_quantity(Uuid::new_v4(), 5).await.unwrap();

  assert!(result.is_none());
  assert_eq!(h.engine.total_items(), 1);
}

#[tokio::test]
#[serial]
async fn test_remove_absent_line_leaves_cart_unchanged() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.engine.add_item(&p, 2).await.unwrap();
  let before = h.engine.lines();

  h.engine.remove_item(Uuid::new_v4()).await.unwrap();

  assert_eq!(h.engine.lines(), before);
  assert!(h.notices.errors().is_empty());
}

#[tokio::test]
#[serial]
async fn test_totals_follow_price_snapshots() {
  setup_tracing();
  let (a, b) = (seeds(), gloves());
  let h = CartHarness::new(&[a.clone(), b.clone()]);
  h.engine.add_item(&a, 2).await.unwrap();
  h.engine.add_item(&b, 1).await.unwrap();

  assert_eq!(h.engine.total_items(), 3);
  assert_eq!(h.engine.total_amount(), dec("420.50"));
}

#[tokio::test]
#[serial]
async fn test_signed_in_add_reconciles_with_server_line() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  let user = customer("ivan@example.com");
  h.engine.on_session_change(&Session::authenticated(user)).await;

  let line = h.engine.add_item(&p, 2).await.unwrap();

  assert!(line.id.is_some(), "server line carries its row id");
  assert_eq!(h.engine.line(p.product_id).unwrap().id, line.id);
  assert_eq!(h.remote.quantity_of(p.product_id), Some(2));
  assert_eq!(h.engine.line_state(p.product_id), LineState::Idle);
  assert_eq!(h.stored_quantity(p.product_id), None, "signed-in adds skip local storage");
}

#[tokio::test]
#[serial]
async fn test_failed_update_rolls_back_and_reports_retryable_error() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.remote.seed(vec![server_line(&p, 2)]);
  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;
  assert_eq!(h.quantity(p.product_id), Some(2));
  h.notices.drain();

  h.remote.fail_next(RemoteOp::SetQuantity, StoreError::from_status(503, "unavailable"));
  let err = h.engine.update_quantity(p.product_id, 7).await.unwrap_err();

  assert!(err.is_retryable());
  assert_eq!(h.quantity(p.product_id), Some(2));
  assert!(matches!(
    h.engine.line_state(p.product_id),
    LineState::Failed { previous_quantity: 2, .. }
  ));
  let errors = h.notices.errors();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].retryable);
  assert_eq!(h.remote.quantity_of(p.product_id), Some(2));

  // The next successful change clears the failure.
  h.engine.update_quantity(p.product_id, 4).await.unwrap();
  assert_eq!(h.engine.line_state(p.product_id), LineState::Idle);
  assert_eq!(h.remote.quantity_of(p.product_id), Some(4));
}

#[tokio::test]
#[serial]
async fn test_failed_add_of_new_line_removes_it_again() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;

  h.remote.fail_next(
    RemoteOp::Add,
    StoreError::Transport {
      source: anyhow::anyhow!("connection reset"),
    },
  );
  assert!(h.engine.add_item(&p, 1).await.is_err());

  assert!(h.engine.line(p.product_id).is_none());
  assert!(matches!(
    h.engine.line_state(p.product_id),
    LineState::Failed { previous_quantity: 0, .. }
  ));
}

#[tokio::test]
#[serial]
async fn test_failed_remove_restores_line_in_place() {
  setup_tracing();
  let (a, b, c) = (seeds(), watering_can(), gloves());
  let h = CartHarness::new(&[a.clone(), b.clone(), c.clone()]);
  h.remote.seed(vec![server_line(&a, 1), server_line(&b, 2), server_line(&c, 3)]);
  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;

  h.remote.fail_next(RemoteOp::Remove, StoreError::from_status(500, "boom"));
  assert!(h.engine.remove_item(b.product_id).await.is_err());

  let order: Vec<Uuid> = h.engine.lines().iter().map(|l| l.product_id).collect();
  assert_eq!(order, vec![a.product_id, b.product_id, c.product_id]);
  assert_eq!(h.quantity(b.product_id), Some(2));
}

#[tokio::test]
#[serial]
async fn test_signed_in_update_to_zero_removes_on_server() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.remote.seed(vec![server_line(&p, 3)]);
  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;

  h.engine.update_quantity(p.product_id, -1).await.unwrap();

  assert!(h.engine.lines().is_empty());
  assert!(h.remote.lines().is_empty());
  assert_eq!(h.remote.calls_of(RemoteOp::Remove), 1);
}

#[tokio::test]
#[serial]
async fn test_concurrent_changes_to_one_line_apply_in_order() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.remote.seed(vec![server_line(&p, 1)]);
  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;
  h.remote.set_latency(Some(Duration::from_millis(20)));

  let first = {
    let engine = h.engine.clone();
    let id = p.product_id;
    tokio::spawn(async move { engine.update_quantity(id, 5).await })
  };
  tokio::time::sleep(Duration::from_millis(5)).await;
  // The first change is in flight; the line is pending.
  assert!(h.engine.line_state(p.product_id).is_pending());
  let second = {
    let engine = h.engine.clone();
    let id = p.product_id;
    tokio::spawn(async move { engine.update_quantity(id, 9).await })
  };

  first.await.unwrap().unwrap();
  second.await.unwrap().unwrap();

  let sent: Vec<Option<u32>> = h
    .remote
    .calls()
    .iter()
    .filter(|c| c.op == RemoteOp::SetQuantity)
    .map(|c| c.quantity)
    .collect();
  assert_eq!(sent, vec![Some(5), Some(9)]);
  assert_eq!(h.quantity(p.product_id), Some(9));
  assert_eq!(h.remote.quantity_of(p.product_id), Some(9));
}

#[tokio::test]
#[serial]
async fn test_load_failure_degrades_to_empty_cart() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.remote.seed(vec![server_line(&p, 1)]);
  h.remote.fail_next(RemoteOp::Fetch, StoreError::from_status(502, "bad gateway"));

  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;

  assert!(h.engine.lines().is_empty());
  let errors = h.notices.errors();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].level, NoticeLevel::Error);

  let lines = h.engine.load().await;
  assert_eq!(lines.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_failed_clear_restores_lines() {
  setup_tracing();
  let p = seeds();
  let h = CartHarness::new(&[p.clone()]);
  h.remote.seed(vec![server_line(&p, 2)]);
  h.engine.on_session_change(&Session::authenticated(customer("ivan@example.com"))).await;

  h.remote.fail_next(RemoteOp::Clear, StoreError::from_status(500, "boom"));
  assert!(h.engine.clear().await.is_err());
  assert_eq!(h.quantity(p.product_id), Some(2));

  h.engine.clear().await.unwrap();
  assert!(h.engine.lines().is_empty());
  assert!(h.remote.lines().is_empty());
}
