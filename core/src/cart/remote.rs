// core/src/cart/remote.rs

//! The server side of an authenticated cart.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{CartLine, LocalCartItem, ProductSnapshot};

/// Cart operations against the signed-in user's server cart.
///
/// Implementations act for whoever the session currently identifies; none of
/// the methods take a user id.
#[async_trait]
pub trait RemoteCart: Send + Sync {
  async fn fetch(&self) -> StoreResult<Vec<CartLine>>;

  /// Adds `quantity` to the product's line, creating it when absent, and
  /// returns the line as stored.
  async fn add(&self, product_id: Uuid, quantity: u32) -> StoreResult<CartLine>;

  /// Sets a line's quantity. `0` removes the line and yields `None`.
  async fn set_quantity(&self, product_id: Uuid, quantity: u32) -> StoreResult<Option<CartLine>>;

  /// Removes a line; removing an absent line succeeds.
  async fn remove(&self, product_id: Uuid) -> StoreResult<()>;

  async fn clear(&self) -> StoreResult<()>;

  /// Sums the guest lines into the server cart and returns the merged cart.
  async fn merge(&self, items: &[LocalCartItem]) -> StoreResult<Vec<CartLine>>;
}

#[async_trait]
impl<T: RemoteCart + ?Sized> RemoteCart for Arc<T> {
  async fn fetch(&self) -> StoreResult<Vec<CartLine>> {
    (**self).fetch().await
  }

  async fn add(&self, product_id: Uuid, quantity: u32) -> StoreResult<CartLine> {
    (**self).add(product_id, quantity).await
  }

  async fn set_quantity(&self, product_id: Uuid, quantity: u32) -> StoreResult<Option<CartLine>> {
    (**self).set_quantity(product_id, quantity).await
  }

  async fn remove(&self, product_id: Uuid) -> StoreResult<()> {
    (**self).remove(product_id).await
  }

  async fn clear(&self) -> StoreResult<()> {
    (**self).clear().await
  }

  async fn merge(&self, items: &[LocalCartItem]) -> StoreResult<Vec<CartLine>> {
    (**self).merge(items).await
  }
}

/// Which remote operation a recorded call or injected failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
  Fetch,
  Add,
  SetQuantity,
  Remove,
  Clear,
  Merge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
  pub op: RemoteOp,
  pub product_id: Option<Uuid>,
  pub quantity: Option<u32>,
}

#[derive(Debug, Default)]
struct MemoryRemoteState {
  catalog: HashMap<Uuid, ProductSnapshot>,
  lines: Vec<CartLine>,
  failures: HashMap<RemoteOp, VecDeque<StoreError>>,
  calls: Vec<RemoteCall>,
  latency: Option<Duration>,
}

/// An in-process server cart.
///
/// Behaves like the storefront API for one user: unknown products are
/// rejected on add and skipped on merge, quantities sum on conflict. Failures
/// can be queued per operation to exercise rollback paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryRemoteCart {
  state: Arc<Mutex<MemoryRemoteState>>,
}

impl MemoryRemoteCart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_catalog(products: impl IntoIterator<Item = ProductSnapshot>) -> Self {
    let cart = Self::new();
    for product in products {
      cart.register(product);
    }
    cart
  }

  pub fn register(&self, product: ProductSnapshot) {
    self.state.lock().catalog.insert(product.product_id, product);
  }

  /// Replaces the stored lines, e.g. to model a cart filled on another
  /// device.
  pub fn seed(&self, lines: Vec<CartLine>) {
    self.state.lock().lines = lines;
  }

  pub fn lines(&self) -> Vec<CartLine> {
    self.state.lock().lines.clone()
  }

  pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
    self
      .state
      .lock()
      .lines
      .iter()
      .find(|l| l.product_id == product_id)
      .map(|l| l.quantity)
  }

  /// Queues an error returned by the next call of `op`.
  pub fn fail_next(&self, op: RemoteOp, err: StoreError) {
    self.state.lock().failures.entry(op).or_default().push_back(err);
  }

  /// Delays every call, to let concurrent mutations overlap.
  pub fn set_latency(&self, latency: Option<Duration>) {
    self.state.lock().latency = latency;
  }

  pub fn calls(&self) -> Vec<RemoteCall> {
    self.state.lock().calls.clone()
  }

  pub fn calls_of(&self, op: RemoteOp) -> usize {
    self.state.lock().calls.iter().filter(|c| c.op == op).count()
  }

  async fn enter(&self, op: RemoteOp, product_id: Option<Uuid>, quantity: Option<u32>) -> StoreResult<()> {
    let latency = {
      let mut state = self.state.lock();
      state.calls.push(RemoteCall {
        op,
        product_id,
        quantity,
      });
      state.latency
    };
    if let Some(latency) = latency {
      tokio::time::sleep(latency).await;
    }
    let injected = self.state.lock().failures.get_mut(&op).and_then(VecDeque::pop_front);
    match injected {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  fn stored_line(product: &ProductSnapshot, quantity: u32) -> CartLine {
    let mut line = CartLine::from_snapshot(product, quantity);
    line.id = Some(Uuid::new_v4());
    line
  }
}

#[async_trait]
impl RemoteCart for MemoryRemoteCart {
  async fn fetch(&self) -> StoreResult<Vec<CartLine>> {
    self.enter(RemoteOp::Fetch, None, None).await?;
    Ok(self.lines())
  }

  async fn add(&self, product_id: Uuid, quantity: u32) -> StoreResult<CartLine> {
    self.enter(RemoteOp::Add, Some(product_id), Some(quantity)).await?;
    let mut state = self.state.lock();
    let product = state
      .catalog
      .get(&product_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound("Product not found".into()))?;
    match state.lines.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) => {
        line.quantity = line.quantity.saturating_add(quantity);
        line.price_snapshot = product.price;
        Ok(line.clone())
      }
      None => {
        let line = Self::stored_line(&product, quantity);
        state.lines.push(line.clone());
        Ok(line)
      }
    }
  }

  async fn set_quantity(&self, product_id: Uuid, quantity: u32) -> StoreResult<Option<CartLine>> {
    self.enter(RemoteOp::SetQuantity, Some(product_id), Some(quantity)).await?;
    let mut state = self.state.lock();
    if quantity == 0 {
      state.lines.retain(|l| l.product_id != product_id);
      return Ok(None);
    }
    match state.lines.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) => {
        line.quantity = quantity;
        Ok(Some(line.clone()))
      }
      None => Err(StoreError::NotFound("Cart item not found".into())),
    }
  }

  async fn remove(&self, product_id: Uuid) -> StoreResult<()> {
    self.enter(RemoteOp::Remove, Some(product_id), None).await?;
    self.state.lock().lines.retain(|l| l.product_id != product_id);
    Ok(())
  }

  async fn clear(&self) -> StoreResult<()> {
    self.enter(RemoteOp::Clear, None, None).await?;
    self.state.lock().lines.clear();
    Ok(())
  }

  async fn merge(&self, items: &[LocalCartItem]) -> StoreResult<Vec<CartLine>> {
    self.enter(RemoteOp::Merge, None, None).await?;
    let mut state = self.state.lock();
    // Apply all-or-nothing on a copy, like the server's transaction.
    let mut lines = state.lines.clone();
    for item in items.iter().filter(|i| i.quantity > 0) {
      let Some(product) = state.catalog.get(&item.product_id) else {
        tracing::warn!(product_id = %item.product_id, "Skipping unknown product during merge.");
        continue;
      };
      match lines.iter_mut().find(|l| l.product_id == item.product_id) {
        Some(line) => {
          line.quantity = line.quantity.saturating_add(item.quantity);
          line.price_snapshot = item.price_snapshot;
        }
        None => {
          let mut line = Self::stored_line(product, item.quantity);
          line.price_snapshot = item.price_snapshot;
          lines.push(line);
        }
      }
    }
    state.lines = lines.clone();
    Ok(lines)
  }
}
