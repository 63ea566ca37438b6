// core/src/cart/engine.rs

//! The cart engine.
//!
//! One [`CartEngine`] gives a consistent view of the cart for both a guest
//! (lines kept in a [`CartStore`]) and a signed-in user (lines kept by a
//! [`RemoteCart`]). Signed-in mutations are applied to the view first and
//! then confirmed by the server; a failed call puts the previous quantity
//! back and reports a notice.
//!
//! Mutations of one line are serialized through a per-line async mutex, so
//! a second change to the same product waits until the first has settled.
//! A line's mutex is dropped again once no mutation holds or awaits it.
//! Merging the guest cart into the server cart happens at most once per
//! sign-in and is guarded by its own async mutex. Merged lines that storage
//! refuses to drop are remembered and kept out of the guest cart, so they
//! are never merged a second time.
//!
//! State guards are `parking_lot` locks and are never held across an
//! `.await`.

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{FieldErrors, StoreError, StoreResult};
use crate::model::{CartLine, ProductSnapshot};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::session::Session;

use super::line::LineState;
use super::local::LocalCart;
use super::remote::RemoteCart;
use super::store::CartStore;

#[derive(Debug, Default)]
struct EngineState {
  /// The signed-in user, `None` for a guest.
  user: Option<Uuid>,
  view: LocalCart,
  line_states: HashMap<Uuid, LineState>,
}

#[derive(Debug, Default)]
struct MergeGate {
  merged_for: Option<Uuid>,
}

type LineLocks = Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>;

/// A held turn on one cart line.
struct LineTurn<'a> {
  locks: &'a LineLocks,
  line_id: Uuid,
  guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LineTurn<'_> {
  fn drop(&mut self) {
    // Released under the map lock so no new waiter can clone the mutex
    // between the release and the count check.
    let mut locks = self.locks.lock();
    drop(self.guard.take());
    if locks.get(&self.line_id).is_some_and(|m| Arc::strong_count(m) == 1) {
      locks.remove(&self.line_id);
    }
  }
}

pub struct CartEngine<S: CartStore, R: RemoteCart> {
  store: S,
  remote: R,
  notifier: Arc<dyn Notifier>,
  state: RwLock<EngineState>,
  line_locks: LineLocks,
  merge_gate: AsyncMutex<MergeGate>,
  /// Guest lines already merged into the server cart that are still in
  /// storage.
  merged_leftover: Mutex<Option<LocalCart>>,
}

impl<S: CartStore, R: RemoteCart> CartEngine<S, R> {
  /// Creates a guest-mode engine whose view starts from the stored cart.
  pub fn new(store: S, remote: R) -> Self {
    Self::with_notifier(store, remote, Arc::new(TracingNotifier))
  }

  pub fn with_notifier(store: S, remote: R, notifier: Arc<dyn Notifier>) -> Self {
    let view = store.load();
    Self {
      store,
      remote,
      notifier,
      state: RwLock::new(EngineState {
        user: None,
        view,
        line_states: HashMap::new(),
      }),
      line_locks: Mutex::new(HashMap::new()),
      merge_gate: AsyncMutex::new(MergeGate::default()),
      merged_leftover: Mutex::new(None),
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn remote(&self) -> &R {
    &self.remote
  }

  pub fn current_user(&self) -> Option<Uuid> {
    self.state.read().user
  }

  pub fn is_authenticated(&self) -> bool {
    self.current_user().is_some()
  }

  pub fn lines(&self) -> Vec<CartLine> {
    self.state.read().view.lines().to_vec()
  }

  pub fn line(&self, line_id: Uuid) -> Option<CartLine> {
    self.state.read().view.get(line_id).cloned()
  }

  pub fn line_state(&self, line_id: Uuid) -> LineState {
    self.state.read().line_states.get(&line_id).cloned().unwrap_or_default()
  }

  pub fn total_items(&self) -> u64 {
    self.state.read().view.total_items()
  }

  pub fn total_amount(&self) -> Decimal {
    self.state.read().view.total_amount()
  }

  /// Waits until no other mutation of `line_id` is in flight.
  async fn line_turn(&self, line_id: Uuid) -> LineTurn<'_> {
    let lock = Arc::clone(self.line_locks.lock().entry(line_id).or_default());
    let guard = lock.lock_owned().await;
    LineTurn {
      locks: &self.line_locks,
      line_id,
      guard: Some(guard),
    }
  }

  #[cfg(test)]
  fn tracked_lines(&self) -> usize {
    self.line_locks.lock().len()
  }

  /// The stored guest cart minus lines that were merged but not yet
  /// dropped from storage.
  fn guest_cart(&self) -> LocalCart {
    self.guest_cart_from(&self.store.load())
  }

  fn guest_cart_from(&self, stored: &LocalCart) -> LocalCart {
    match &*self.merged_leftover.lock() {
      Some(merged) => stored.without(merged),
      None => stored.clone(),
    }
  }

  /// Drops a merged guest cart from storage. If storage can be neither
  /// cleared nor overwritten, `merged` is kept as the leftover to skip.
  fn discard_merged_guest(&self, merged: LocalCart) {
    let dropped = self.store.clear().or_else(|e| {
      tracing::warn!(error = %e, "Merged guest cart could not be cleared; overwriting it with an empty cart.");
      self.store.save(&LocalCart::new())
    });
    let mut leftover = self.merged_leftover.lock();
    match dropped {
      Ok(()) => *leftover = None,
      Err(e) => {
        tracing::warn!(error = %e, "Merged guest cart is still in storage; its lines will be skipped.");
        *leftover = Some(merged);
      }
    }
  }

  fn set_line_state(&self, line_id: Uuid, line_state: LineState) {
    let mut state = self.state.write();
    if line_state == LineState::Idle {
      state.line_states.remove(&line_id);
    } else {
      state.line_states.insert(line_id, line_state);
    }
  }

  /// Writes the guest view to storage, undoing `rollback` on the view when
  /// the write fails.
  fn persist_guest(&self, rollback: impl FnOnce(&mut LocalCart)) -> StoreResult<()> {
    let snapshot = self.state.read().view.clone();
    if let Err(e) = self.store.save(&snapshot) {
      rollback(&mut self.state.write().view);
      self.notifier.notify(Notice::from_error("Could not save your cart", &e));
      return Err(e);
    }
    *self.merged_leftover.lock() = None;
    Ok(())
  }

  /// Marks a pending signed-in mutation as failed after the view was
  /// restored.
  fn fail_line(&self, line_id: Uuid, previous_quantity: u32, context: &str, err: &StoreError) {
    tracing::warn!(%line_id, previous_quantity, error = %err, "{}; change rolled back.", context);
    self.set_line_state(
      line_id,
      LineState::Failed {
        previous_quantity,
        message: err.to_string(),
      },
    );
    self.notifier.notify(Notice::from_error(context, err));
  }

  fn restore_quantity(&self, line_id: Uuid, previous_quantity: u32) {
    let mut state = self.state.write();
    if previous_quantity == 0 {
      state.view.remove(line_id);
    } else {
      state.view.set_quantity(line_id, i64::from(previous_quantity));
    }
  }

  /// Adds `quantity` of a product, summing into the product's line.
  #[instrument(name = "cart::add_item", skip(self, product), fields(product_id = %product.product_id))]
  pub async fn add_item(&self, product: &ProductSnapshot, quantity: u32) -> StoreResult<CartLine> {
    if quantity == 0 {
      return Err(StoreError::Validation(FieldErrors::single(
        "quantity",
        "Quantity must be at least 1.",
      )));
    }
    let line_id = product.product_id;
    let _turn = self.line_turn(line_id).await;

    let (user, previous_quantity, optimistic) = {
      let mut state = self.state.write();
      let previous = state.view.get(line_id).map_or(0, |l| l.quantity);
      let line = state.view.add(product, quantity)?.clone();
      (state.user, previous, line)
    };

    if user.is_none() {
      self.persist_guest(|view| {
        if previous_quantity == 0 {
          view.remove(line_id);
        } else {
          view.set_quantity(line_id, i64::from(previous_quantity));
        }
      })?;
      self.notifier.notify(Notice::success(format!("{} added to cart.", product.name)));
      return Ok(optimistic);
    }

    self.set_line_state(line_id, LineState::Pending { previous_quantity });
    match self.remote.add(line_id, quantity).await {
      Ok(line) => {
        {
          let mut state = self.state.write();
          state.view.upsert(line.clone());
          state.line_states.remove(&line_id);
        }
        self.notifier.notify(Notice::success(format!("{} added to cart.", product.name)));
        Ok(line)
      }
      Err(e) => {
        self.restore_quantity(line_id, previous_quantity);
        self.fail_line(line_id, previous_quantity, "Could not add to cart", &e);
        Err(e)
      }
    }
  }

  /// Sets a line's quantity. `new_quantity <= 0` removes the line; an absent
  /// line is left alone. Returns the line as it stands afterwards.
  #[instrument(name = "cart::update_quantity", skip(self))]
  pub async fn update_quantity(&self, line_id: Uuid, new_quantity: i64) -> StoreResult<Option<CartLine>> {
    if new_quantity <= 0 {
      self.remove_item(line_id).await?;
      return Ok(None);
    }
    let _turn = self.line_turn(line_id).await;

    let (user, previous_quantity, optimistic) = {
      let mut state = self.state.write();
      let Some(previous) = state.view.get(line_id).map(|l| l.quantity) else {
        tracing::debug!(%line_id, "Quantity change for a line that is not in the cart; ignoring.");
        return Ok(None);
      };
      let line = state.view.set_quantity(line_id, new_quantity).cloned();
      (state.user, previous, line)
    };
    let target = optimistic.as_ref().map_or(0, |l| l.quantity);

    if user.is_none() {
      self.persist_guest(|view| {
        view.set_quantity(line_id, i64::from(previous_quantity));
      })?;
      return Ok(optimistic);
    }

    self.set_line_state(line_id, LineState::Pending { previous_quantity });
    match self.remote.set_quantity(line_id, target).await {
      Ok(confirmed) => {
        let mut state = self.state.write();
        match &confirmed {
          Some(line) => state.view.upsert(line.clone()),
          None => {
            state.view.remove(line_id);
          }
        }
        state.line_states.remove(&line_id);
        Ok(confirmed)
      }
      Err(e) => {
        self.restore_quantity(line_id, previous_quantity);
        self.fail_line(line_id, previous_quantity, "Could not update quantity", &e);
        Err(e)
      }
    }
  }

  /// Removes a line. Removing a line that is not in the cart succeeds and
  /// changes nothing.
  #[instrument(name = "cart::remove_item", skip(self))]
  pub async fn remove_item(&self, line_id: Uuid) -> StoreResult<()> {
    let _turn = self.line_turn(line_id).await;

    let (user, index, removed) = {
      let mut state = self.state.write();
      let Some(index) = state.view.position(line_id) else {
        return Ok(());
      };
      let removed = state.view.remove(line_id);
      (state.user, index, removed)
    };
    let Some(removed) = removed else {
      return Ok(());
    };
    let previous_quantity = removed.quantity;

    if user.is_none() {
      let restore = removed.clone();
      return self.persist_guest(move |view| view.insert_at(index, restore));
    }

    self.set_line_state(line_id, LineState::Pending { previous_quantity });
    match self.remote.remove(line_id).await {
      Ok(()) => {
        self.set_line_state(line_id, LineState::Idle);
        Ok(())
      }
      Err(e) => {
        self.state.write().view.insert_at(index, removed);
        self.fail_line(line_id, previous_quantity, "Could not remove item", &e);
        Err(e)
      }
    }
  }

  /// Empties the cart. A failed server call restores the previous lines.
  #[instrument(name = "cart::clear", skip(self))]
  pub async fn clear(&self) -> StoreResult<()> {
    let (user, previous) = {
      let mut state = self.state.write();
      let previous = std::mem::take(&mut state.view);
      state.line_states.clear();
      (state.user, previous)
    };

    let result = match user {
      None => self.store.clear().map(|()| *self.merged_leftover.lock() = None),
      Some(_) => self.remote.clear().await,
    };
    if let Err(e) = &result {
      self.state.write().view = previous;
      self.notifier.notify(Notice::from_error("Could not clear the cart", e));
    }
    result
  }

  /// Folds the guest cart into `user_id`'s server cart.
  ///
  /// Runs at most once per sign-in: later calls for the same user return the
  /// current lines without touching either cart. On failure both carts are
  /// left as they were and the merge is attempted again by the next
  /// [`load`](Self::load).
  #[instrument(name = "cart::merge_on_login", skip(self))]
  pub async fn merge_on_login(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let mut gate = self.merge_gate.lock().await;
    if gate.merged_for == Some(user_id) {
      tracing::debug!("Guest cart already merged for this sign-in.");
      return Ok(self.lines());
    }

    let stored = self.store.load();
    let local = self.guest_cart_from(&stored);
    if local.is_empty() {
      gate.merged_for = Some(user_id);
      if !stored.is_empty() {
        self.discard_merged_guest(stored);
      }
      tracing::debug!("No guest cart to merge.");
      return Ok(self.lines());
    }

    let items = local.merge_items();
    match self.remote.merge(&items).await {
      Ok(merged) => {
        gate.merged_for = Some(user_id);
        self.discard_merged_guest(stored);
        {
          let mut state = self.state.write();
          if state.user == Some(user_id) {
            state.view = LocalCart::from_lines(merged.clone());
            state.line_states.clear();
          }
        }
        tracing::info!(merged_lines = items.len(), "Guest cart merged into server cart.");
        self.notifier.notify(Notice::info("Your saved cart items were added to your cart."));
        Ok(merged)
      }
      Err(e) => {
        tracing::warn!(error = %e, "Guest cart merge failed; will retry on next load.");
        self.notifier.notify(Notice::from_error("Could not merge your cart", &e));
        Err(e)
      }
    }
  }

  /// Refreshes the view and returns it.
  ///
  /// Guests read the stored cart. Signed-in users get any outstanding merge
  /// first and then the server cart; a failed read yields an empty cart and
  /// a notice.
  #[instrument(name = "cart::load", skip(self))]
  pub async fn load(&self) -> Vec<CartLine> {
    let Some(user_id) = self.current_user() else {
      let cart = self.guest_cart();
      let lines = cart.lines().to_vec();
      self.state.write().view = cart;
      return lines;
    };

    let needs_merge = self.merge_gate.lock().await.merged_for != Some(user_id);
    if needs_merge && self.merge_on_login(user_id).await.is_err() {
      tracing::debug!("Continuing with the server cart while the merge is pending.");
    }

    let lines = match self.remote.fetch().await {
      Ok(lines) => lines,
      Err(e) => {
        tracing::warn!(error = %e, "Cart could not be loaded.");
        self.notifier.notify(Notice::from_error("Could not load your cart", &e));
        Vec::new()
      }
    };
    let mut state = self.state.write();
    if state.user == Some(user_id) {
      state.view = LocalCart::from_lines(lines.clone());
      state.line_states.clear();
    }
    lines
  }

  /// Reacts to a sign-in state change.
  ///
  /// Guest to signed-in merges and loads the server cart. Signed-in to guest
  /// switches back to the stored cart and re-arms the merge for the next
  /// sign-in.
  #[instrument(name = "cart::on_session_change", skip(self, session), fields(authenticated = session.is_authenticated()))]
  pub async fn on_session_change(&self, session: &Session) {
    let next = session.user_id();
    {
      let mut state = self.state.write();
      if state.user == next {
        return;
      }
      state.user = next;
      state.line_states.clear();
    }

    match next {
      Some(_) => {
        self.load().await;
      }
      None => {
        self.merge_gate.lock().await.merged_for = None;
        let cart = self.guest_cart();
        self.state.write().view = cart;
        tracing::debug!("Signed out; showing the guest cart.");
      }
    }
  }

  /// Applies the current session and every later change until the sender
  /// side of the channel is dropped.
  pub async fn watch_session(&self, mut sessions: watch::Receiver<Session>) {
    loop {
      let session = sessions.borrow_and_update().clone();
      self.on_session_change(&session).await;
      if sessions.changed().await.is_err() {
        tracing::debug!("Session channel closed; no longer following sign-in changes.");
        break;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cart::{MemoryRemoteCart, MemoryStore};

  fn product(name: &str) -> ProductSnapshot {
    ProductSnapshot {
      product_id: Uuid::new_v4(),
      name: name.into(),
      price: "10.00".parse().unwrap(),
      image_url: None,
    }
  }

  #[tokio::test]
  async fn line_locks_are_forgotten_once_released() {
    let engine = CartEngine::new(MemoryStore::new(), MemoryRemoteCart::new());
    let (pot, soil) = (product("Pot"), product("Soil"));

    engine.add_item(&pot, 1).await.unwrap();
    engine.add_item(&soil, 2).await.unwrap();
    engine.update_quantity(pot.product_id, 4).await.unwrap();
    engine.remove_item(soil.product_id).await.unwrap();

    assert_eq!(engine.tracked_lines(), 0);
    assert_eq!(engine.total_items(), 4);
  }

  #[tokio::test]
  async fn waiting_turn_keeps_the_line_lock() {
    let engine = CartEngine::new(MemoryStore::new(), MemoryRemoteCart::new());
    let line_id = Uuid::new_v4();

    let first = engine.line_turn(line_id).await;
    let second = engine.line_turn(line_id);
    tokio::pin!(second);
    assert!(ready_within_20ms(second.as_mut()).await.is_none());
    assert_eq!(engine.tracked_lines(), 1);

    drop(first);
    assert_eq!(engine.tracked_lines(), 1, "the waiter still holds the lock");
    let second = second.await;
    drop(second);
    assert_eq!(engine.tracked_lines(), 0);
  }

  async fn ready_within_20ms<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
    tokio::time::timeout(std::time::Duration::from_millis(20), fut).await.ok()
  }
}
