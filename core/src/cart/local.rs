// core/src/cart/local.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{FieldErrors, StoreError, StoreResult};
use crate::model::{round_money, CartLine, LocalCartItem, ProductSnapshot};

/// The guest cart: an ordered list of lines, one per product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalCart {
  lines: Vec<CartLine>,
}

impl LocalCart {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rebuilds a cart from persisted lines. Duplicate products are folded
  /// into the first occurrence and zero-quantity lines are dropped, so a
  /// hand-edited storage entry cannot break the one-line-per-product rule.
  pub fn from_lines(lines: Vec<CartLine>) -> Self {
    let mut cart = Self::new();
    for line in lines {
      if line.quantity == 0 {
        continue;
      }
      match cart.position(line.product_id) {
        Some(idx) => cart.lines[idx].quantity = cart.lines[idx].quantity.saturating_add(line.quantity),
        None => cart.lines.push(line),
      }
    }
    cart
  }

  pub(crate) fn position(&self, product_id: Uuid) -> Option<usize> {
    self.lines.iter().position(|l| l.product_id == product_id)
  }

  /// Replaces the line for the same product, or appends it.
  pub(crate) fn upsert(&mut self, line: CartLine) {
    match self.position(line.product_id) {
      Some(idx) => self.lines[idx] = line,
      None => self.lines.push(line),
    }
  }

  /// Puts a removed line back where it was.
  pub(crate) fn insert_at(&mut self, index: usize, line: CartLine) {
    if self.position(line.product_id).is_some() {
      return self.upsert(line);
    }
    let index = index.min(self.lines.len());
    self.lines.insert(index, line);
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn into_lines(self) -> Vec<CartLine> {
    self.lines
  }

  pub fn get(&self, product_id: Uuid) -> Option<&CartLine> {
    self.lines.iter().find(|l| l.product_id == product_id)
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  /// Adds `quantity` of a product, summing into an existing line.
  pub fn add(&mut self, product: &ProductSnapshot, quantity: u32) -> StoreResult<&CartLine> {
    if quantity == 0 {
      return Err(StoreError::Validation(FieldErrors::single(
        "quantity",
        "Quantity must be at least 1.",
      )));
    }
    let idx = match self.position(product.product_id) {
      Some(idx) => {
        let line = &mut self.lines[idx];
        line.quantity = line.quantity.saturating_add(quantity);
        idx
      }
      None => {
        self.lines.push(CartLine::from_snapshot(product, quantity));
        self.lines.len() - 1
      }
    };
    Ok(&self.lines[idx])
  }

  /// Sets a line's quantity; `quantity <= 0` removes it. Returns the line
  /// when it still exists afterwards.
  pub fn set_quantity(&mut self, product_id: Uuid, quantity: i64) -> Option<&CartLine> {
    if quantity <= 0 {
      self.remove(product_id);
      return None;
    }
    let idx = self.position(product_id)?;
    self.lines[idx].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    Some(&self.lines[idx])
  }

  /// Removes a line; absent lines are ignored. Returns the removed line.
  pub fn remove(&mut self, product_id: Uuid) -> Option<CartLine> {
    let idx = self.position(product_id)?;
    Some(self.lines.remove(idx))
  }

  pub fn clear(&mut self) {
    self.lines.clear();
  }

  pub fn total_items(&self) -> u64 {
    self.lines.iter().map(|l| u64::from(l.quantity)).sum()
  }

  pub fn total_amount(&self) -> Decimal {
    round_money(self.lines.iter().map(CartLine::subtotal).sum())
  }

  pub fn merge_items(&self) -> Vec<LocalCartItem> {
    self.lines.iter().map(CartLine::to_local_item).collect()
  }

  /// This cart with the quantities in `merged` taken off. Lines that drop
  /// to zero are left out.
  pub(crate) fn without(&self, merged: &LocalCart) -> LocalCart {
    let lines = self
      .lines
      .iter()
      .filter_map(|line| {
        let taken = merged.get(line.product_id).map_or(0, |m| m.quantity);
        let quantity = line.quantity.saturating_sub(taken);
        (quantity > 0).then(|| CartLine { quantity, ..line.clone() })
      })
      .collect();
    LocalCart { lines }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(price: &str) -> ProductSnapshot {
    ProductSnapshot {
      product_id: Uuid::new_v4(),
      name: "Ceramic pot".into(),
      price: price.parse().unwrap(),
      image_url: Some("/images/ceramic_pot.jpg".into()),
    }
  }

  #[test]
  fn repeated_adds_sum_into_one_line() {
    let mut cart = LocalCart::new();
    let p2 = product("450.00");
    cart.add(&p2, 1).unwrap();
    cart.add(&p2, 1).unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get(p2.product_id).unwrap().quantity, 2);
  }

  #[test]
  fn zero_quantity_add_is_rejected() {
    let mut cart = LocalCart::new();
    assert!(cart.add(&product("1.00"), 0).is_err());
    assert!(cart.is_empty());
  }

  #[test]
  fn set_quantity_zero_or_negative_removes() {
    let mut cart = LocalCart::new();
    let p = product("1.00");
    cart.add(&p, 3).unwrap();
    assert!(cart.set_quantity(p.product_id, 0).is_none());
    assert!(cart.get(p.product_id).is_none());

    cart.add(&p, 3).unwrap();
    assert!(cart.set_quantity(p.product_id, -4).is_none());
    assert!(cart.is_empty());
  }

  #[test]
  fn removing_absent_line_is_noop() {
    let mut cart = LocalCart::new();
    cart.add(&product("1.00"), 1).unwrap();
    let before = cart.clone();
    assert!(cart.remove(Uuid::new_v4()).is_none());
    assert_eq!(cart, before);
  }

  #[test]
  fn totals_round_to_cents() {
    let mut cart = LocalCart::new();
    cart.add(&product("0.335"), 3).unwrap();
    cart.add(&product("2.50"), 2).unwrap();
    assert_eq!(cart.total_items(), 5);
    assert_eq!(cart.total_amount(), "6.01".parse::<Decimal>().unwrap());
  }

  #[test]
  fn from_lines_folds_duplicates() {
    let p = product("5.00");
    let a = CartLine::from_snapshot(&p, 1);
    let b = CartLine::from_snapshot(&p, 2);
    let mut zero = CartLine::from_snapshot(&product("1.00"), 1);
    zero.quantity = 0;
    let cart = LocalCart::from_lines(vec![a, zero, b]);
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].quantity, 3);
  }

  #[test]
  fn without_subtracts_merged_quantities() {
    let (pot, soil) = (product("5.00"), product("2.00"));
    let mut stored = LocalCart::new();
    stored.add(&pot, 2).unwrap();
    stored.add(&soil, 1).unwrap();
    let merged = stored.clone();
    stored.add(&pot, 3).unwrap();

    let rest = stored.without(&merged);

    assert_eq!(rest.len(), 1);
    assert_eq!(rest.get(pot.product_id).unwrap().quantity, 3);
    assert!(stored.without(&stored).is_empty());
  }
}
