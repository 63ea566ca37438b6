// core/src/pagination.rs

//! Offset/limit paging for infinite-scroll listings.

use std::future::Future;

use crate::error::StoreResult;

/// Accumulates pages of `T`.
///
/// The next request starts at the number of items already loaded. The list
/// is exhausted once a page comes back empty or shorter than the page size.
#[derive(Debug, Clone)]
pub struct InfiniteList<T> {
  items: Vec<T>,
  page_size: u32,
  pages_loaded: usize,
  exhausted: bool,
}

impl<T> InfiniteList<T> {
  pub fn new(page_size: u32) -> Self {
    Self {
      items: Vec::new(),
      page_size: page_size.max(1),
      pages_loaded: 0,
      exhausted: false,
    }
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  pub fn into_items(self) -> Vec<T> {
    self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  pub fn pages_loaded(&self) -> usize {
    self.pages_loaded
  }

  pub fn has_more(&self) -> bool {
    !self.exhausted
  }

  pub fn next_offset(&self) -> u32 {
    u32::try_from(self.items.len()).unwrap_or(u32::MAX)
  }

  /// Forgets every loaded page, e.g. after the filters changed.
  pub fn reset(&mut self) {
    self.items.clear();
    self.pages_loaded = 0;
    self.exhausted = false;
  }

  /// Fetches the next page with `fetch(offset, limit)` and appends it.
  ///
  /// Returns the number of items added; `0` once the list is exhausted. A
  /// failed fetch leaves the loaded pages untouched so it can be retried.
  pub async fn load_more<F, Fut>(&mut self, fetch: F) -> StoreResult<usize>
  where
    F: FnOnce(u32, u32) -> Fut,
    Fut: Future<Output = StoreResult<Vec<T>>>,
  {
    if self.exhausted {
      return Ok(0);
    }
    let offset = self.next_offset();
    let page = fetch(offset, self.page_size).await?;
    let added = page.len();
    if added < self.page_size as usize {
      self.exhausted = true;
    }
    if added > 0 {
      self.pages_loaded += 1;
      self.items.extend(page);
    }
    tracing::debug!(offset, added, exhausted = self.exhausted, "Loaded page.");
    Ok(added)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::StoreError;

  async fn numbers(total: u32, offset: u32, limit: u32) -> StoreResult<Vec<u32>> {
    Ok((offset..total.min(offset + limit)).collect())
  }

  #[tokio::test]
  async fn stops_after_short_page() {
    let mut list = InfiniteList::new(4);
    assert_eq!(list.load_more(|o, l| numbers(10, o, l)).await.unwrap(), 4);
    assert_eq!(list.load_more(|o, l| numbers(10, o, l)).await.unwrap(), 4);
    assert_eq!(list.load_more(|o, l| numbers(10, o, l)).await.unwrap(), 2);
    assert!(!list.has_more());
    assert_eq!(list.load_more(|o, l| numbers(10, o, l)).await.unwrap(), 0);
    assert_eq!(list.items(), (0..10).collect::<Vec<_>>().as_slice());
    assert_eq!(list.pages_loaded(), 3);
  }

  #[tokio::test]
  async fn exact_multiple_ends_on_empty_page() {
    let mut list = InfiniteList::new(5);
    list.load_more(|o, l| numbers(5, o, l)).await.unwrap();
    assert!(list.has_more());
    assert_eq!(list.load_more(|o, l| numbers(5, o, l)).await.unwrap(), 0);
    assert!(!list.has_more());
    assert_eq!(list.len(), 5);
  }

  #[tokio::test]
  async fn failed_page_keeps_loaded_items() {
    let mut list = InfiniteList::new(3);
    list.load_more(|o, l| numbers(9, o, l)).await.unwrap();
    let err = list
      .load_more(|_, _| async { Err::<Vec<u32>, _>(StoreError::from_status(503, "unavailable")) })
      .await;
    assert!(err.is_err());
    assert_eq!(list.len(), 3);
    assert!(list.has_more());
    assert_eq!(list.next_offset(), 3);
  }
}
