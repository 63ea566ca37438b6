// src/lib.rs

//! storefront-core: the client-side half of the storefront.
//!
//! It holds the wire model shared with the server, plus the pieces a
//! storefront front-end is built from:
//!  - A cart engine that keeps a guest cart in local storage, merges it into
//!    the server cart once per sign-in, and applies signed-in changes
//!    optimistically with per-line rollback.
//!  - An explicit session context publishing sign-in changes.
//!  - A typed HTTP client for the storefront API, where 404 is `None`.
//!  - Generic back-office CRUD with cache invalidation and notices.
//!  - Infinite-scroll paging and order-history statistics.

pub mod admin;
pub mod api;
pub mod cache;
pub mod cart;
pub mod error;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod session;
pub mod stats;

// --- Re-exports for the Public API ---

pub use crate::admin::CrudOperations;
pub use crate::api::{ApiClient, Resource, ResourceApi};
pub use crate::cache::QueryCache;
pub use crate::cart::{CartEngine, CartStore, FileStore, LineState, LocalCart, MemoryRemoteCart, MemoryStore, RemoteCart};
pub use crate::error::{FieldErrors, StoreError, StoreResult};
pub use crate::notify::{Notice, NoticeLevel, NoticeLog, Notifier, TracingNotifier};
pub use crate::pagination::InfiniteList;
pub use crate::session::{IdentityProvider, Session, SessionContext};
pub use crate::stats::OrderStats;

/*
    Typical wiring:
    1. Build an `ApiClient` (`ApiClient::from_env()` reads STOREFRONT_API_URL).
    2. Wrap it in a `SessionContext` to sign in and out.
    3. Create a `CartEngine` over a `CartStore` and the same client as its
       `RemoteCart`, then drive it with `watch_session(session.subscribe())`.
    4. Back-office screens use `CrudOperations::<Products, _>` and friends
       sharing one `QueryCache`.
*/
