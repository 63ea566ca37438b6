// core/src/api/mod.rs

//! Typed HTTP access to the storefront API.
//!
//! [`ApiClient`] is the single transport. It also implements the cart
//! engine's [`RemoteCart`](crate::cart::RemoteCart) and the session's
//! [`IdentityProvider`](crate::session::IdentityProvider), so one client can
//! back a whole storefront session.

mod auth;
mod cart;
mod chat;
pub mod client;
pub mod resource;
pub mod storefront;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use resource::{Categories, Orders, Products, Resource, ResourceApi, Users};
pub use storefront::NotificationFilter;
