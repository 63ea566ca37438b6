// app/src/services/mod.rs

//! Database-backed operations behind the HTTP handlers.

pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod chat_service;
pub mod favourite_service;
pub mod notification_service;
pub mod order_service;
pub mod token_service;
pub mod user_service;
