// app/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod auth_handlers;
pub mod cart_handlers;
pub mod catalog_handlers;
pub mod chat_handlers;
pub mod favourite_handlers;
pub mod notification_handlers;
pub mod order_handlers;
