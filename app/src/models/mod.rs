// app/src/models/mod.rs

//! Database rows and their conversion into the wire model.

pub mod cart_item;
pub mod category;
pub mod chat;
pub mod favourite;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use cart_item::CartItemRow;
pub use category::CategoryRow;
pub use chat::{ChatMessageRow, ChatRow};
pub use favourite::FavouriteRow;
pub use notification::NotificationRow;
pub use order::{DbOrderStatus, OrderRow};
pub use order_item::OrderItemRow;
pub use product::ProductRow;
pub use user::{AdminUserRow, ProfileRow};
