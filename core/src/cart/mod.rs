// core/src/cart/mod.rs

pub mod engine;
pub mod line;
pub mod local;
pub mod remote;
pub mod store;

pub use engine::CartEngine;
pub use line::LineState;
pub use local::LocalCart;
pub use remote::{MemoryRemoteCart, RemoteCall, RemoteCart, RemoteOp};
pub use store::{CartStore, FileStore, MemoryStore, ANONYMOUS_CART_KEY};
