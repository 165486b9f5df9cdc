pub mod favorites;
pub mod kv_store;
pub mod media_item;
pub mod notification;

pub use favorites::*;
pub use kv_store::*;
pub use media_item::*;
pub use notification::*;
