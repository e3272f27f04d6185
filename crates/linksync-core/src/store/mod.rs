pub mod inbox_store;
pub mod shared_storage;

pub use inbox_store::InboxStore;
pub use shared_storage::{SharedState, SharedStorage};
