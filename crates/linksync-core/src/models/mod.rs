pub mod item;

pub use item::{classify, InboxItem, ItemKind};
