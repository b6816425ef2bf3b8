pub mod conversation;
pub mod intent;
pub mod item;

pub use conversation::{ConversationHistory, ConversationTurn, Role, HISTORY_WINDOW};
pub use intent::Intent;
pub use item::{DeleteTarget, InventoryItem, ItemChange, ItemFilter, QuantityChange};
