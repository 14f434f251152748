pub mod memory;
pub mod persistence;
pub mod types;

pub use memory::InMemoryInteractionLog;
pub use persistence::FileInteractionLog;
pub use types::{InteractionAction, InteractionRecord};
