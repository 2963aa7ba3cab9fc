pub mod cache;
pub mod error;
pub mod sqlite;

pub use cache::ResponseCache;
pub use error::StoreError;
pub use sqlite::{ConversationStore, StoredMessage};
