//! Per-sender conversation state and the ingestion audit log.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryConversationStore;
pub use postgres::PostgresConversationStore;
pub use r#trait::ConversationStore;
