//! Order persistence.
//!
//! Orders are stored as whole documents with their aggregate version; writes
//! of existing orders are compare-and-swap on that version.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use r#trait::OrderStore;
