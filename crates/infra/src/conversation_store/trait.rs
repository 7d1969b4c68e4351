use storefront_conversation::{ConversationState, IngestionAttempt};

use crate::error::StoreError;

#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, sender: &str) -> Result<Option<ConversationState>, StoreError>;

    /// Upsert; one live record per sender.
    async fn save(&self, state: &ConversationState) -> Result<(), StoreError>;

    /// Append-only.
    async fn record_attempt(&self, attempt: &IngestionAttempt) -> Result<(), StoreError>;

    /// Attempts for one sender, oldest first.
    async fn attempts_for(&self, sender: &str) -> Result<Vec<IngestionAttempt>, StoreError>;
}
