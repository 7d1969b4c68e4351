use std::collections::HashMap;
use std::sync::RwLock;

use storefront_conversation::{ConversationState, IngestionAttempt};

use super::r#trait::ConversationStore;
use crate::error::StoreError;

/// In-memory conversation store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    states: RwLock<HashMap<String, ConversationState>>,
    attempts: RwLock<Vec<IngestionAttempt>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Database("lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, sender: &str) -> Result<Option<ConversationState>, StoreError> {
        let states = self.states.read().map_err(|_| Self::poisoned())?;
        Ok(states.get(sender).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<(), StoreError> {
        let mut states = self.states.write().map_err(|_| Self::poisoned())?;
        states.insert(state.sender.clone(), state.clone());
        Ok(())
    }

    async fn record_attempt(&self, attempt: &IngestionAttempt) -> Result<(), StoreError> {
        let mut attempts = self.attempts.write().map_err(|_| Self::poisoned())?;
        attempts.push(attempt.clone());
        Ok(())
    }

    async fn attempts_for(&self, sender: &str) -> Result<Vec<IngestionAttempt>, StoreError> {
        let attempts = self.attempts.read().map_err(|_| Self::poisoned())?;
        Ok(attempts.iter().filter(|a| a.sender == sender).cloned().collect())
    }
}
