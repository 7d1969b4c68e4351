//! Postgres-backed conversation store (`wa_conversations`, `ingestion_attempts`).

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use storefront_conversation::{
    AttemptStatus, ConversationPhase, ConversationState, IngestionAttempt, PendingPayload,
};

use super::r#trait::ConversationStore;
use crate::error::{StoreError, corrupt, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresConversationStore {
    pool: Arc<PgPool>,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl ConversationStore for PostgresConversationStore {
    #[instrument(skip(self), err)]
    async fn load(&self, sender: &str) -> Result<Option<ConversationState>, StoreError> {
        let row = sqlx::query(
            "SELECT sender_phone, state, pending_payload, updated_at FROM wa_conversations WHERE sender_phone = $1",
        )
        .bind(sender)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_conversation", e))?;

        row.as_ref().map(state_from_row).transpose()
    }

    #[instrument(skip(self, state), fields(sender = %state.sender, phase = %state.phase), err)]
    async fn save(&self, state: &ConversationState) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO wa_conversations (sender_phone, state, pending_payload, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (sender_phone)
            DO UPDATE SET
                state = EXCLUDED.state,
                pending_payload = EXCLUDED.pending_payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&state.sender)
        .bind(state.phase.as_str())
        .bind(Json(&state.pending))
        .bind(state.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_conversation", e))?;
        Ok(())
    }

    #[instrument(skip(self, attempt), fields(sender = %attempt.sender, status = attempt.status.as_str()), err)]
    async fn record_attempt(&self, attempt: &IngestionAttempt) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ingestion_attempts (
                sender_phone,
                source_type,
                source_value,
                status,
                error_code,
                payload,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&attempt.sender)
        .bind(attempt.source_type.as_str())
        .bind(&attempt.source_value)
        .bind(attempt.status.as_str())
        .bind(&attempt.error_code)
        .bind(&attempt.payload)
        .bind(attempt.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_attempt", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn attempts_for(&self, sender: &str) -> Result<Vec<IngestionAttempt>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT sender_phone, source_type, source_value, status, error_code, payload, created_at
            FROM ingestion_attempts
            WHERE sender_phone = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(sender)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("attempts_for", e))?;

        rows.iter().map(attempt_from_row).collect()
    }
}

fn state_from_row(row: &PgRow) -> Result<ConversationState, StoreError> {
    let phase: String = row.try_get("state").map_err(|e| corrupt("state", e))?;
    let Json(pending): Json<PendingPayload> =
        row.try_get("pending_payload").map_err(|e| corrupt("pending_payload", e))?;
    Ok(ConversationState {
        sender: row.try_get("sender_phone").map_err(|e| corrupt("sender_phone", e))?,
        phase: phase.parse::<ConversationPhase>().map_err(|e| corrupt("state", e))?,
        pending,
        updated_at: row.try_get("updated_at").map_err(|e| corrupt("updated_at", e))?,
    })
}

fn attempt_from_row(row: &PgRow) -> Result<IngestionAttempt, StoreError> {
    let source_type: String = row.try_get("source_type").map_err(|e| corrupt("source_type", e))?;
    let status: String = row.try_get("status").map_err(|e| corrupt("status", e))?;
    let status = match status.as_str() {
        "success" => AttemptStatus::Success,
        "error" => AttemptStatus::Error,
        other => return Err(corrupt("status", format!("unknown attempt status {other}"))),
    };
    Ok(IngestionAttempt {
        sender: row.try_get("sender_phone").map_err(|e| corrupt("sender_phone", e))?,
        source_type: source_type.parse().map_err(|e| corrupt("source_type", e))?,
        source_value: row.try_get("source_value").map_err(|e| corrupt("source_value", e))?,
        status,
        error_code: row.try_get("error_code").map_err(|e| corrupt("error_code", e))?,
        payload: row.try_get("payload").map_err(|e| corrupt("payload", e))?,
        created_at: row.try_get("created_at").map_err(|e| corrupt("created_at", e))?,
    })
}
