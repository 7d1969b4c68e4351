//! WhatsApp Cloud API webhook.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use storefront_infra::chat::{parse_webhook, Routed};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// GET /webhooks/whatsapp
///
/// Subscription handshake: echo `hub.challenge` when the verify token matches.
pub async fn verify(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::WebhookVerifyQuery>,
) -> axum::response::Response {
    let subscribed = query.mode.as_deref() == Some("subscribe")
        && query.verify_token.as_deref() == Some(services.verify_token.as_str());

    match (subscribed, query.challenge) {
        (true, Some(challenge)) => (StatusCode::OK, challenge).into_response(),
        _ => errors::json_error(StatusCode::FORBIDDEN, "forbidden", "webhook verification failed"),
    }
}

/// POST /webhooks/whatsapp
///
/// Always 200: business failures are reported to the sender in chat, and a
/// non-2xx answer would only make the provider redeliver.
pub async fn receive(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let routed = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => match parse_webhook(&payload) {
            Some(message) => services.chat.handle(message).await,
            None => Routed::Ignored,
        },
        Err(e) => {
            debug!(error = %e, "webhook body is not json");
            Routed::Ignored
        }
    };

    (StatusCode::OK, Json(json!({ "ok": true, "routed": routed }))).into_response()
}
