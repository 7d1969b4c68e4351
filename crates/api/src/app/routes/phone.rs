//! Checkout phone validation.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::debug;

use storefront_infra::phone_check::PhoneCheck;

use crate::app::dto;
use crate::app::services::AppServices;

/// POST /validate-whatsapp
///
/// 429 once the caller's address is over budget; 200 with the verdict otherwise.
pub async fn validate_whatsapp(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let client = client_address(&headers);
    if !services.phone_limiter.try_acquire(&client) {
        debug!(client = %client, "phone check rate limited");
        return (StatusCode::TOO_MANY_REQUESTS, Json(PhoneCheck::rejected("rate_limited"))).into_response();
    }

    let request: dto::PhoneCheckRequest = serde_json::from_slice(&body).unwrap_or_default();
    let check = services
        .phones
        .check(request.phone.as_deref().unwrap_or_default())
        .await;
    (StatusCode::OK, Json(check)).into_response()
}

/// First `X-Forwarded-For` hop, or `unknown`.
fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
