//! Checkout and order lookup.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use storefront_orders::OrderNumber;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// POST /orders
///
/// The idempotency key comes from the `Idempotency-Key` header, falling back
/// to the body field. A replayed key answers 200 with the original order.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(body.idempotency_key)
        .unwrap_or_default();

    let outcome = match services
        .ledger
        .create_order(body.customer, &body.items, &key)
        .await
    {
        Ok(o) => o,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    let status = if outcome.duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let response = dto::CheckoutResponse {
        order: dto::OrderResponse::from(&outcome.order),
        duplicate: outcome.duplicate,
    };
    (status, Json(response)).into_response()
}

/// GET /orders/{order_number}
pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_number): Path<String>,
) -> axum::response::Response {
    let number: OrderNumber = match order_number.parse() {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.ledger.get_by_order_number(number).await {
        Ok(order) => (StatusCode::OK, Json(dto::OrderResponse::from(&order))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
