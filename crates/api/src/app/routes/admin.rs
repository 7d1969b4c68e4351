//! Back-office endpoints. Mounted behind the admin token check.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use storefront_catalog::{Page, ProductDraft, ProductFilter, ProductPatch};
use storefront_core::{CategoryId, DomainError, ProductId};
use storefront_infra::StatusUpdate;
use storefront_infra::notifier::Delivery;
use storefront_orders::{OrderNumber, OrderStatus, TransitionMode};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

fn parse_id<T: core::str::FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::domain_error_to_response(&DomainError::invalid_id(format!("invalid {what} id")))
    })
}

fn parse_order_number(raw: &str) -> Result<OrderNumber, axum::response::Response> {
    raw.parse()
        .map_err(|e: DomainError| errors::domain_error_to_response(&e))
}

/// GET /admin/products
///
/// Same query as the storefront listing, archived products included.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ProductListQuery>,
) -> axum::response::Response {
    let (filter, sort, page) = match query.resolve(ProductFilter::admin()) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.catalog.list_products(&filter, sort, page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /admin/products
pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(draft): Json<ProductDraft>,
) -> axum::response::Response {
    match services.catalog.create_product(draft).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PATCH /admin/products/{id}
pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.update_product(id, patch).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /admin/categories
pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    match services.catalog.create_category(&body.name).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /admin/categories/{id}
pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match parse_id(&id, "category") {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.delete_category(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PUT /admin/categories/order
pub async fn reorder_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReorderCategoriesRequest>,
) -> axum::response::Response {
    match services.catalog.reorder_categories(&body.ids).await {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /admin/orders
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    let (status, page) = match query.resolve() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.ledger.list_orders(status, page).await {
        Ok(orders) => {
            let page = Page {
                items: orders.items.iter().map(dto::OrderResponse::from).collect(),
                total: orders.total,
                page: orders.page,
                page_size: orders.page_size,
                total_pages: orders.total_pages,
            };
            (StatusCode::OK, Json(page)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// POST /admin/orders/{order_number}/status
///
/// Setting the status an order already has is a no-op (`changed: false`).
pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_number): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> axum::response::Response {
    let number = match parse_order_number(&order_number) {
        Ok(n) => n,
        Err(res) => return res,
    };
    let target: OrderStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    let actor = body
        .actor
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .or_else(|| Some("admin".to_string()));

    match services
        .ledger
        .update_status(number, target, actor, TransitionMode::Idempotent)
        .await
    {
        Ok(update) => {
            let changed = matches!(update, StatusUpdate::Updated(_));
            let order = dto::OrderResponse::from(update.order());
            (
                StatusCode::OK,
                Json(json!({ "order": order, "changed": changed })),
            )
                .into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// POST /admin/orders/{order_number}/notify
///
/// Re-send whichever notification is still outstanding. 502 when the
/// provider refused a send; the report says which one.
pub async fn notify_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_number): Path<String>,
) -> axum::response::Response {
    let number = match parse_order_number(&order_number) {
        Ok(n) => n,
        Err(res) => return res,
    };

    match services.notifier.notify(number).await {
        Ok(report) => {
            let failed = matches!(report.confirmation, Delivery::Failed(_))
                || matches!(report.group_alert, Delivery::Failed(_));
            let status = if failed {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::OK
            };
            (status, Json(report)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// GET /admin/stats
pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
