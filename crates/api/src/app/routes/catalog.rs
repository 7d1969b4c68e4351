//! Customer-facing catalog reads.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use storefront_catalog::{ProductFilter, ProductKey};
use storefront_core::DomainError;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// GET /products
///
/// Archived products are never listed here, whatever the query says.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ProductListQuery>,
) -> axum::response::Response {
    let (filter, sort, page) = match query.resolve(ProductFilter::customer()) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.catalog.list_products(&filter, sort, page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /products/{id_or_slug}
pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id_or_slug): Path<String>,
) -> axum::response::Response {
    let key = ProductKey::parse(&id_or_slug);
    match services.catalog.get_product(&key).await {
        Ok(Some(product)) if product.is_listed() => (StatusCode::OK, Json(product)).into_response(),
        Ok(_) => errors::domain_error_to_response(&DomainError::ProductNotFound),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /categories
pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_categories().await {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
