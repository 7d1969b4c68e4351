use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

pub mod admin;
pub mod catalog;
pub mod event_stream;
pub mod orders;
pub mod phone;
pub mod system;
pub mod webhooks;

/// Storefront and provider-facing endpoints (no auth).
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/products", get(catalog::list_products))
        .route("/products/:id_or_slug", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .route("/orders", post(orders::create_order))
        .route("/orders/:order_number", get(orders::get_order))
        .route("/validate-whatsapp", post(phone::validate_whatsapp))
        .route(
            "/webhooks/whatsapp",
            get(webhooks::verify).post(webhooks::receive),
        )
}

/// Back-office endpoints; mounted under `/admin` behind the token check.
pub fn admin_router() -> Router {
    Router::new()
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route("/products/:id", patch(admin::update_product))
        .route("/categories", post(admin::create_category))
        .route("/categories/order", put(admin::reorder_categories))
        .route("/categories/:id", delete(admin::delete_category))
        .route("/orders", get(admin::list_orders))
        .route("/orders/:order_number/status", post(admin::update_order_status))
        .route("/orders/:order_number/notify", post(admin::notify_order))
        .route("/stats", get(admin::stats))
        .route("/stream", get(event_stream::stream_events))
}
