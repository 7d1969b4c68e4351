//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, ledger, notifier, chat router, background worker
//! - `routes/`: HTTP handlers (one file per surface)
//! - `dto.rs`: request/response DTOs and query parsing
//! - `errors.rs`: consistent `{"error", "message"}` responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use storefront_infra::config::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router over already-wired services.
pub fn build_app(services: Arc<AppServices>, config: &AppConfig) -> Router {
    let admin_state = middleware::AdminAuthState {
        token: Arc::from(config.server.admin_token.as_str()),
    };

    let admin = routes::admin_router().layer(axum::middleware::from_fn_with_state(
        admin_state,
        middleware::admin_auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .nest("/admin", admin)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
