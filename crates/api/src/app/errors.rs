use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_core::DomainError;
use storefront_infra::{LedgerError, StoreError};

pub fn domain_error_to_response(err: &DomainError) -> axum::response::Response {
    let status = match err {
        DomainError::Validation { .. } | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::ProductNotFound | DomainError::CategoryNotFound | DomainError::OrderNotFound => {
            StatusCode::NOT_FOUND
        }
        DomainError::OutOfStock { .. }
        | DomainError::InsufficientStock { .. }
        | DomainError::CategoryInUse { .. }
        | DomainError::InvalidTransition { .. }
        | DomainError::AlreadyClaimed { .. }
        | DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::UnauthorizedSender => StatusCode::UNAUTHORIZED,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(&e),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        other @ (StoreError::Database(_) | StoreError::Corrupt(_)) => {
            tracing::error!(error = %other, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, other.code(), "storage unavailable")
        }
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Store(e) => store_error_to_response(e),
        contended @ LedgerError::Contended(_) => {
            json_error(StatusCode::CONFLICT, contended.code(), contended.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ProductId;
    use storefront_orders::OrderNumber;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("phone_required", "x"), StatusCode::BAD_REQUEST),
            (DomainError::OrderNotFound, StatusCode::NOT_FOUND),
            (
                DomainError::OutOfStock {
                    product_id: ProductId::new(),
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::CategoryInUse { product_count: 2 }, StatusCode::CONFLICT),
            (DomainError::UnauthorizedSender, StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(domain_error_to_response(&err).status(), expected, "{err}");
        }
    }

    #[test]
    fn store_failures_are_internal_errors() {
        let res = store_error_to_response(StoreError::Database("pool closed".into()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let res = store_error_to_response(StoreError::Conflict("slug taken".into()));
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn contended_ledger_writes_are_conflicts() {
        let number: OrderNumber = "FS-0007".parse().unwrap();
        let res = ledger_error_to_response(LedgerError::Contended(number));
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
