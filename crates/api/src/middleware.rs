use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use constant_time_eq::constant_time_eq;

use crate::app::errors;

#[derive(Clone)]
pub struct AdminAuthState {
    pub token: Arc<str>,
}

/// Guard for `/admin/*`: `Authorization: Bearer <ADMIN_TOKEN>`.
pub async fn admin_auth_middleware(
    State(state): State<AdminAuthState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    match extract_bearer(req.headers()) {
        Ok(token) if constant_time_eq(token.as_bytes(), state.token.as_bytes()) => next.run(req).await,
        _ => errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "admin token required"),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer secret ")).unwrap(), "secret");
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_rejected() {
        assert_eq!(extract_bearer(&headers("Basic abc")), Err(StatusCode::UNAUTHORIZED));
        assert_eq!(extract_bearer(&headers("Bearer   ")), Err(StatusCode::UNAUTHORIZED));
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(StatusCode::UNAUTHORIZED));
    }
}
