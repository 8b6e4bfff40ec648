//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies signature and expiry,
//! and injects `AuthContext` into request extensions for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};

/// Require a valid claims token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// Every failure is the same 401 so callers cannot tell a bad signature from
/// an expired token.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let claims = ctx
        .core
        .tokens
        .verify(token, chrono::Utc::now().timestamp())
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(AuthContext { claims });
    Ok(next.run(req).await)
}
