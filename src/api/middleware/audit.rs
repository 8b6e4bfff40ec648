//! Access logging middleware.
//!
//! One `info` line per API request with method, path, response status and,
//! once auth has run, the caller's user and role ids.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::AuthContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let caller = req
        .extensions()
        .get::<AuthContext>()
        .map(|auth| (auth.user_id(), auth.role_id()));
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match caller {
        Some((user_id, role_id)) => {
            tracing::info!(%method, %path, status, user_id, role_id, elapsed_ms, "API access")
        }
        None => tracing::info!(%method, %path, status, elapsed_ms, "API access"),
    }

    response
}
