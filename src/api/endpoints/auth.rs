//! Authentication endpoints.
//!
//! `POST /api/auth/login`: Unprotected: exchange credentials for a claims token
//! `GET /api/auth/me`: Protected: the caller's claims and user record

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, AuthContext};
use crate::crypto::{verify_password, Claims};
use crate::db;
use crate::models::{MenuNode, User};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub menus: Vec<MenuNode>,
}

/// `POST /api/auth/login`.
///
/// Unknown users, wrong passwords and unreadable stored hashes all answer
/// with the same 401.
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let Json(request) = payload?;
    let username = request.username.trim().to_string();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".into(),
        ));
    }

    let credentials = {
        let conn = ctx.core.conn().await?;
        db::get_credentials_by_username(&conn, &username)?
    };
    let Some(credentials) = credentials else {
        tracing::info!(username, "Login rejected: unknown user");
        return Err(ApiError::InvalidCredentials);
    };

    // PBKDF2 runs on the blocking pool.
    let password = request.password;
    let stored = credentials.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))?;

    let user = credentials.user;
    match verified {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "Stored password hash unreadable");
            return Err(ApiError::InvalidCredentials);
        }
    }

    let token = ctx.core.tokens.issue(&user, chrono::Utc::now().timestamp())?;
    let menus = {
        let conn = ctx.core.conn().await?;
        ctx.core.resolver.resolve_menu_tree(&conn, user.role_id)?
    };

    tracing::info!(user_id = user.id, role_id = user.role_id, "Login succeeded");
    Ok(ApiResponse::ok(LoginResponse { token, user, menus }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub claims: Claims,
    pub user: User,
}

/// `GET /api/auth/me`.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let conn = ctx.core.conn().await?;
    let user = db::get_user(&conn, auth.user_id())?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", auth.user_id())))?;

    Ok(ApiResponse::ok(MeResponse {
        claims: auth.claims,
        user,
    }))
}
