//! Menu endpoints.
//!
//! `GET /api/menus/user`: the caller's menu tree
//! `GET /api/menus/check-access?path=&capability=`: single capability probe

use std::str::FromStr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, AuthContext};
use crate::models::{Capability, MenuNode};

pub async fn user_menus(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<MenuNode>>>, ApiError> {
    let conn = ctx.core.conn().await?;
    let menus = ctx.core.resolver.resolve_for_user(&conn, auth.user_id())?;
    Ok(ApiResponse::ok(menus))
}

#[derive(Deserialize)]
pub struct CheckAccessQuery {
    pub path: String,
    #[serde(default = "default_capability")]
    pub capability: String,
}

fn default_capability() -> String {
    Capability::Access.as_str().to_string()
}

#[derive(Serialize)]
pub struct CheckAccessResponse {
    pub path: String,
    pub capability: Capability,
    pub allowed: bool,
}

pub async fn check_access(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<CheckAccessQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<CheckAccessResponse>>, ApiError> {
    let Query(query) = query?;
    let capability = Capability::from_str(query.capability.trim())
        .map_err(|_| ApiError::BadRequest(format!("Unknown capability: {}", query.capability)))?;

    let conn = ctx.core.conn().await?;
    let allowed = ctx
        .core
        .resolver
        .has_capability(&conn, auth.role_id(), &query.path, capability)?;

    Ok(ApiResponse::ok(CheckAccessResponse {
        path: query.path,
        capability,
        allowed,
    }))
}
