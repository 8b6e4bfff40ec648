//! Role privilege endpoints.
//!
//! `GET /api/roles/:id/privilege`: privilege matrix of one role
//! `POST /api/roles/:id/privilege`: replace the role's privileges wholesale

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::access_control::{self, PrivilegeMatrix};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, AuthContext};
use crate::models::{Capability, PrivilegeInput, RolePrivilege};

/// Menu whose `edit` flag governs privilege changes.
pub const ROLE_SETTINGS_PATH: &str = "/settings/roles";

pub async fn get_privileges(
    State(ctx): State<ApiContext>,
    role_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<PrivilegeMatrix>>, ApiError> {
    let Path(role_id) = role_id?;
    let conn = ctx.core.conn().await?;
    let matrix = access_control::privilege_matrix(&conn, role_id)?;
    Ok(ApiResponse::ok(matrix))
}

#[derive(Deserialize)]
pub struct ReplacePrivilegesRequest {
    pub privileges: Vec<PrivilegeInput>,
}

pub async fn replace_privileges(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    role_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReplacePrivilegesRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<RolePrivilege>>>, ApiError> {
    let Path(role_id) = role_id?;
    let Json(request) = payload?;
    let conn = ctx.core.conn().await?;

    let allowed = ctx.core.resolver.has_capability(
        &conn,
        auth.role_id(),
        ROLE_SETTINGS_PATH,
        Capability::Edit,
    )?;
    if !allowed {
        tracing::warn!(
            user_id = auth.user_id(),
            role_id = auth.role_id(),
            target_role = role_id,
            "Privilege change denied"
        );
        return Err(ApiError::Forbidden(format!(
            "Changing privileges requires edit access to {ROLE_SETTINGS_PATH}"
        )));
    }

    let saved = access_control::replace_privileges(&conn, role_id, &request.privileges)?;
    Ok(ApiResponse::with_message(saved, "Privileges updated"))
}
