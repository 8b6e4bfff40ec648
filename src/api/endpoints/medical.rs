//! Medical record endpoints.
//!
//! - `GET /api/medical/visits/:id`: visit with vitals and line items
//! - `GET /api/medical/visit-{medications,procedures,diagnoses}/:visit_id`
//! - `POST /api/medical/visit-{medications,procedures,diagnoses}`: sync a list
//! - `POST /api/medical/editvitals`: validate and store vitals

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::medical_record::{self, VitalsForm};
use crate::models::{LineItemCategory, LineItemInput, LineItems, Visit, VisitDetail};

pub async fn visit_detail(
    State(ctx): State<ApiContext>,
    visit_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<VisitDetail>>, ApiError> {
    let Path(visit_id) = visit_id?;
    let conn = ctx.core.conn().await?;
    Ok(ApiResponse::ok(medical_record::load_visit_detail(&conn, visit_id)?))
}

// ═══════════════════════════════════════════════════════════
// Line items
// ═══════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct SyncRequest {
    pub visit_id: i64,
    pub items: Vec<LineItemInput>,
}

async fn list(
    ctx: ApiContext,
    visit_id: Result<Path<i64>, PathRejection>,
    category: LineItemCategory,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    let Path(visit_id) = visit_id?;
    let conn = ctx.core.conn().await?;
    let items = medical_record::list_line_items(&conn, visit_id, category)?;
    Ok(ApiResponse::ok(items))
}

async fn sync(
    ctx: ApiContext,
    payload: Result<Json<SyncRequest>, JsonRejection>,
    category: LineItemCategory,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    let Json(request) = payload?;
    let conn = ctx.core.conn().await?;
    let items = medical_record::sync_line_items(&conn, request.visit_id, category, &request.items)?;
    let message = format!("{} {} item(s) saved", items.len(), category);
    Ok(ApiResponse::with_message(items, message))
}

pub async fn list_medications(
    State(ctx): State<ApiContext>,
    visit_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    list(ctx, visit_id, LineItemCategory::Medication).await
}

pub async fn list_procedures(
    State(ctx): State<ApiContext>,
    visit_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    list(ctx, visit_id, LineItemCategory::Procedure).await
}

pub async fn list_diagnoses(
    State(ctx): State<ApiContext>,
    visit_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    list(ctx, visit_id, LineItemCategory::Diagnosis).await
}

pub async fn sync_medications(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    sync(ctx, payload, LineItemCategory::Medication).await
}

pub async fn sync_procedures(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    sync(ctx, payload, LineItemCategory::Procedure).await
}

pub async fn sync_diagnoses(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LineItems>>, ApiError> {
    sync(ctx, payload, LineItemCategory::Diagnosis).await
}

// ═══════════════════════════════════════════════════════════
// Vitals
// ═══════════════════════════════════════════════════════════

pub async fn edit_vitals(
    State(ctx): State<ApiContext>,
    payload: Result<Json<VitalsForm>, JsonRejection>,
) -> Result<Json<ApiResponse<Visit>>, ApiError> {
    let Json(form) = payload?;
    let conn = ctx.core.conn().await?;
    let visit = medical_record::edit_vitals(&conn, &form, chrono::Local::now().naive_local())?;
    Ok(ApiResponse::with_message(visit, "Vitals saved"))
}
