//! Registration desk endpoints (rekam medis).
//!
//! - `POST /api/rm/register`: new patient with generated record number
//! - `POST /api/rm/appointments`: book an appointment and open its visit
//! - `POST /api/rm/appointments/:code/check-in`: scheduled → examined
//! - `POST /api/rm/appointments/:code/reactivate`: examined → scheduled

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::models::{Appointment, NewAppointment, NewPatient, Patient};
use crate::registration::{self, AppointmentBooking};

pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Patient>>), ApiError> {
    let Json(form) = payload?;
    let conn = ctx.core.conn().await?;
    let today = chrono::Local::now().date_naive();
    let patient = registration::register_patient(&conn, &form, today)?;
    Ok(ApiResponse::created(patient))
}

pub async fn create_appointment(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewAppointment>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentBooking>>), ApiError> {
    let Json(form) = payload?;
    let conn = ctx.core.conn().await?;
    let booking = registration::create_appointment(
        &conn,
        &form,
        ctx.core.config.appointment_code,
        chrono::Local::now().naive_local(),
    )?;
    Ok(ApiResponse::created(booking))
}

pub async fn check_in(
    State(ctx): State<ApiContext>,
    code: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let Path(code) = code?;
    let conn = ctx.core.conn().await?;
    Ok(ApiResponse::ok(registration::check_in(&conn, &code)?))
}

pub async fn reactivate(
    State(ctx): State<ApiContext>,
    code: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let Path(code) = code?;
    let conn = ctx.core.conn().await?;
    Ok(ApiResponse::ok(registration::reactivate(&conn, &code)?))
}
