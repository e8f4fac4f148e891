//! Appointment endpoints.
//!
//! - `POST /api/appointments` — book
//! - `GET /api/appointments/:id`
//! - `GET /api/appointments/user/:id`, `GET /api/appointments/practitioner/:id`
//! - `PUT /api/appointments/:id`, `DELETE /api/appointments/:id`
//! - `POST /api/appointments/:id/payments` — pay for an appointment

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::appointment::{self, AppointmentUpdate, BookingInput};
use crate::authorization::CallerContext;
use crate::models::{Appointment, Payment};
use crate::payment::{self, AppointmentPaymentInput};

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub success: bool,
    pub appointment: Appointment,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub success: bool,
    pub count: usize,
    pub appointments: Vec<Appointment>,
}

impl AppointmentsResponse {
    fn new(appointments: Vec<Appointment>) -> Self {
        Self {
            success: true,
            count: appointments.len(),
            appointments,
        }
    }
}

/// `POST /api/appointments` — status always starts as `pending`.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(input): ApiJson<BookingInput>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let appointment = appointment::book(&conn, &caller, input)?;
    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let appointment = appointment::get_appointment(&conn, &id)?;
    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}

/// `GET /api/appointments/user/:id`
pub async fn list_for_account(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let appointments = appointment::list_for_account(&conn, &id)?;
    Ok(Json(AppointmentsResponse::new(appointments)))
}

/// `GET /api/appointments/practitioner/:id`
pub async fn list_for_practitioner(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let appointments = appointment::list_for_practitioner(&conn, &id)?;
    Ok(Json(AppointmentsResponse::new(appointments)))
}

/// `PUT /api/appointments/:id` — partial update, any status may follow any other.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AppointmentUpdate>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let appointment = appointment::update(&conn, &caller, &id, input)?;
    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `DELETE /api/appointments/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    appointment::delete(&conn, &caller, &id)?;
    Ok(Json(DeletedResponse {
        success: true,
        message: "Appointment deleted",
    }))
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub payment: Payment,
}

/// `POST /api/appointments/:id/payments` — status defaults to `paid`.
pub async fn pay(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AppointmentPaymentInput>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let payment = payment::create_for_appointment(&conn, &caller, &id, input)?;
    Ok(Json(PaymentResponse {
        success: true,
        payment,
    }))
}
