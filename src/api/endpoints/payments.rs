//! Payment endpoints.
//!
//! - `POST /api/payments` — direct payment, status defaults to `pending`
//! - `GET /api/payments/user/:id`
//! - `PUT /api/payments/:id`
//! - `GET /api/receipt/:id` — PDF receipt for a paid payment

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::authorization::CallerContext;
use crate::models::{Payment, PaymentWithParties};
use crate::payment::{self, PaymentInput, PaymentUpdate};

#[derive(Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub payment: Payment,
}

/// `POST /api/payments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(input): ApiJson<PaymentInput>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let payment = payment::create(&conn, &caller, input)?;
    Ok(Json(PaymentResponse {
        success: true,
        payment,
    }))
}

#[derive(Serialize)]
pub struct PaymentsResponse {
    pub success: bool,
    pub count: usize,
    pub payments: Vec<PaymentWithParties>,
}

impl PaymentsResponse {
    pub fn new(payments: Vec<PaymentWithParties>) -> Self {
        Self {
            success: true,
            count: payments.len(),
            payments,
        }
    }
}

/// `GET /api/payments/user/:id` — newest first, practitioner resolved.
pub async fn list_for_account(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<PaymentsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let payments = payment::list_for_account(&conn, &id)?;
    Ok(Json(PaymentsResponse::new(payments)))
}

/// `PUT /api/payments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PaymentUpdate>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let payment = payment::update(&conn, &caller, &id, input)?;
    Ok(Json(PaymentResponse {
        success: true,
        payment,
    }))
}

/// `GET /api/receipt/:id` — streamed as an attachment.
pub async fn receipt(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let receipt = payment::receipt(&conn, ctx.core.renderer(), &id)?;

    let disposition = format!("attachment; filename={}", receipt.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, receipt.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        receipt.bytes,
    )
        .into_response())
}
