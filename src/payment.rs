//! Payment service: recording payments, listing them and producing receipts.
//!
//! A direct payment with no status is `pending`; a payment recorded against
//! an appointment with no status is `paid`.

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::authorization::{CallerContext, Capability};
use crate::db;
use crate::documents::{self, DocumentRenderer};
use crate::error::{parse_choice, ClinicError};
use crate::models::*;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentInput {
    pub appointment_id: Option<Uuid>,
    /// Paying account; defaults to the caller.
    pub account_id: Option<Uuid>,
    pub practitioner_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentPaymentInput {
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentUpdate {
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub status: Option<String>,
}

/// A rendered receipt ready to stream.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn check_amount(amount: f64) -> Result<f64, ClinicError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ClinicError::validation("amount must be greater than zero"))
    }
}

fn require_amount(amount: Option<f64>) -> Result<f64, ClinicError> {
    amount
        .ok_or_else(|| ClinicError::validation("amount is required"))
        .and_then(check_amount)
}

fn method_or_default(raw: Option<&str>) -> Result<PaymentMethod, ClinicError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_choice(raw, "method"),
        None => Ok(PaymentMethod::default()),
    }
}

/// Missing or empty status falls back to `default`.
fn status_or(raw: Option<&str>, default: PaymentStatus) -> Result<PaymentStatus, ClinicError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_choice(raw, "status"),
        None => Ok(default),
    }
}

fn not_found() -> ClinicError {
    ClinicError::not_found("Payment not found")
}

/// Record a payment that may or may not reference an appointment.
pub fn create(conn: &Connection, caller: &CallerContext, input: PaymentInput) -> Result<Payment, ClinicError> {
    caller.require(Capability::RecordPayment)?;
    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4(),
        appointment_id: input.appointment_id,
        account_id: Some(input.account_id.unwrap_or(caller.account_id)),
        practitioner_id: input.practitioner_id,
        amount: require_amount(input.amount)?,
        method: method_or_default(input.method.as_deref())?,
        status: status_or(input.status.as_deref(), PaymentStatus::Pending)?,
        date: now,
        created_at: now,
    };
    db::insert_payment(conn, &payment)?;
    tracing::info!(payment_id = %payment.id, status = %payment.status, "Payment recorded");
    Ok(payment)
}

/// Record a payment for an existing appointment, copying its account and
/// practitioner.
pub fn create_for_appointment(
    conn: &Connection,
    caller: &CallerContext,
    appointment_id: &Uuid,
    input: AppointmentPaymentInput,
) -> Result<Payment, ClinicError> {
    caller.require(Capability::RecordPayment)?;
    let amount = require_amount(input.amount)?;
    let appointment = db::get_appointment(conn, appointment_id)?
        .ok_or_else(|| ClinicError::not_found("Appointment not found"))?;

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4(),
        appointment_id: Some(appointment.id),
        account_id: Some(appointment.account_id),
        practitioner_id: Some(appointment.practitioner_id),
        amount,
        method: method_or_default(input.method.as_deref())?,
        status: status_or(input.status.as_deref(), PaymentStatus::Paid)?,
        date: now,
        created_at: now,
    };
    db::insert_payment(conn, &payment)?;
    tracing::info!(
        payment_id = %payment.id,
        appointment_id = %appointment.id,
        status = %payment.status,
        "Appointment payment recorded"
    );
    Ok(payment)
}

pub fn list_for_account(conn: &Connection, account_id: &Uuid) -> Result<Vec<PaymentWithParties>, ClinicError> {
    Ok(db::list_payments_for_account(conn, account_id)?)
}

pub fn list_all(conn: &Connection, caller: &CallerContext) -> Result<Vec<PaymentWithParties>, ClinicError> {
    caller.require(Capability::AdminDashboard)?;
    Ok(db::list_all_payments(conn)?)
}

pub fn update(
    conn: &Connection,
    caller: &CallerContext,
    id: &Uuid,
    input: PaymentUpdate,
) -> Result<Payment, ClinicError> {
    caller.require(Capability::RecordPayment)?;
    let patch = PaymentPatch {
        amount: input.amount.map(check_amount).transpose()?,
        method: input
            .method
            .as_deref()
            .map(|m| parse_choice(m, "method"))
            .transpose()?,
        status: input
            .status
            .as_deref()
            .map(|s| parse_choice(s, "status"))
            .transpose()?,
    };
    let payment = db::update_payment(conn, id, &patch)?.ok_or_else(not_found)?;
    tracing::info!(payment_id = %id, status = %payment.status, "Payment updated");
    Ok(payment)
}

/// Render a receipt. Only payments whose status is exactly `paid` have one.
pub fn receipt(conn: &Connection, renderer: &dyn DocumentRenderer, id: &Uuid) -> Result<Receipt, ClinicError> {
    let details = match db::get_receipt_details(conn, id)? {
        Some(details) if details.payment.status == PaymentStatus::Paid => details,
        _ => return Err(ClinicError::not_found("Receipt not available.")),
    };
    let bytes = renderer.render(&documents::receipt_payload(&details))?;
    Ok(Receipt {
        file_name: documents::receipt_file_name(id),
        content_type: renderer.content_type(),
        bytes,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
