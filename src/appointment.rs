//! Appointment service: booking, listing, rescheduling and cancellation.
//!
//! Status changes are not constrained: any status may replace any other,
//! for owners, practitioners and administrators alike.

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::authorization::{CallerContext, Capability};
use crate::db;
use crate::error::{parse_choice, ClinicError};
use crate::models::*;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingInput {
    pub practitioner_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
    /// Owning account; defaults to the caller.
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentUpdate {
    pub practitioner_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub appointment_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminAppointmentUpdate {
    pub status: Option<String>,
    pub date: Option<String>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ClinicError::validation("Invalid date, expected YYYY-MM-DD"))
}

/// Parse `HH:MM` and re-emit it zero-padded so stored times sort correctly.
fn parse_time(raw: &str) -> Result<String, ClinicError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ClinicError::validation("Invalid time, expected HH:MM"))
}

fn require_practitioner(conn: &Connection, id: &Uuid) -> Result<Account, ClinicError> {
    match db::get_account(conn, id)? {
        Some(account) if account.is_practitioner() => Ok(account),
        _ => Err(ClinicError::validation("Practitioner not found")),
    }
}

fn not_found() -> ClinicError {
    ClinicError::not_found("Appointment not found")
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    db::get_appointment(conn, id)?.ok_or_else(not_found)
}

/// Book an appointment. The new appointment is always `pending`.
pub fn book(conn: &Connection, caller: &CallerContext, input: BookingInput) -> Result<Appointment, ClinicError> {
    caller.require(Capability::BookAppointment)?;

    let (practitioner_id, date, time) = match (input.practitioner_id, input.date.as_deref(), input.time.as_deref()) {
        (Some(p), Some(d), Some(t)) => (p, parse_date(d)?, parse_time(t)?),
        _ => {
            return Err(ClinicError::validation(
                "practitioner_id, date and time are required",
            ))
        }
    };
    let appointment_type = match input.appointment_type.as_deref() {
        Some(raw) => parse_choice::<AppointmentType>(raw, "appointment_type")?,
        None => AppointmentType::default(),
    };

    let account_id = input.account_id.unwrap_or(caller.account_id);
    if account_id != caller.account_id {
        caller.require(Capability::BookOnBehalf)?;
        if db::get_account(conn, &account_id)?.is_none() {
            return Err(ClinicError::validation("Account not found"));
        }
    }
    require_practitioner(conn, &practitioner_id)?;

    let appointment = Appointment {
        id: Uuid::new_v4(),
        account_id,
        practitioner_id,
        date,
        time,
        appointment_type,
        status: AppointmentStatus::Pending,
        notes: input.notes,
        created_at: Utc::now(),
    };
    db::insert_appointment(conn, &appointment)?;
    tracing::info!(
        appointment_id = %appointment.id,
        account_id = %appointment.account_id,
        practitioner_id = %appointment.practitioner_id,
        "Appointment booked"
    );
    Ok(appointment)
}

pub fn list_for_account(conn: &Connection, account_id: &Uuid) -> Result<Vec<Appointment>, ClinicError> {
    Ok(db::list_appointments_for_account(conn, account_id)?)
}

pub fn list_for_practitioner(conn: &Connection, practitioner_id: &Uuid) -> Result<Vec<Appointment>, ClinicError> {
    Ok(db::list_appointments_for_practitioner(conn, practitioner_id)?)
}

pub fn update(
    conn: &Connection,
    caller: &CallerContext,
    id: &Uuid,
    input: AppointmentUpdate,
) -> Result<Appointment, ClinicError> {
    caller.require(Capability::ModifyAppointment)?;

    if let Some(practitioner_id) = &input.practitioner_id {
        require_practitioner(conn, practitioner_id)?;
    }
    let patch = AppointmentPatch {
        practitioner_id: input.practitioner_id,
        date: input.date.as_deref().map(parse_date).transpose()?,
        time: input.time.as_deref().map(parse_time).transpose()?,
        appointment_type: input
            .appointment_type
            .as_deref()
            .map(|t| parse_choice(t, "appointment_type"))
            .transpose()?,
        status: input
            .status
            .as_deref()
            .map(|s| parse_choice(s, "status"))
            .transpose()?,
        notes: input.notes,
    };

    let appointment = db::update_appointment(conn, id, &patch)?.ok_or_else(not_found)?;
    tracing::info!(appointment_id = %id, status = %appointment.status, "Appointment updated");
    Ok(appointment)
}

/// Administrator override of status and date.
pub fn admin_update(
    conn: &Connection,
    caller: &CallerContext,
    id: &Uuid,
    input: AdminAppointmentUpdate,
) -> Result<Appointment, ClinicError> {
    caller.require(Capability::AdminDashboard)?;
    let patch = AppointmentPatch {
        date: input.date.as_deref().map(parse_date).transpose()?,
        status: input
            .status
            .as_deref()
            .map(|s| parse_choice(s, "status"))
            .transpose()?,
        ..Default::default()
    };
    let appointment = db::update_appointment(conn, id, &patch)?.ok_or_else(not_found)?;
    tracing::info!(appointment_id = %id, admin = %caller.account_id, "Appointment updated by admin");
    Ok(appointment)
}

/// Remove an appointment by id. Payments and reports that reference it stay.
pub fn delete(conn: &Connection, caller: &CallerContext, id: &Uuid) -> Result<(), ClinicError> {
    caller.require(Capability::ModifyAppointment)?;
    if !db::delete_appointment(conn, id)? {
        return Err(not_found());
    }
    tracing::info!(appointment_id = %id, "Appointment deleted");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn booking(practitioner: &Account) -> BookingInput {
        BookingInput {
            practitioner_id: Some(practitioner.id),
            date: Some("2025-07-01".into()),
            time: Some("10:30".into()),
            ..Default::default()
        }
    }

    #[test]
    fn booking_defaults_owner_type_and_status() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);

        let appt = book(&conn, &caller_for(&patient), booking(&doc)).unwrap();
        assert_eq!(appt.account_id, patient.id);
        assert_eq!(appt.appointment_type, AppointmentType::Online);
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.time, "10:30");
    }

    #[test]
    fn booking_validates_input() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let caller = caller_for(&patient);

        let mut missing = booking(&doc);
        missing.time = None;
        assert!(matches!(book(&conn, &caller, missing), Err(ClinicError::Validation(_))));

        let mut bad_date = booking(&doc);
        bad_date.date = Some("01/07/2025".into());
        assert!(matches!(book(&conn, &caller, bad_date), Err(ClinicError::Validation(_))));

        let mut bad_time = booking(&doc);
        bad_time.time = Some("25:00".into());
        assert!(matches!(book(&conn, &caller, bad_time), Err(ClinicError::Validation(_))));

        let mut bad_type = booking(&doc);
        bad_type.appointment_type = Some("video".into());
        assert!(matches!(book(&conn, &caller, bad_type), Err(ClinicError::Validation(_))));

        // A patient is not a practitioner.
        assert!(matches!(
            book(&conn, &caller, booking(&patient)),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn booking_on_behalf_is_admin_only() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let other = seed_account(&conn, "Other", "other@example.com", Role::Patient);
        let admin = seed_account(&conn, "Admin", "admin@example.com", Role::Admin);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);

        let mut on_behalf = booking(&doc);
        on_behalf.account_id = Some(other.id);
        assert!(matches!(
            book(&conn, &caller_for(&patient), on_behalf.clone()),
            Err(ClinicError::Forbidden)
        ));

        let appt = book(&conn, &caller_for(&admin), on_behalf).unwrap();
        assert_eq!(appt.account_id, other.id);

        // Naming yourself explicitly is fine.
        let mut explicit_self = booking(&doc);
        explicit_self.account_id = Some(patient.id);
        assert!(book(&conn, &caller_for(&patient), explicit_self).is_ok());
    }

    #[test]
    fn update_allows_any_status_and_normalizes_time() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let caller = caller_for(&patient);
        let appt = book(&conn, &caller, booking(&doc)).unwrap();

        let cancelled = update(
            &conn,
            &caller,
            &appt.id,
            AppointmentUpdate {
                status: Some("cancelled".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let reopened = update(
            &conn,
            &caller,
            &appt.id,
            AppointmentUpdate {
                status: Some("confirmed".into()),
                time: Some("9:05".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(reopened.status, AppointmentStatus::Confirmed);
        assert_eq!(reopened.time, "09:05");
        assert_eq!(reopened.date, appt.date);
    }

    #[test]
    fn update_and_delete_missing_is_not_found() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let caller = caller_for(&patient);
        let missing = Uuid::new_v4();
        assert!(matches!(
            update(&conn, &caller, &missing, AppointmentUpdate::default()),
            Err(ClinicError::NotFound(_))
        ));
        assert!(matches!(delete(&conn, &caller, &missing), Err(ClinicError::NotFound(_))));
    }

    #[test]
    fn admin_update_requires_admin() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let admin = seed_account(&conn, "Admin", "admin@example.com", Role::Admin);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let appt = book(&conn, &caller_for(&patient), booking(&doc)).unwrap();
        let input = || AdminAppointmentUpdate {
            status: Some("missed".into()),
            date: Some("2025-07-03".into()),
        };

        assert!(matches!(
            admin_update(&conn, &caller_for(&patient), &appt.id, input()),
            Err(ClinicError::Forbidden)
        ));
        let updated = admin_update(&conn, &caller_for(&admin), &appt.id, input()).unwrap();
        assert_eq!(updated.status, AppointmentStatus::Missed);
        assert_eq!(updated.date.to_string(), "2025-07-03");
    }

    #[test]
    fn delete_leaves_other_appointments() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let caller = caller_for(&patient);
        let first = book(&conn, &caller, booking(&doc)).unwrap();
        let second = book(&conn, &caller, booking(&doc)).unwrap();

        delete(&conn, &caller, &first.id).unwrap();
        let remaining = list_for_account(&conn, &patient.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
        assert_eq!(list_for_practitioner(&conn, &doc.id).unwrap().len(), 1);
    }
}
