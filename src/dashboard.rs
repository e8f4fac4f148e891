//! Aggregated views for administrators and practitioners.
//!
//! Every figure is computed from the stored collections at call time.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::authorization::{CallerContext, Capability};
use crate::db;
use crate::error::ClinicError;
use crate::models::*;

pub const RECENT_ACCOUNTS_LIMIT: usize = 15;
pub const RECENT_APPOINTMENTS_LIMIT: usize = 10;

// ═══════════════════════════════════════════════════════════
// Admin dashboard
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub total_patients: i64,
    pub total_practitioners: i64,
    pub total_appointments: i64,
    pub total_reports: i64,
    /// Sum over payments with status `paid`.
    pub total_revenue: f64,
    /// Sum over payments with status `pending`.
    pub pending_revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub stats: AdminStats,
    pub recent_accounts: Vec<Account>,
    pub recent_appointments: Vec<AppointmentWithNames>,
}

pub fn admin_dashboard(conn: &Connection, caller: &CallerContext) -> Result<AdminDashboard, ClinicError> {
    caller.require(Capability::AdminDashboard)?;

    let stats = AdminStats {
        total_patients: db::count_accounts_by_role(conn, Role::Patient)?,
        total_practitioners: db::count_accounts_by_role(conn, Role::Practitioner)?,
        total_appointments: db::count_appointments(conn)?,
        total_reports: db::count_reports(conn)?,
        total_revenue: db::sum_payments_by_status(conn, PaymentStatus::Paid, None)?,
        pending_revenue: db::sum_payments_by_status(conn, PaymentStatus::Pending, None)?,
    };

    Ok(AdminDashboard {
        stats,
        recent_accounts: db::list_recent_accounts(conn, RECENT_ACCOUNTS_LIMIT)?,
        recent_appointments: db::list_recent_appointments(conn, RECENT_APPOINTMENTS_LIMIT)?,
    })
}

// ═══════════════════════════════════════════════════════════
// Practitioner dashboard
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct PractitionerStats {
    pub total_patients: usize,
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub upcoming_count: usize,
    pub past_count: usize,
    pub report_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PractitionerDashboard {
    pub practitioner: Account,
    pub stats: PractitionerStats,
    /// Appointments on or after today, soonest first.
    pub upcoming: Vec<AppointmentWithNames>,
    /// Appointments before today, most recent first.
    pub past: Vec<AppointmentWithNames>,
    pub patients: Vec<AccountSummary>,
    pub reports: Vec<ReportWithPractitioner>,
    /// Payments received, newest first.
    pub payments: Vec<PaymentWithParties>,
}

/// The calling practitioner's workspace, split around `today`.
pub fn practitioner_dashboard(
    conn: &Connection,
    caller: &CallerContext,
    today: NaiveDate,
) -> Result<PractitionerDashboard, ClinicError> {
    caller.require(Capability::PractitionerWorkspace)?;
    let practitioner = db::get_account(conn, &caller.account_id)?
        .ok_or_else(|| ClinicError::not_found("Practitioner not found"))?;

    let appointments = db::list_practitioner_appointments_with_names(conn, &practitioner.id)?;
    let (mut upcoming, past): (Vec<_>, Vec<_>) = appointments
        .into_iter()
        .partition(|a| a.appointment.date >= today);
    upcoming.reverse();

    let mut seen = HashSet::new();
    let mut patients = Vec::new();
    for appt in upcoming.iter().chain(past.iter()) {
        let account_id = appt.appointment.account_id;
        if seen.insert(account_id) {
            if let Some(account) = db::get_account(conn, &account_id)? {
                patients.push(AccountSummary::from(&account));
            }
        }
    }

    let reports = db::list_reports_by_practitioner(conn, &practitioner.id)?;
    let payments = db::list_payments_for_practitioner(conn, &practitioner.id)?;
    let stats = PractitionerStats {
        total_patients: patients.len(),
        total_revenue: db::sum_payments_by_status(conn, PaymentStatus::Paid, Some(&practitioner.id))?,
        pending_revenue: db::sum_payments_by_status(conn, PaymentStatus::Pending, Some(&practitioner.id))?,
        upcoming_count: upcoming.len(),
        past_count: past.len(),
        report_count: reports.len(),
    };

    Ok(PractitionerDashboard {
        practitioner,
        stats,
        upcoming,
        past,
        patients,
        reports,
        payments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{self, BookingInput};
    use crate::payment::{self, PaymentInput};
    use crate::test_support::*;
    use uuid::Uuid;

    fn book_on(conn: &Connection, patient: &Account, doc: &Account, date: &str) -> Appointment {
        appointment::book(
            conn,
            &caller_for(patient),
            BookingInput {
                practitioner_id: Some(doc.id),
                date: Some(date.into()),
                time: Some("09:00".into()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn pay(conn: &Connection, payer: &Account, practitioner: Option<Uuid>, amount: f64, status: &str) {
        payment::create(
            conn,
            &caller_for(payer),
            PaymentInput {
                practitioner_id: practitioner,
                amount: Some(amount),
                status: Some(status.into()),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn admin_only() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "P", "p@example.com", Role::Patient);
        assert!(matches!(
            admin_dashboard(&conn, &caller_for(&patient)),
            Err(ClinicError::Forbidden)
        ));
    }

    #[test]
    fn revenue_matches_independent_sum() {
        let conn = memory_conn();
        let admin = seed_account(&conn, "Admin", "admin@example.com", Role::Admin);
        let patient = seed_account(&conn, "P", "p@example.com", Role::Patient);
        let amounts = [
            (120.0, "paid"),
            (80.5, "paid"),
            (40.0, "pending"),
            (999.0, "refunded"),
            (15.25, "paid"),
            (60.0, "failed"),
            (10.0, "pending"),
        ];
        for (amount, status) in amounts {
            pay(&conn, &patient, None, amount, status);
        }

        let expected_paid: f64 = amounts.iter().filter(|(_, s)| *s == "paid").map(|(a, _)| a).sum();
        let expected_pending: f64 = amounts.iter().filter(|(_, s)| *s == "pending").map(|(a, _)| a).sum();

        let dashboard = admin_dashboard(&conn, &caller_for(&admin)).unwrap();
        assert!((dashboard.stats.total_revenue - expected_paid).abs() < 1e-9);
        assert!((dashboard.stats.pending_revenue - expected_pending).abs() < 1e-9);
        assert_eq!(dashboard.stats.total_patients, 1);
        assert_eq!(dashboard.stats.total_practitioners, 0);
    }

    #[test]
    fn recent_lists_are_capped() {
        let conn = memory_conn();
        let admin = seed_account(&conn, "Admin", "admin@example.com", Role::Admin);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        for i in 0..20 {
            let patient = seed_account(&conn, &format!("P{i}"), &format!("p{i}@example.com"), Role::Patient);
            book_on(&conn, &patient, &doc, &format!("2025-07-{:02}", i + 1));
        }

        let dashboard = admin_dashboard(&conn, &caller_for(&admin)).unwrap();
        assert_eq!(dashboard.recent_accounts.len(), RECENT_ACCOUNTS_LIMIT);
        assert_eq!(dashboard.recent_accounts[0].name, "P19");
        assert_eq!(dashboard.recent_appointments.len(), RECENT_APPOINTMENTS_LIMIT);
        assert_eq!(dashboard.recent_appointments[0].appointment.date.to_string(), "2025-07-20");
        assert_eq!(dashboard.recent_appointments[0].account_name.as_deref(), Some("P19"));
        assert_eq!(dashboard.recent_appointments[0].practitioner_name.as_deref(), Some("Dr. Rao"));
        assert_eq!(dashboard.stats.total_appointments, 20);
    }

    #[test]
    fn practitioner_dashboard_splits_around_today() {
        let conn = memory_conn();
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let riya = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let amit = seed_account(&conn, "Amit", "amit@example.com", Role::Patient);
        book_on(&conn, &riya, &doc, "2025-06-01");
        book_on(&conn, &riya, &doc, "2025-07-10");
        book_on(&conn, &amit, &doc, "2025-07-05");
        pay(&conn, &riya, Some(doc.id), 500.0, "paid");
        pay(&conn, &amit, Some(doc.id), 200.0, "pending");
        pay(&conn, &amit, None, 700.0, "paid");

        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let dashboard = practitioner_dashboard(&conn, &caller_for(&doc), today).unwrap();

        let upcoming: Vec<String> = dashboard
            .upcoming
            .iter()
            .map(|a| a.appointment.date.to_string())
            .collect();
        assert_eq!(upcoming, vec!["2025-07-05", "2025-07-10"]);
        assert_eq!(dashboard.stats.past_count, 1);
        assert_eq!(dashboard.stats.total_patients, 2);
        assert_eq!(dashboard.stats.total_revenue, 500.0);
        assert_eq!(dashboard.stats.pending_revenue, 200.0);
        assert_eq!(dashboard.upcoming[0].account_name.as_deref(), Some("Amit"));
        assert_eq!(dashboard.payments.len(), 2);
        assert!(dashboard
            .payments
            .iter()
            .all(|p| p.payment.practitioner_id == Some(doc.id)));
    }

    #[test]
    fn practitioner_dashboard_rejects_other_roles() {
        let conn = memory_conn();
        let admin = seed_account(&conn, "Admin", "admin@example.com", Role::Admin);
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert!(matches!(
            practitioner_dashboard(&conn, &caller_for(&admin), today),
            Err(ClinicError::Forbidden)
        ));
    }
}
