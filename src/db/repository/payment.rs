use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{enum_col, format_timestamp, opt_uuid_col, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const PAYMENT_COLUMNS: &str = "p.id, p.appointment_id, p.account_id, p.practitioner_id,
     p.amount, p.method, p.status, p.date, p.created_at";

fn row_to_payment(row: &rusqlite::Row) -> Result<Payment, rusqlite::Error> {
    Ok(Payment {
        id: uuid_col(row, 0)?,
        appointment_id: opt_uuid_col(row, 1)?,
        account_id: opt_uuid_col(row, 2)?,
        practitioner_id: opt_uuid_col(row, 3)?,
        amount: row.get(4)?,
        method: enum_col(row, 5)?,
        status: enum_col(row, 6)?,
        date: timestamp_col(row, 7)?,
        created_at: timestamp_col(row, 8)?,
    })
}

fn row_to_payment_with_parties(row: &rusqlite::Row) -> Result<PaymentWithParties, rusqlite::Error> {
    Ok(PaymentWithParties {
        payment: row_to_payment(row)?,
        account_name: row.get(9)?,
        practitioner_name: row.get(10)?,
        practitioner_specialization: row.get(11)?,
    })
}

pub fn insert_payment(conn: &Connection, payment: &Payment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO payments (id, appointment_id, account_id, practitioner_id, amount,
         method, status, date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            payment.id.to_string(),
            payment.appointment_id.map(|id| id.to_string()),
            payment.account_id.map(|id| id.to_string()),
            payment.practitioner_id.map(|id| id.to_string()),
            payment.amount,
            payment.method.as_str(),
            payment.status.as_str(),
            format_timestamp(&payment.date),
            format_timestamp(&payment.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_payment(conn: &Connection, id: &Uuid) -> Result<Option<Payment>, DatabaseError> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments p WHERE p.id = ?1");
    let payment = conn
        .query_row(&sql, params![id.to_string()], row_to_payment)
        .optional()?;
    Ok(payment)
}

const PARTIES_JOIN: &str = "LEFT JOIN accounts owner ON owner.id = p.account_id
     LEFT JOIN accounts prac ON prac.id = p.practitioner_id";

/// Payments made by an account, newest first, practitioner resolved.
pub fn list_payments_for_account(
    conn: &Connection,
    account_id: &Uuid,
) -> Result<Vec<PaymentWithParties>, DatabaseError> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}, owner.name, prac.name, prac.specialization
         FROM payments p {PARTIES_JOIN}
         WHERE p.account_id = ?1
         ORDER BY p.created_at DESC, p.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![account_id.to_string()], row_to_payment_with_parties)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Payments received by a practitioner, newest first.
pub fn list_payments_for_practitioner(
    conn: &Connection,
    practitioner_id: &Uuid,
) -> Result<Vec<PaymentWithParties>, DatabaseError> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}, owner.name, prac.name, prac.specialization
         FROM payments p {PARTIES_JOIN}
         WHERE p.practitioner_id = ?1
         ORDER BY p.created_at DESC, p.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![practitioner_id.to_string()], row_to_payment_with_parties)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Every payment, newest first, both parties resolved.
pub fn list_all_payments(conn: &Connection) -> Result<Vec<PaymentWithParties>, DatabaseError> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}, owner.name, prac.name, prac.specialization
         FROM payments p {PARTIES_JOIN}
         ORDER BY p.created_at DESC, p.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_payment_with_parties)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_payment(
    conn: &Connection,
    id: &Uuid,
    patch: &PaymentPatch,
) -> Result<Option<Payment>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE payments SET
            amount = COALESCE(?2, amount),
            method = COALESCE(?3, method),
            status = COALESCE(?4, status)
         WHERE id = ?1",
        params![
            id.to_string(),
            patch.amount,
            patch.method.map(|m| m.as_str()),
            patch.status.map(|s| s.as_str()),
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_payment(conn, id)
}

/// Sum of amounts over payments in one status, optionally for one practitioner.
pub fn sum_payments_by_status(
    conn: &Connection,
    status: PaymentStatus,
    practitioner_id: Option<&Uuid>,
) -> Result<f64, DatabaseError> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM payments
         WHERE status = ?1 AND (?2 IS NULL OR practitioner_id = ?2)",
        params![status.as_str(), practitioner_id.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn get_receipt_details(conn: &Connection, id: &Uuid) -> Result<Option<ReceiptDetails>, DatabaseError> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}, owner.name, owner.email, prac.name
         FROM payments p {PARTIES_JOIN}
         WHERE p.id = ?1"
    );
    let details = conn
        .query_row(&sql, params![id.to_string()], |row| {
            Ok(ReceiptDetails {
                payment: row_to_payment(row)?,
                account_name: row.get(9)?,
                account_email: row.get(10)?,
                practitioner_name: row.get(11)?,
            })
        })
        .optional()?;
    Ok(details)
}
