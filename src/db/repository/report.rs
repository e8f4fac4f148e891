use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, json_col, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const REPORT_COLUMNS: &str = "r.id, r.account_id, r.practitioner_id, r.appointment_id,
     r.diagnosis, r.notes, r.booked, r.last_visit, r.measurements, r.medications,
     r.document_link, r.created_at";

fn row_to_report(row: &rusqlite::Row) -> Result<Report, rusqlite::Error> {
    Ok(Report {
        id: uuid_col(row, 0)?,
        account_id: uuid_col(row, 1)?,
        practitioner_id: uuid_col(row, 2)?,
        appointment_id: uuid_col(row, 3)?,
        diagnosis: row.get(4)?,
        notes: row.get(5)?,
        booked: row.get(6)?,
        last_visit: row.get(7)?,
        measurements: json_col(row, 8)?,
        medications: json_col(row, 9)?,
        document_link: row.get(10)?,
        created_at: timestamp_col(row, 11)?,
    })
}

fn row_to_report_with_practitioner(
    row: &rusqlite::Row,
) -> Result<ReportWithPractitioner, rusqlite::Error> {
    Ok(ReportWithPractitioner {
        report: row_to_report(row)?,
        practitioner_name: row.get(12)?,
    })
}

pub fn insert_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reports (id, account_id, practitioner_id, appointment_id, diagnosis,
         notes, booked, last_visit, measurements, medications, document_link, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            report.id.to_string(),
            report.account_id.to_string(),
            report.practitioner_id.to_string(),
            report.appointment_id.to_string(),
            report.diagnosis,
            report.notes,
            report.booked,
            report.last_visit,
            serde_json::to_string(&report.measurements)?,
            serde_json::to_string(&report.medications)?,
            report.document_link,
            format_timestamp(&report.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM reports r WHERE r.id = ?1");
    let report = conn
        .query_row(&sql, params![id.to_string()], row_to_report)
        .optional()?;
    Ok(report)
}

fn list_with_practitioner(
    conn: &Connection,
    column: &str,
    id: &Uuid,
) -> Result<Vec<ReportWithPractitioner>, DatabaseError> {
    let sql = format!(
        "SELECT {REPORT_COLUMNS}, prac.name
         FROM reports r
         LEFT JOIN accounts prac ON prac.id = r.practitioner_id
         WHERE r.{column} = ?1
         ORDER BY r.created_at DESC, r.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id.to_string()], row_to_report_with_practitioner)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Reports about an account, newest first, authoring practitioner resolved.
pub fn list_reports_for_account(
    conn: &Connection,
    account_id: &Uuid,
) -> Result<Vec<ReportWithPractitioner>, DatabaseError> {
    list_with_practitioner(conn, "account_id", account_id)
}

/// Reports authored by a practitioner, newest first.
pub fn list_reports_by_practitioner(
    conn: &Connection,
    practitioner_id: &Uuid,
) -> Result<Vec<ReportWithPractitioner>, DatabaseError> {
    list_with_practitioner(conn, "practitioner_id", practitioner_id)
}

pub fn count_reports(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
    Ok(count)
}

pub fn set_document_link(conn: &Connection, id: &Uuid, link: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE reports SET document_link = ?2 WHERE id = ?1",
        params![id.to_string(), link],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
