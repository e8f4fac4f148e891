use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{date_col, enum_col, format_timestamp, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "a.id, a.account_id, a.practitioner_id, a.date, a.time,
     a.appointment_type, a.status, a.notes, a.created_at";

fn row_to_appointment(row: &rusqlite::Row) -> Result<Appointment, rusqlite::Error> {
    Ok(Appointment {
        id: uuid_col(row, 0)?,
        account_id: uuid_col(row, 1)?,
        practitioner_id: uuid_col(row, 2)?,
        date: date_col(row, 3)?,
        time: row.get(4)?,
        appointment_type: enum_col(row, 5)?,
        status: enum_col(row, 6)?,
        notes: row.get(7)?,
        created_at: timestamp_col(row, 8)?,
    })
}

fn row_to_appointment_with_names(row: &rusqlite::Row) -> Result<AppointmentWithNames, rusqlite::Error> {
    Ok(AppointmentWithNames {
        appointment: row_to_appointment(row)?,
        account_name: row.get(9)?,
        practitioner_name: row.get(10)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, account_id, practitioner_id, date, time,
         appointment_type, status, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id.to_string(),
            appt.account_id.to_string(),
            appt.practitioner_id.to_string(),
            appt.date.to_string(),
            appt.time,
            appt.appointment_type.as_str(),
            appt.status.as_str(),
            appt.notes,
            format_timestamp(&appt.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    let appt = conn
        .query_row(&sql, params![id.to_string()], row_to_appointment)
        .optional()?;
    Ok(appt)
}

fn list_where(conn: &Connection, column: &str, id: &Uuid) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments a
         WHERE a.{column} = ?1
         ORDER BY a.date DESC, a.time DESC, a.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id.to_string()], row_to_appointment)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Appointments owned by an account, latest date and time first.
pub fn list_appointments_for_account(
    conn: &Connection,
    account_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_where(conn, "account_id", account_id)
}

/// Appointments with a practitioner, latest date and time first.
pub fn list_appointments_for_practitioner(
    conn: &Connection,
    practitioner_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_where(conn, "practitioner_id", practitioner_id)
}

/// A practitioner's appointments with both names resolved.
pub fn list_practitioner_appointments_with_names(
    conn: &Connection,
    practitioner_id: &Uuid,
) -> Result<Vec<AppointmentWithNames>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, owner.name, prac.name
         FROM appointments a
         LEFT JOIN accounts owner ON owner.id = a.account_id
         LEFT JOIN accounts prac ON prac.id = a.practitioner_id
         WHERE a.practitioner_id = ?1
         ORDER BY a.date DESC, a.time DESC, a.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![practitioner_id.to_string()], row_to_appointment_with_names)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Most recent appointments by date, with both names resolved.
pub fn list_recent_appointments(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<AppointmentWithNames>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, owner.name, prac.name
         FROM appointments a
         LEFT JOIN accounts owner ON owner.id = a.account_id
         LEFT JOIN accounts prac ON prac.id = a.practitioner_id
         ORDER BY a.date DESC, a.time DESC, a.rowid DESC
         LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64], row_to_appointment_with_names)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_appointments(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
    Ok(count)
}

/// Partial update. Any status may replace any other.
pub fn update_appointment(
    conn: &Connection,
    id: &Uuid,
    patch: &AppointmentPatch,
) -> Result<Option<Appointment>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET
            practitioner_id = COALESCE(?2, practitioner_id),
            date = COALESCE(?3, date),
            time = COALESCE(?4, time),
            appointment_type = COALESCE(?5, appointment_type),
            status = COALESCE(?6, status),
            notes = COALESCE(?7, notes)
         WHERE id = ?1",
        params![
            id.to_string(),
            patch.practitioner_id.map(|p| p.to_string()),
            patch.date.map(|d| d.to_string()),
            patch.time,
            patch.appointment_type.map(|t| t.as_str()),
            patch.status.map(|s| s.as_str()),
            patch.notes,
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_appointment(conn, id)
}

pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id.to_string()])?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{NaiveDate, Utc};

    fn appointment(account: Uuid, practitioner: Uuid, date: &str, time: &str) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            account_id: account,
            practitioner_id: practitioner,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: time.into(),
            appointment_type: AppointmentType::default(),
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get() {
        let conn = open_memory_database().unwrap();
        let appt = appointment(Uuid::new_v4(), Uuid::new_v4(), "2025-07-01", "10:30");
        insert_appointment(&conn, &appt).unwrap();
        let fetched = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(fetched.time, "10:30");
        assert_eq!(fetched.appointment_type, AppointmentType::Online);
        assert_eq!(fetched.status, AppointmentStatus::Pending);
    }

    #[test]
    fn account_list_orders_by_date_then_time_descending() {
        let conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let doc = Uuid::new_v4();
        for (date, time) in [
            ("2025-07-01", "09:00"),
            ("2025-07-02", "08:00"),
            ("2025-07-01", "17:00"),
        ] {
            insert_appointment(&conn, &appointment(owner, doc, date, time)).unwrap();
        }
        insert_appointment(&conn, &appointment(Uuid::new_v4(), doc, "2025-08-01", "08:00")).unwrap();

        let listed: Vec<(String, String)> = list_appointments_for_account(&conn, &owner)
            .unwrap()
            .into_iter()
            .map(|a| (a.date.to_string(), a.time))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("2025-07-02".to_string(), "08:00".to_string()),
                ("2025-07-01".to_string(), "17:00".to_string()),
                ("2025-07-01".to_string(), "09:00".to_string()),
            ]
        );
        assert_eq!(list_appointments_for_practitioner(&conn, &doc).unwrap().len(), 4);
    }

    #[test]
    fn any_status_transition_allowed() {
        let conn = open_memory_database().unwrap();
        let appt = appointment(Uuid::new_v4(), Uuid::new_v4(), "2025-07-01", "10:00");
        insert_appointment(&conn, &appt).unwrap();

        for status in [
            AppointmentStatus::Cancelled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Missed,
            AppointmentStatus::Pending,
        ] {
            let patch = AppointmentPatch {
                status: Some(status),
                ..Default::default()
            };
            let updated = update_appointment(&conn, &appt.id, &patch).unwrap().unwrap();
            assert_eq!(updated.status, status);
            assert_eq!(updated.time, "10:00");
        }
    }

    #[test]
    fn recent_appointments_resolve_missing_names_to_none() {
        let conn = open_memory_database().unwrap();
        let appt = appointment(Uuid::new_v4(), Uuid::new_v4(), "2025-07-01", "10:00");
        insert_appointment(&conn, &appt).unwrap();
        let recent = list_recent_appointments(&conn, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert!(recent[0].account_name.is_none());
        assert!(recent[0].practitioner_name.is_none());
    }

    #[test]
    fn delete_missing_returns_false() {
        let conn = open_memory_database().unwrap();
        assert!(!delete_appointment(&conn, &Uuid::new_v4()).unwrap());
        assert_eq!(count_appointments(&conn).unwrap(), 0);
    }
}
