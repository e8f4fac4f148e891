use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const MESSAGE_COLUMNS: &str = "m.id, m.recipient_id, m.sender_id, m.subject, m.content,
     m.is_read, m.sent_at";

fn row_to_message(row: &rusqlite::Row) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: uuid_col(row, 0)?,
        recipient_id: uuid_col(row, 1)?,
        sender_id: uuid_col(row, 2)?,
        subject: row.get(3)?,
        content: row.get(4)?,
        is_read: row.get(5)?,
        sent_at: timestamp_col(row, 6)?,
    })
}

pub fn insert_message(conn: &Connection, message: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, recipient_id, sender_id, subject, content, is_read, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            message.id.to_string(),
            message.recipient_id.to_string(),
            message.sender_id.to_string(),
            message.subject,
            message.content,
            message.is_read,
            format_timestamp(&message.sent_at),
        ],
    )?;
    Ok(())
}

pub fn get_message(conn: &Connection, id: &Uuid) -> Result<Option<Message>, DatabaseError> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1");
    let message = conn
        .query_row(&sql, params![id.to_string()], row_to_message)
        .optional()?;
    Ok(message)
}

/// Messages received by an account, newest first, sender name resolved.
pub fn list_inbox(conn: &Connection, recipient_id: &Uuid) -> Result<Vec<MessageWithSender>, DatabaseError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS}, sender.name
         FROM messages m
         LEFT JOIN accounts sender ON sender.id = m.sender_id
         WHERE m.recipient_id = ?1
         ORDER BY m.sent_at DESC, m.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![recipient_id.to_string()], |row| {
        Ok(MessageWithSender {
            message: row_to_message(row)?,
            sender_name: row.get(7)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn mark_message_read(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE messages SET is_read = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(changed > 0)
}
