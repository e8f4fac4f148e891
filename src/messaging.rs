//! Practitioner and administrator messages to accounts.

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::{CallerContext, Capability};
use crate::db;
use crate::error::{required, ClinicError};
use crate::models::*;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageInput {
    pub recipient_id: Option<Uuid>,
    pub subject: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Inbox {
    pub unread: usize,
    pub messages: Vec<MessageWithSender>,
}

pub fn send(conn: &Connection, caller: &CallerContext, input: SendMessageInput) -> Result<Message, ClinicError> {
    caller.require(Capability::SendMessage)?;
    let recipient_id = input
        .recipient_id
        .ok_or_else(|| ClinicError::validation("recipient_id is required"))?;
    let subject = required(&input.subject, "subject")?.to_string();
    let content = required(&input.content, "content")?.to_string();

    if db::get_account(conn, &recipient_id)?.is_none() {
        return Err(ClinicError::not_found("Recipient not found"));
    }

    let message = Message {
        id: Uuid::new_v4(),
        recipient_id,
        sender_id: caller.account_id,
        subject,
        content,
        is_read: false,
        sent_at: Utc::now(),
    };
    db::insert_message(conn, &message)?;
    tracing::info!(message_id = %message.id, sender = %caller.account_id, "Message sent");
    Ok(message)
}

pub fn inbox(conn: &Connection, caller: &CallerContext) -> Result<Inbox, ClinicError> {
    let messages = db::list_inbox(conn, &caller.account_id)?;
    let unread = messages.iter().filter(|m| !m.message.is_read).count();
    Ok(Inbox { unread, messages })
}

/// Mark a message read. Only its recipient may do so.
pub fn mark_read(conn: &Connection, caller: &CallerContext, id: &Uuid) -> Result<Message, ClinicError> {
    let message = db::get_message(conn, id)?
        .ok_or_else(|| ClinicError::not_found("Message not found"))?;
    if message.recipient_id != caller.account_id {
        return Err(ClinicError::Forbidden);
    }
    db::mark_message_read(conn, id)?;
    Ok(Message {
        is_read: true,
        ..message
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn input(to: &Account) -> SendMessageInput {
        SendMessageInput {
            recipient_id: Some(to.id),
            subject: Some("Follow-up".into()),
            content: Some("Please book a follow-up next week.".into()),
        }
    }

    #[test]
    fn patients_cannot_send() {
        let conn = memory_conn();
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let other = seed_account(&conn, "Other", "other@example.com", Role::Patient);
        assert!(matches!(
            send(&conn, &caller_for(&patient), input(&other)),
            Err(ClinicError::Forbidden)
        ));
    }

    #[test]
    fn send_validates_recipient_and_fields() {
        let conn = memory_conn();
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let caller = caller_for(&doc);

        let mut no_subject = input(&patient);
        no_subject.subject = None;
        assert!(matches!(send(&conn, &caller, no_subject), Err(ClinicError::Validation(_))));

        let mut ghost = input(&patient);
        ghost.recipient_id = Some(Uuid::new_v4());
        assert!(matches!(send(&conn, &caller, ghost), Err(ClinicError::NotFound(_))));
    }

    #[test]
    fn inbox_counts_unread_and_mark_read_is_recipient_only() {
        let conn = memory_conn();
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);

        let first = send(&conn, &caller_for(&doc), input(&patient)).unwrap();
        send(&conn, &caller_for(&doc), input(&patient)).unwrap();

        let inbox_before = inbox(&conn, &caller_for(&patient)).unwrap();
        assert_eq!(inbox_before.unread, 2);
        assert_eq!(inbox_before.messages[0].sender_name.as_deref(), Some("Dr. Rao"));

        assert!(matches!(
            mark_read(&conn, &caller_for(&doc), &first.id),
            Err(ClinicError::Forbidden)
        ));
        assert!(mark_read(&conn, &caller_for(&patient), &first.id).unwrap().is_read);
        assert_eq!(inbox(&conn, &caller_for(&patient)).unwrap().unread, 1);
        assert!(inbox(&conn, &caller_for(&doc)).unwrap().messages.is_empty());
    }
}
