use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::{format_timestamp, is_unique_violation, json_col, timestamp_col, uuid_col, enum_col};
use crate::db::DatabaseError;
use crate::models::*;

const ACCOUNT_COLUMNS: &str = "id, name, email, role, specialization, fees, experience, bio,
     phone, address, photo, family_members, favorites, created_at";

fn row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: enum_col(row, 3)?,
        specialization: row.get(4)?,
        fees: row.get(5)?,
        experience: row.get(6)?,
        bio: row.get(7)?,
        profile: ContactProfile {
            phone: row.get(8)?,
            address: row.get(9)?,
            photo: row.get(10)?,
        },
        family_members: json_col(row, 11)?,
        favorites: json_col(row, 12)?,
        created_at: timestamp_col(row, 13)?,
    })
}

fn map_email_conflict(err: rusqlite::Error, email: &str) -> DatabaseError {
    if is_unique_violation(&err) {
        DatabaseError::Duplicate {
            entity_type: "account".into(),
            value: email.to_string(),
        }
    } else {
        err.into()
    }
}

/// Insert a new account. A taken email yields `DatabaseError::Duplicate` and
/// writes nothing.
pub fn insert_account(conn: &Connection, new: &NewAccount) -> Result<Account, DatabaseError> {
    let account = Account {
        id: Uuid::new_v4(),
        name: new.name.clone(),
        email: new.email.clone(),
        role: new.role,
        specialization: new.specialization.clone(),
        fees: new.fees,
        experience: new.experience,
        bio: None,
        profile: ContactProfile::default(),
        family_members: Vec::new(),
        favorites: Vec::new(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO accounts (id, name, email, password_hash, role, specialization, fees,
         experience, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            account.id.to_string(),
            account.name,
            account.email,
            new.password_hash,
            account.role.as_str(),
            account.specialization,
            account.fees,
            account.experience,
            format_timestamp(&account.created_at),
        ],
    )
    .map_err(|e| map_email_conflict(e, &new.email))?;

    Ok(account)
}

pub fn get_account(conn: &Connection, id: &Uuid) -> Result<Option<Account>, DatabaseError> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
    let account = conn
        .query_row(&sql, params![id.to_string()], row_to_account)
        .optional()?;
    Ok(account)
}

/// Account plus its stored password hash, looked up by (lower-cased) email.
pub fn get_credentials_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<(Account, String)>, DatabaseError> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE email = ?1");
    let found = conn
        .query_row(&sql, params![email], |row| {
            Ok((row_to_account(row)?, row.get::<_, String>(14)?))
        })
        .optional()?;
    Ok(found)
}

pub fn get_account_by_email(conn: &Connection, email: &str) -> Result<Option<Account>, DatabaseError> {
    Ok(get_credentials_by_email(conn, email)?.map(|(account, _)| account))
}

/// All accounts, optionally restricted to one role, oldest first.
pub fn list_accounts(conn: &Connection, role: Option<Role>) -> Result<Vec<Account>, DatabaseError> {
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY created_at ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![role.map(|r| r.as_str())], row_to_account)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_recent_accounts(conn: &Connection, limit: usize) -> Result<Vec<Account>, DatabaseError> {
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts
         ORDER BY created_at DESC, rowid DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64], row_to_account)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_accounts_by_role(conn: &Connection, role: Role) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE role = ?1",
        params![role.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Apply a partial profile update. Returns the updated account, or `None`
/// when no account has this id.
pub fn update_account(
    conn: &Connection,
    id: &Uuid,
    patch: &AccountPatch,
) -> Result<Option<Account>, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE accounts SET
                name = COALESCE(?2, name),
                email = COALESCE(?3, email),
                specialization = COALESCE(?4, specialization),
                fees = COALESCE(?5, fees),
                experience = COALESCE(?6, experience),
                bio = COALESCE(?7, bio),
                phone = COALESCE(?8, phone),
                address = COALESCE(?9, address),
                photo = COALESCE(?10, photo)
             WHERE id = ?1",
            params![
                id.to_string(),
                patch.name,
                patch.email,
                patch.specialization,
                patch.fees,
                patch.experience,
                patch.bio,
                patch.phone,
                patch.address,
                patch.photo,
            ],
        )
        .map_err(|e| map_email_conflict(e, patch.email.as_deref().unwrap_or_default()))?;

    if changed == 0 {
        return Ok(None);
    }
    get_account(conn, id)
}

pub fn update_role(conn: &Connection, id: &Uuid, role: Role) -> Result<Option<Account>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE accounts SET role = ?2 WHERE id = ?1",
        params![id.to_string(), role.as_str()],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_account(conn, id)
}

/// Hard delete. Appointments, payments, reports and messages referencing the
/// account are left untouched.
pub fn delete_account(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM accounts WHERE id = ?1", params![id.to_string()])?;
    Ok(changed > 0)
}

pub fn set_reset_token(
    conn: &Connection,
    id: &Uuid,
    token_hash: &str,
    expires_at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE accounts SET reset_token_hash = ?2, reset_token_expires_at = ?3 WHERE id = ?1",
        params![id.to_string(), token_hash, format_timestamp(expires_at)],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "account".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Replace the password of the account holding an unexpired reset token with
/// this hash, clearing the token in the same statement. Returns `false` when
/// no such token exists, so a token can succeed at most once.
pub fn consume_reset_token(
    conn: &Connection,
    token_hash: &str,
    new_password_hash: &str,
    now: &DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE accounts SET
            password_hash = ?2,
            reset_token_hash = NULL,
            reset_token_expires_at = NULL
         WHERE reset_token_hash = ?1 AND reset_token_expires_at > ?3",
        params![token_hash, new_password_hash, format_timestamp(now)],
    )?;
    Ok(changed > 0)
}

fn load_json_list<T: serde::de::DeserializeOwned>(
    conn: &Connection,
    id: &Uuid,
    column: &str,
) -> Result<Option<Vec<T>>, DatabaseError> {
    let sql = format!("SELECT {column} FROM accounts WHERE id = ?1");
    let list = conn
        .query_row(&sql, params![id.to_string()], |row| json_col(row, 0))
        .optional()?;
    Ok(list)
}

fn store_json_list<T: serde::Serialize>(
    conn: &Connection,
    id: &Uuid,
    column: &str,
    list: &[T],
) -> Result<(), DatabaseError> {
    let sql = format!("UPDATE accounts SET {column} = ?2 WHERE id = ?1");
    conn.execute(&sql, params![id.to_string(), serde_json::to_string(list)?])?;
    Ok(())
}

/// Read-modify-write of one JSON list column inside an IMMEDIATE transaction.
/// Returns `None` when the account does not exist.
fn modify_json_list<T, F>(
    conn: &mut Connection,
    id: &Uuid,
    column: &str,
    modify: F,
) -> Result<Option<Vec<T>>, DatabaseError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
    F: FnOnce(&mut Vec<T>),
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let Some(mut list) = load_json_list::<T>(&tx, id, column)? else {
        return Ok(None);
    };
    modify(&mut list);
    store_json_list(&tx, id, column, &list)?;
    tx.commit()?;
    Ok(Some(list))
}

pub fn append_family_member(
    conn: &mut Connection,
    id: &Uuid,
    member: FamilyMember,
) -> Result<Option<Vec<FamilyMember>>, DatabaseError> {
    modify_json_list(conn, id, "family_members", |list| list.push(member))
}

/// Add a practitioner to an account's favorites. Adding an id already present
/// leaves the list unchanged.
pub fn add_favorite(
    conn: &mut Connection,
    id: &Uuid,
    practitioner_id: Uuid,
) -> Result<Option<Vec<Uuid>>, DatabaseError> {
    modify_json_list(conn, id, "favorites", |list| {
        if !list.contains(&practitioner_id) {
            list.push(practitioner_id);
        }
    })
}

pub fn remove_favorite(
    conn: &mut Connection,
    id: &Uuid,
    practitioner_id: Uuid,
) -> Result<Option<Vec<Uuid>>, DatabaseError> {
    modify_json_list(conn, id, "favorites", |list| {
        list.retain(|fav| *fav != practitioner_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn new_account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
            specialization: None,
            fees: None,
            experience: None,
        }
    }

    #[test]
    fn insert_and_get() {
        let conn = open_memory_database().unwrap();
        let created = insert_account(&conn, &new_account("a@example.com", Role::Patient)).unwrap();
        let fetched = get_account(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.email, "a@example.com");
        assert_eq!(fetched.role, Role::Patient);
        assert!(fetched.family_members.is_empty());
        assert!(fetched.favorites.is_empty());
    }

    #[test]
    fn duplicate_email_rejected() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &new_account("dup@example.com", Role::Patient)).unwrap();
        let err = insert_account(&conn, &new_account("dup@example.com", Role::Admin)).unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { .. }));
        assert_eq!(list_accounts(&conn, None).unwrap().len(), 1);
    }

    #[test]
    fn credentials_include_hash() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &new_account("c@example.com", Role::Patient)).unwrap();
        let (account, hash) = get_credentials_by_email(&conn, "c@example.com").unwrap().unwrap();
        assert_eq!(account.email, "c@example.com");
        assert_eq!(hash, "hash");
        assert!(get_credentials_by_email(&conn, "missing@example.com").unwrap().is_none());
    }

    #[test]
    fn list_filters_by_role() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &new_account("p@example.com", Role::Patient)).unwrap();
        insert_account(&conn, &new_account("d@example.com", Role::Practitioner)).unwrap();
        let practitioners = list_accounts(&conn, Some(Role::Practitioner)).unwrap();
        assert_eq!(practitioners.len(), 1);
        assert_eq!(practitioners[0].email, "d@example.com");
        assert_eq!(count_accounts_by_role(&conn, Role::Patient).unwrap(), 1);
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let conn = open_memory_database().unwrap();
        let mut new = new_account("e@example.com", Role::Practitioner);
        new.specialization = Some("Cardiology".into());
        let created = insert_account(&conn, &new).unwrap();

        let patch = AccountPatch {
            bio: Some("20 years".into()),
            phone: Some("555".into()),
            ..Default::default()
        };
        let updated = update_account(&conn, &created.id, &patch).unwrap().unwrap();
        assert_eq!(updated.specialization.as_deref(), Some("Cardiology"));
        assert_eq!(updated.bio.as_deref(), Some("20 years"));
        assert_eq!(updated.profile.phone.as_deref(), Some("555"));

        assert!(update_account(&conn, &Uuid::new_v4(), &patch).unwrap().is_none());
    }

    #[test]
    fn patch_to_taken_email_is_duplicate() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &new_account("x@example.com", Role::Patient)).unwrap();
        let other = insert_account(&conn, &new_account("y@example.com", Role::Patient)).unwrap();
        let patch = AccountPatch {
            email: Some("x@example.com".into()),
            ..Default::default()
        };
        let err = update_account(&conn, &other.id, &patch).unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { .. }));
    }

    #[test]
    fn reset_token_consumed_once() {
        let conn = open_memory_database().unwrap();
        let account = insert_account(&conn, &new_account("r@example.com", Role::Patient)).unwrap();
        let now = Utc::now();
        set_reset_token(&conn, &account.id, "tokhash", &(now + chrono::Duration::minutes(15)))
            .unwrap();

        assert!(consume_reset_token(&conn, "tokhash", "newhash", &now).unwrap());
        assert!(!consume_reset_token(&conn, "tokhash", "other", &now).unwrap());

        let (_, hash) = get_credentials_by_email(&conn, "r@example.com").unwrap().unwrap();
        assert_eq!(hash, "newhash");
    }

    #[test]
    fn expired_reset_token_not_consumed() {
        let conn = open_memory_database().unwrap();
        let account = insert_account(&conn, &new_account("t@example.com", Role::Patient)).unwrap();
        let now = Utc::now();
        set_reset_token(&conn, &account.id, "tokhash", &(now - chrono::Duration::seconds(1)))
            .unwrap();
        assert!(!consume_reset_token(&conn, "tokhash", "newhash", &now).unwrap());
    }

    #[test]
    fn favorites_are_a_set() {
        let mut conn = open_memory_database().unwrap();
        let account = insert_account(&conn, &new_account("f@example.com", Role::Patient)).unwrap();
        let doc = Uuid::new_v4();

        add_favorite(&mut conn, &account.id, doc).unwrap();
        let favorites = add_favorite(&mut conn, &account.id, doc).unwrap().unwrap();
        assert_eq!(favorites, vec![doc]);

        let favorites = remove_favorite(&mut conn, &account.id, doc).unwrap().unwrap();
        assert!(favorites.is_empty());
        assert!(add_favorite(&mut conn, &Uuid::new_v4(), doc).unwrap().is_none());
    }

    #[test]
    fn family_members_append() {
        let mut conn = open_memory_database().unwrap();
        let account = insert_account(&conn, &new_account("m@example.com", Role::Patient)).unwrap();
        let member = FamilyMember {
            name: "Asha".into(),
            relation: "daughter".into(),
            age: 9,
        };
        append_family_member(&mut conn, &account.id, member.clone()).unwrap();
        let members = append_family_member(&mut conn, &account.id, member.clone())
            .unwrap()
            .unwrap();
        assert_eq!(members, vec![member.clone(), member]);
    }

    #[test]
    fn delete_reports_presence() {
        let conn = open_memory_database().unwrap();
        let account = insert_account(&conn, &new_account("g@example.com", Role::Patient)).unwrap();
        assert!(delete_account(&conn, &account.id).unwrap());
        assert!(!delete_account(&conn, &account.id).unwrap());
        assert!(get_account(&conn, &account.id).unwrap().is_none());
    }
}
