//! Account service: registration, credentials, profiles and per-account
//! lists (family members, favorite practitioners).

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::{CallerContext, Capability};
use crate::config::RESET_TOKEN_LIFETIME_MINUTES;
use crate::crypto::{self, CryptoError, TokenService};
use crate::db::{self, DatabaseError};
use crate::error::{parse_choice, required, ClinicError};
use crate::models::*;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

// ═══════════════════════════════════════════════════════════
// Inputs and outputs
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub specialization: Option<String>,
    pub fees: Option<f64>,
    pub experience: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub account: AccountSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordInput {
    pub email: Option<String>,
}

/// A freshly issued reset token. Only its hash is stored.
#[derive(Debug, Clone, Serialize)]
pub struct ResetTicket {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordInput {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactProfileInput {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
}

/// Editable profile fields. Contact details may be sent nested under
/// `profile` or flat; the nested form wins. Unknown keys, including any
/// `password`, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
    pub fees: Option<f64>,
    pub experience: Option<i64>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
    pub profile: Option<ContactProfileInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FamilyMemberInput {
    pub name: Option<String>,
    pub relation: Option<String>,
    pub age: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FavoriteInput {
    pub practitioner_id: Option<Uuid>,
}

// ═══════════════════════════════════════════════════════════
// Validation helpers
// ═══════════════════════════════════════════════════════════

fn normalize_email(raw: &str) -> Result<String, ClinicError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(ClinicError::validation("Invalid email address"));
    }
    Ok(email)
}

fn check_practice_fields(fees: Option<f64>, experience: Option<i64>) -> Result<(), ClinicError> {
    if fees.is_some_and(|f| !f.is_finite() || f < 0.0) {
        return Err(ClinicError::validation("fees must be a non-negative number"));
    }
    if experience.is_some_and(|e| e < 0) {
        return Err(ClinicError::validation("experience must be non-negative"));
    }
    Ok(())
}

fn email_conflict(err: DatabaseError) -> ClinicError {
    match err {
        DatabaseError::Duplicate { .. } => ClinicError::Conflict("Email already registered".into()),
        other => other.into(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ═══════════════════════════════════════════════════════════
// Credentials
// ═══════════════════════════════════════════════════════════

/// Create an account. Fails with `Conflict` if the email is already taken,
/// in which case nothing is written.
pub fn register(conn: &Connection, input: RegisterInput, rounds: u32) -> Result<Account, ClinicError> {
    let (name, email, password) = match (
        required(&input.name, "name"),
        required(&input.email, "email"),
        input.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Ok(name), Ok(email), Some(password)) => (name.to_string(), email, password),
        _ => return Err(ClinicError::validation("Missing fields")),
    };
    let email = normalize_email(email)?;
    let role = match input.role.as_deref() {
        Some(raw) => parse_choice::<Role>(raw, "role")?,
        None => Role::Patient,
    };
    check_practice_fields(input.fees, input.experience)?;

    let new = NewAccount {
        name,
        email,
        password_hash: crypto::hash_password(password, rounds)?,
        role,
        specialization: non_blank(input.specialization),
        fees: input.fees,
        experience: input.experience,
    };
    let account = db::insert_account(conn, &new).map_err(email_conflict)?;
    tracing::info!(account_id = %account.id, role = %account.role, "Account registered");
    Ok(account)
}

/// Exchange email and password for a bearer token. Unknown email and wrong
/// password produce the same `InvalidCredentials` error after the same
/// amount of hashing work (`rounds` applies to the unknown-email path).
pub fn login(
    conn: &Connection,
    tokens: &TokenService,
    input: LoginInput,
    rounds: u32,
) -> Result<LoginOutcome, ClinicError> {
    let (email, password) = match (required(&input.email, "email"), input.password.as_deref()) {
        (Ok(email), Some(password)) if !password.is_empty() => (email.to_lowercase(), password),
        _ => return Err(ClinicError::validation("Missing credentials")),
    };

    let Some((account, stored_hash)) = db::get_credentials_by_email(conn, &email)? else {
        crypto::verify_absent_password(password, rounds)?;
        return Err(ClinicError::InvalidCredentials);
    };

    match crypto::verify_password(password, &stored_hash) {
        Ok(true) => {}
        Ok(false) => return Err(ClinicError::InvalidCredentials),
        Err(CryptoError::MalformedHash) => {
            tracing::error!(account_id = %account.id, "Stored password hash is malformed");
            return Err(ClinicError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    }

    let token = tokens.issue(account.id, account.role)?;
    tracing::info!(account_id = %account.id, "Login succeeded");
    Ok(LoginOutcome {
        token,
        account: AccountSummary::from(&account),
    })
}

/// Issue a single-use reset token valid for 15 minutes. A later request
/// replaces any earlier token.
pub fn forgot_password(conn: &Connection, input: ForgotPasswordInput) -> Result<ResetTicket, ClinicError> {
    let email = required(&input.email, "email")
        .map_err(|_| ClinicError::validation("Email required"))?
        .to_lowercase();
    let account = db::get_account_by_email(conn, &email)?
        .ok_or_else(|| ClinicError::validation("No account found for this email"))?;

    let token = crypto::generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_LIFETIME_MINUTES);
    db::set_reset_token(conn, &account.id, &crypto::hash_reset_token(&token), &expires_at)?;
    tracing::info!(account_id = %account.id, "Password reset token issued");

    Ok(ResetTicket { token, expires_at })
}

/// Replace the password of the account holding this reset token. The token
/// is cleared on success.
pub fn reset_password(conn: &Connection, input: ResetPasswordInput, rounds: u32) -> Result<(), ClinicError> {
    let (token, password) = match (required(&input.token, "token"), input.password.as_deref()) {
        (Ok(token), Some(password)) if !password.is_empty() => (token, password),
        _ => return Err(ClinicError::validation("Token and password required")),
    };

    let new_hash = crypto::hash_password(password, rounds)?;
    let consumed = db::consume_reset_token(conn, &crypto::hash_reset_token(token), &new_hash, &Utc::now())?;
    if !consumed {
        return Err(ClinicError::InvalidResetToken);
    }
    tracing::info!("Password reset completed");
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Profiles
// ═══════════════════════════════════════════════════════════

pub fn get_account(conn: &Connection, id: &Uuid) -> Result<Account, ClinicError> {
    db::get_account(conn, id)?.ok_or_else(|| ClinicError::not_found("User not found"))
}

/// Apply a partial profile update for the account itself or an administrator.
pub fn update_profile(
    conn: &Connection,
    caller: &CallerContext,
    id: &Uuid,
    update: ProfileUpdate,
) -> Result<Account, ClinicError> {
    caller.require_account_access(id)?;
    check_practice_fields(update.fees, update.experience)?;

    let email = match update.email.as_deref() {
        Some(raw) => Some(normalize_email(raw)?),
        None => None,
    };
    let name = match update.name {
        Some(name) if name.trim().is_empty() => {
            return Err(ClinicError::validation("name cannot be blank"))
        }
        other => other.map(|n| n.trim().to_string()),
    };
    let nested = update.profile.unwrap_or_default();

    let patch = AccountPatch {
        name,
        email,
        specialization: update.specialization,
        fees: update.fees,
        experience: update.experience,
        bio: update.bio,
        phone: nested.phone.or(update.phone),
        address: nested.address.or(update.address),
        photo: nested.photo.or(update.photo),
    };

    if patch.is_empty() {
        return get_account(conn, id);
    }

    let account = db::update_account(conn, id, &patch)
        .map_err(email_conflict)?
        .ok_or_else(|| ClinicError::not_found("User not found"))?;
    tracing::info!(account_id = %id, editor = %caller.account_id, "Profile updated");
    Ok(account)
}

pub fn list_accounts(
    conn: &Connection,
    caller: &CallerContext,
    role: Option<&str>,
) -> Result<Vec<Account>, ClinicError> {
    caller.require(Capability::ReadDirectory)?;
    let role = role.map(|r| parse_choice::<Role>(r, "role")).transpose()?;
    Ok(db::list_accounts(conn, role)?)
}

/// Hard-delete an account. Records referencing it elsewhere are kept.
pub fn delete_account(conn: &Connection, caller: &CallerContext, id: &Uuid) -> Result<(), ClinicError> {
    caller.require(Capability::ManageAnyAccount)?;
    if !db::delete_account(conn, id)? {
        return Err(ClinicError::not_found("User not found"));
    }
    tracing::info!(account_id = %id, admin = %caller.account_id, "Account deleted");
    Ok(())
}

pub fn change_role(
    conn: &Connection,
    caller: &CallerContext,
    id: &Uuid,
    role: Option<&str>,
) -> Result<Account, ClinicError> {
    caller.require(Capability::ManageAnyAccount)?;
    let role = role
        .ok_or_else(|| ClinicError::validation("Invalid role specified"))
        .and_then(|r| parse_choice::<Role>(r, "role"))
        .map_err(|_| ClinicError::validation("Invalid role specified"))?;

    let account = db::update_role(conn, id, role)?
        .ok_or_else(|| ClinicError::not_found("User not found"))?;
    tracing::info!(account_id = %id, role = %role, admin = %caller.account_id, "Role changed");
    Ok(account)
}

// ═══════════════════════════════════════════════════════════
// Family members and favorites
// ═══════════════════════════════════════════════════════════

pub fn add_family_member(
    conn: &mut Connection,
    caller: &CallerContext,
    id: &Uuid,
    input: FamilyMemberInput,
) -> Result<Vec<FamilyMember>, ClinicError> {
    let member = match (
        required(&input.name, "name"),
        required(&input.relation, "relation"),
        input.age,
    ) {
        (Ok(name), Ok(relation), Some(age)) => FamilyMember {
            name: name.to_string(),
            relation: relation.to_string(),
            age: u32::try_from(age).map_err(|_| ClinicError::validation("age must be non-negative"))?,
        },
        _ => {
            return Err(ClinicError::validation(
                "Missing required fields: name, relation, age",
            ))
        }
    };
    caller.require_account_access(id)?;

    db::append_family_member(conn, id, member)?
        .ok_or_else(|| ClinicError::not_found("User not found"))
}

/// Resolve an account's favorites to practitioner cards, skipping ids that
/// no longer name a practitioner.
pub fn list_favorites(conn: &Connection, id: &Uuid) -> Result<Vec<PractitionerCard>, ClinicError> {
    let account = get_account(conn, id)?;
    let mut cards = Vec::with_capacity(account.favorites.len());
    for practitioner_id in &account.favorites {
        if let Some(practitioner) = db::get_account(conn, practitioner_id)? {
            if practitioner.is_practitioner() {
                cards.push(PractitionerCard::from(practitioner));
            }
        }
    }
    Ok(cards)
}

fn favorite_target(input: FavoriteInput) -> Result<Uuid, ClinicError> {
    input
        .practitioner_id
        .ok_or_else(|| ClinicError::validation("practitioner_id is required"))
}

/// Add a favorite. Adding one already present changes nothing.
pub fn add_favorite(
    conn: &mut Connection,
    caller: &CallerContext,
    id: &Uuid,
    input: FavoriteInput,
) -> Result<Vec<Uuid>, ClinicError> {
    let practitioner_id = favorite_target(input)?;
    caller.require_account_access(id)?;
    match db::get_account(conn, &practitioner_id)? {
        Some(p) if p.is_practitioner() => {}
        _ => return Err(ClinicError::not_found("Practitioner not found")),
    }
    db::add_favorite(conn, id, practitioner_id)?.ok_or_else(|| ClinicError::not_found("User not found"))
}

pub fn remove_favorite(
    conn: &mut Connection,
    caller: &CallerContext,
    id: &Uuid,
    input: FavoriteInput,
) -> Result<Vec<Uuid>, ClinicError> {
    let practitioner_id = favorite_target(input)?;
    caller.require_account_access(id)?;
    db::remove_favorite(conn, id, practitioner_id)?.ok_or_else(|| ClinicError::not_found("User not found"))
}

// ═══════════════════════════════════════════════════════════
// Public practitioner directory
// ═══════════════════════════════════════════════════════════

/// All practitioners as public cards. With `empty_as_not_found`, an empty
/// directory is reported as `NotFound`.
pub fn public_directory(conn: &Connection, empty_as_not_found: bool) -> Result<Vec<PractitionerCard>, ClinicError> {
    let cards: Vec<PractitionerCard> = db::list_accounts(conn, Some(Role::Practitioner))?
        .into_iter()
        .map(PractitionerCard::from)
        .collect();
    if cards.is_empty() && empty_as_not_found {
        return Err(ClinicError::not_found("No practitioners found"));
    }
    Ok(cards)
}

pub fn public_practitioner(conn: &Connection, id: &Uuid) -> Result<PractitionerCard, ClinicError> {
    match db::get_account(conn, id)? {
        Some(account) if account.is_practitioner() => Ok(PractitionerCard::from(account)),
        _ => Err(ClinicError::not_found("Practitioner not found")),
    }
}
