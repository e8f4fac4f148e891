use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// Optional contact details shown on an account's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    pub relation: String,
    pub age: u32,
}

/// A registered user. The password hash and reset-token fields live only in
/// the database and never appear on this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub fees: Option<f64>,
    pub experience: Option<i64>,
    pub bio: Option<String>,
    pub profile: ContactProfile,
    pub family_members: Vec<FamilyMember>,
    pub favorites: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_practitioner(&self) -> bool {
        self.role == Role::Practitioner
    }
}

/// Identity returned alongside a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// Public-facing practitioner card (directory and favorites).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerCard {
    pub id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
    pub fees: Option<f64>,
    pub experience: Option<i64>,
    pub bio: Option<String>,
    pub profile: ContactProfile,
}

impl From<Account> for PractitionerCard {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            specialization: account.specialization,
            fees: account.fees,
            experience: account.experience,
            bio: account.bio,
            profile: account.profile,
        }
    }
}

/// Insert payload for a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub fees: Option<f64>,
    pub experience: Option<i64>,
}

/// Partial profile update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
    pub fees: Option<f64>,
    pub experience: Option<i64>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.specialization.is_none()
            && self.fees.is_none()
            && self.experience.is_none()
            && self.bio.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.photo.is_none()
    }
}
