//! Role-based authorization.
//!
//! Each role maps to a fixed capability set; operations ask for a capability
//! rather than checking roles directly. Mutations scoped to one account go
//! through an ownership cascade:
//! 1. Own account → ALLOW
//! 2. Caller holds `ManageAnyAccount` → ALLOW
//! 3. Default → DENY

use serde::Serialize;
use uuid::Uuid;

use crate::error::ClinicError;
use crate::models::{Account, Role};

// ═══════════════════════════════════════════════════════════
// Capabilities
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// List and read accounts.
    ReadDirectory,
    BookAppointment,
    /// Book an appointment owned by a different account.
    BookOnBehalf,
    ModifyAppointment,
    RecordPayment,
    AuthorReport,
    SendMessage,
    PractitionerWorkspace,
    /// Delete accounts, change roles, edit other accounts.
    ManageAnyAccount,
    AdminDashboard,
}

const PATIENT_CAPABILITIES: &[Capability] = &[
    Capability::ReadDirectory,
    Capability::BookAppointment,
    Capability::ModifyAppointment,
    Capability::RecordPayment,
];

const PRACTITIONER_CAPABILITIES: &[Capability] = &[
    Capability::ReadDirectory,
    Capability::BookAppointment,
    Capability::ModifyAppointment,
    Capability::RecordPayment,
    Capability::AuthorReport,
    Capability::SendMessage,
    Capability::PractitionerWorkspace,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ReadDirectory,
    Capability::BookAppointment,
    Capability::BookOnBehalf,
    Capability::ModifyAppointment,
    Capability::RecordPayment,
    Capability::AuthorReport,
    Capability::SendMessage,
    Capability::ManageAnyAccount,
    Capability::AdminDashboard,
];

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Patient => PATIENT_CAPABILITIES,
            Role::Practitioner => PRACTITIONER_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

// ═══════════════════════════════════════════════════════════
// Caller identity
// ═══════════════════════════════════════════════════════════

/// The authenticated account behind a request.
#[derive(Debug, Clone, Serialize)]
pub struct CallerContext {
    pub account_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl From<&Account> for CallerContext {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            role: account.role,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

impl CallerContext {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), ClinicError> {
        if self.can(capability) {
            Ok(())
        } else {
            tracing::warn!(
                account_id = %self.account_id,
                role = %self.role,
                ?capability,
                "Capability check failed"
            );
            Err(ClinicError::Forbidden)
        }
    }

    /// Run the ownership cascade for `target` and fail with `Forbidden` on deny.
    pub fn require_account_access(&self, target: &Uuid) -> Result<AccessReason, ClinicError> {
        let decision = check_account_access(self, target);
        if decision.allowed {
            Ok(decision.reason)
        } else {
            tracing::warn!(
                account_id = %self.account_id,
                target = %target,
                "Account access denied"
            );
            Err(ClinicError::Forbidden)
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Ownership cascade
// ═══════════════════════════════════════════════════════════

/// Why access was granted (or denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    OwnAccount,
    Administrator,
    Denied,
}

#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

/// Check whether the caller may mutate data owned by `target`.
pub fn check_account_access(caller: &CallerContext, target: &Uuid) -> AccessDecision {
    // Rule 1: own account
    if caller.account_id == *target {
        return AccessDecision::allow(AccessReason::OwnAccount);
    }

    // Rule 2: administrators manage every account
    if caller.can(Capability::ManageAnyAccount) {
        return AccessDecision::allow(AccessReason::Administrator);
    }

    AccessDecision::deny()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> CallerContext {
        CallerContext {
            account_id: Uuid::new_v4(),
            role,
            name: "Caller".into(),
            email: "caller@example.com".into(),
        }
    }

    #[test]
    fn capability_table() {
        assert!(Role::Patient.can(Capability::BookAppointment));
        assert!(!Role::Patient.can(Capability::BookOnBehalf));
        assert!(!Role::Patient.can(Capability::AuthorReport));
        assert!(!Role::Patient.can(Capability::SendMessage));

        assert!(Role::Practitioner.can(Capability::AuthorReport));
        assert!(Role::Practitioner.can(Capability::PractitionerWorkspace));
        assert!(!Role::Practitioner.can(Capability::ManageAnyAccount));
        assert!(!Role::Practitioner.can(Capability::AdminDashboard));

        assert!(Role::Admin.can(Capability::BookOnBehalf));
        assert!(Role::Admin.can(Capability::AdminDashboard));
        assert!(!Role::Admin.can(Capability::PractitionerWorkspace));
    }

    #[test]
    fn every_role_reads_directory() {
        for role in [Role::Patient, Role::Practitioner, Role::Admin] {
            assert!(role.can(Capability::ReadDirectory));
        }
    }

    #[test]
    fn own_account_allowed() {
        let me = caller(Role::Patient);
        let decision = check_account_access(&me, &me.account_id);
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::OwnAccount);
    }

    #[test]
    fn admin_allowed_on_other_accounts() {
        let admin = caller(Role::Admin);
        let decision = check_account_access(&admin, &Uuid::new_v4());
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::Administrator);
    }

    #[test]
    fn others_denied() {
        for role in [Role::Patient, Role::Practitioner] {
            let c = caller(role);
            let decision = check_account_access(&c, &Uuid::new_v4());
            assert!(!decision.allowed);
            assert_eq!(decision.reason, AccessReason::Denied);
            assert!(matches!(
                c.require_account_access(&Uuid::new_v4()),
                Err(ClinicError::Forbidden)
            ));
        }
    }

    #[test]
    fn require_maps_to_forbidden() {
        assert!(caller(Role::Practitioner).require(Capability::AuthorReport).is_ok());
        assert!(matches!(
            caller(Role::Patient).require(Capability::AuthorReport),
            Err(ClinicError::Forbidden)
        ));
    }
}
