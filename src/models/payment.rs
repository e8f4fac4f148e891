use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{PaymentMethod, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub practitioner_id: Option<Uuid>,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentPatch {
    pub amount: Option<f64>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
}

/// Payment with the paying account and practitioner resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWithParties {
    #[serde(flatten)]
    pub payment: Payment,
    pub account_name: Option<String>,
    pub practitioner_name: Option<String>,
    pub practitioner_specialization: Option<String>,
}

/// Everything printed on a receipt.
#[derive(Debug, Clone)]
pub struct ReceiptDetails {
    pub payment: Payment,
    pub account_name: Option<String>,
    pub account_email: Option<String>,
    pub practitioner_name: Option<String>,
}
