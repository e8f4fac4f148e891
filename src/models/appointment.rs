use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, AppointmentType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub account_id: Uuid,
    pub practitioner_id: Uuid,
    pub date: NaiveDate,
    /// Wall-clock `HH:MM`.
    pub time: String,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub practitioner_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Appointment with both parties' names resolved. A name is `None` when the
/// referenced account no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithNames {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub account_name: Option<String>,
    pub practitioner_name: Option<String>,
}
