use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One vitals reading. The date is free text (`YYYY-MM-DD` by convention).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sugar: Option<f64>,
    #[serde(default)]
    pub systolic: Option<f64>,
    #[serde(default)]
    pub diastolic: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Medical report snapshot. Never recomputed from later changes to the
/// appointment or accounts it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub account_id: Uuid,
    pub practitioner_id: Uuid,
    pub appointment_id: Uuid,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub booked: Option<String>,
    pub last_visit: Option<String>,
    pub measurements: Vec<Measurement>,
    pub medications: Vec<Medication>,
    pub document_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWithPractitioner {
    #[serde(flatten)]
    pub report: Report,
    pub practitioner_name: Option<String>,
}
