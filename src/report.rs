//! Medical report service.
//!
//! A report is a snapshot written by a practitioner after an appointment.
//! When requested, a prescription document is rendered alongside it and the
//! report keeps a link to the stored file.

use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::authorization::{CallerContext, Capability};
use crate::db;
use crate::documents::{self, DocumentRenderer};
use crate::error::{required, ClinicError};
use crate::models::*;

/// URL prefix under which stored prescription documents are served.
pub const REPORTS_URL_PREFIX: &str = "/reports";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MedicationInput {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportInput {
    pub account_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    /// Authoring practitioner; defaults to the caller.
    pub practitioner_id: Option<Uuid>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub booked: Option<String>,
    pub last_visit: Option<String>,
    pub measurements: Vec<Measurement>,
    pub medications: Vec<MedicationInput>,
    pub generate_document: bool,
}

/// Where generated documents go and how they are rendered.
pub struct DocumentSink<'a> {
    pub renderer: &'a dyn DocumentRenderer,
    pub dir: &'a Path,
}

fn to_medication(index: usize, input: MedicationInput) -> Result<Medication, ClinicError> {
    match (
        required(&input.name, "name"),
        required(&input.dosage, "dosage"),
        required(&input.frequency, "frequency"),
    ) {
        (Ok(name), Ok(dosage), Ok(frequency)) => Ok(Medication {
            name: name.to_string(),
            dosage: dosage.to_string(),
            frequency: frequency.to_string(),
            instructions: input.instructions.filter(|s| !s.trim().is_empty()),
        }),
        _ => Err(ClinicError::validation(format!(
            "medication {} needs name, dosage and frequency",
            index + 1
        ))),
    }
}

/// Store a report. With `generate_document`, the prescription is rendered
/// into `sink.dir` and its link recorded on the report.
pub fn create(
    conn: &Connection,
    caller: &CallerContext,
    input: ReportInput,
    sink: &DocumentSink<'_>,
) -> Result<Report, ClinicError> {
    caller.require(Capability::AuthorReport)?;

    let diagnosis = required(&input.diagnosis, "diagnosis")?.to_string();
    let (account_id, appointment_id) = match (input.account_id, input.appointment_id) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(ClinicError::validation(
                "account_id and appointment_id are required",
            ))
        }
    };
    let medications = input
        .medications
        .into_iter()
        .enumerate()
        .map(|(i, m)| to_medication(i, m))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = Report {
        id: Uuid::new_v4(),
        account_id,
        practitioner_id: input.practitioner_id.unwrap_or(caller.account_id),
        appointment_id,
        diagnosis,
        notes: input.notes,
        booked: input.booked,
        last_visit: input.last_visit,
        measurements: input.measurements,
        medications,
        document_link: None,
        created_at: Utc::now(),
    };

    let document = if input.generate_document {
        let file_name = documents::prescription_file_name(&report.id);
        write_prescription(conn, &report, sink, &file_name)?;
        report.document_link = Some(format!("{REPORTS_URL_PREFIX}/{file_name}"));
        Some(file_name)
    } else {
        None
    };

    // A stored document must not outlive a report that failed to persist
    if let Err(e) = db::insert_report(conn, &report) {
        if let Some(file_name) = &document {
            if let Err(io) = documents::remove_document(sink.dir, file_name) {
                tracing::warn!(report_id = %report.id, error = %io, "Failed to remove orphaned prescription");
            }
        }
        return Err(e.into());
    }
    tracing::info!(
        report_id = %report.id,
        practitioner_id = %report.practitioner_id,
        document = report.document_link.is_some(),
        "Report created"
    );
    Ok(report)
}

fn write_prescription(
    conn: &Connection,
    report: &Report,
    sink: &DocumentSink<'_>,
    file_name: &str,
) -> Result<(), ClinicError> {
    let patient = db::get_account(conn, &report.account_id)?;
    let practitioner = db::get_account(conn, &report.practitioner_id)?;
    let payload = documents::prescription_payload(
        report,
        patient.as_ref().map(|a| a.name.as_str()),
        practitioner.as_ref().map(|a| a.name.as_str()),
    );
    let bytes = sink.renderer.render(&payload)?;
    documents::store_document(sink.dir, file_name, &bytes)?;
    Ok(())
}

/// Reports about an account, newest first. With `empty_as_not_found`, an
/// account with no reports is reported as `NotFound`.
pub fn list_for_account(
    conn: &Connection,
    account_id: &Uuid,
    empty_as_not_found: bool,
) -> Result<Vec<ReportWithPractitioner>, ClinicError> {
    let reports = db::list_reports_for_account(conn, account_id)?;
    if reports.is_empty() && empty_as_not_found {
        return Err(ClinicError::not_found("No medical reports found for this account."));
    }
    Ok(reports)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::PdfRenderer;
    use crate::test_support::*;

    fn input(patient: &Account) -> ReportInput {
        ReportInput {
            account_id: Some(patient.id),
            appointment_id: Some(Uuid::new_v4()),
            diagnosis: Some("Seasonal allergy".into()),
            medications: vec![MedicationInput {
                name: Some("Cetirizine".into()),
                dosage: Some("10mg".into()),
                frequency: Some("Once a day".into()),
                instructions: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_author_capability() {
        let conn = memory_conn();
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink { renderer: &PdfRenderer, dir: dir.path() };
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        assert!(matches!(
            create(&conn, &caller_for(&patient), input(&patient), &sink),
            Err(ClinicError::Forbidden)
        ));
    }

    #[test]
    fn create_defaults_practitioner_to_caller() {
        let conn = memory_conn();
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink { renderer: &PdfRenderer, dir: dir.path() };
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);

        let report = create(&conn, &caller_for(&doc), input(&patient), &sink).unwrap();
        assert_eq!(report.practitioner_id, doc.id);
        assert!(report.document_link.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn diagnosis_and_medication_fields_required() {
        let conn = memory_conn();
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink { renderer: &PdfRenderer, dir: dir.path() };
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        let caller = caller_for(&doc);

        let mut no_diagnosis = input(&patient);
        no_diagnosis.diagnosis = Some("  ".into());
        assert!(matches!(
            create(&conn, &caller, no_diagnosis, &sink),
            Err(ClinicError::Validation(_))
        ));

        let mut bad_med = input(&patient);
        bad_med.medications[0].dosage = None;
        let err = create(&conn, &caller, bad_med, &sink).unwrap_err();
        assert_eq!(err.to_string(), "medication 1 needs name, dosage and frequency");
    }

    #[test]
    fn generated_prescription_is_stored_and_linked() {
        let conn = memory_conn();
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink { renderer: &PdfRenderer, dir: dir.path() };
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);

        let mut with_doc = input(&patient);
        with_doc.generate_document = true;
        let report = create(&conn, &caller_for(&doc), with_doc, &sink).unwrap();

        let file_name = format!("prescription_{}.pdf", report.id);
        assert_eq!(report.document_link, Some(format!("/reports/{file_name}")));
        let bytes = std::fs::read(dir.path().join(&file_name)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn failed_insert_leaves_no_prescription_behind() {
        let conn = memory_conn();
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink { renderer: &PdfRenderer, dir: dir.path() };
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);
        conn.execute("DROP TABLE reports", []).unwrap();

        let mut with_doc = input(&patient);
        with_doc.generate_document = true;
        assert!(create(&conn, &caller_for(&doc), with_doc, &sink).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn list_empty_handling_and_order() {
        let conn = memory_conn();
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink { renderer: &PdfRenderer, dir: dir.path() };
        let patient = seed_account(&conn, "Riya", "riya@example.com", Role::Patient);
        let doc = seed_account(&conn, "Dr. Rao", "rao@example.com", Role::Practitioner);

        let err = list_for_account(&conn, &patient.id, true).unwrap_err();
        assert_eq!(err.to_string(), "No medical reports found for this account.");
        assert!(list_for_account(&conn, &patient.id, false).unwrap().is_empty());

        let first = create(&conn, &caller_for(&doc), input(&patient), &sink).unwrap();
        let second = create(&conn, &caller_for(&doc), input(&patient), &sink).unwrap();
        let listed = list_for_account(&conn, &patient.id, true).unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|r| r.report.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(listed[0].practitioner_name.as_deref(), Some("Dr. Rao"));
    }
}
