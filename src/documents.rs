//! Printable documents: payment receipts and prescriptions.
//!
//! Callers build a format-neutral [`DocumentPayload`] and hand it to a
//! [`DocumentRenderer`]. [`PdfRenderer`] lays the payload out on A4 pages
//! with `printpdf` builtin fonts.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Report, ReceiptDetails};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),
}

// ═══════════════════════════════════════════════════════════
// Payload
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSection {
    pub heading: String,
    pub lines: Vec<String>,
}

/// Structured document content, independent of the output format.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPayload {
    pub title: String,
    pub fields: Vec<DocumentField>,
    pub sections: Vec<DocumentSection>,
    pub footer: Option<String>,
}

impl DocumentPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            sections: Vec::new(),
            footer: None,
        }
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(DocumentField {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn section(mut self, heading: impl Into<String>, lines: Vec<String>) -> Self {
        if !lines.is_empty() {
            self.sections.push(DocumentSection {
                heading: heading.into(),
                lines,
            });
        }
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn field_value(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

/// Turns a payload into file bytes.
pub trait DocumentRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn render(&self, payload: &DocumentPayload) -> Result<Vec<u8>, RenderError>;
}

// ═══════════════════════════════════════════════════════════
// PDF rendering
// ═══════════════════════════════════════════════════════════

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: f32 = 280.0;
const BOTTOM_MARGIN: f32 = 20.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

/// Write position that moves to a fresh page when it reaches the bottom margin.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor<'_> {
    fn text(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef, step: f32) {
        if self.y < BOTTOM_MARGIN {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= step;
    }

    fn gap(&mut self, step: f32) {
        self.y -= step;
    }
}

impl DocumentRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, payload: &DocumentPayload) -> Result<Vec<u8>, RenderError> {
        let (doc, page1, layer1) = PdfDocument::new(&payload.title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Font(e.to_string()))?;

        let mut cursor = Cursor {
            doc: &doc,
            layer: doc.get_page(page1).get_layer(layer1),
            y: TOP,
        };

        cursor.text(&payload.title, 16.0, 20.0, &bold, 12.0);

        for field in &payload.fields {
            let text = format!("{}: {}", field.label, field.value);
            for line in wrap_text(&text, 85) {
                cursor.text(&line, 10.0, 20.0, &font, 6.0);
            }
        }

        for section in &payload.sections {
            cursor.gap(4.0);
            cursor.text(&section.heading.to_uppercase(), 11.0, 20.0, &bold, 6.0);
            for entry in &section.lines {
                for line in wrap_text(entry, 80) {
                    cursor.text(&line, 9.0, 25.0, &font, 4.5);
                }
                cursor.gap(1.5);
            }
        }

        if let Some(footer) = &payload.footer {
            cursor.gap(8.0);
            cursor.text(footer, 9.0, 20.0, &bold, 5.0);
        }
        drop(cursor);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::Save(e.to_string()))?;
        buf.into_inner()
            .map_err(|e| RenderError::Save(e.to_string()))
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ═══════════════════════════════════════════════════════════
// Clinic documents
// ═══════════════════════════════════════════════════════════

// Builtin PDF fonts have no rupee glyph.
fn format_amount(amount: f64) -> String {
    format!("INR {amount:.2}")
}

fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or("Unknown").to_string()
}

pub fn receipt_payload(details: &ReceiptDetails) -> DocumentPayload {
    let payment = &details.payment;
    DocumentPayload::new("Payment Receipt")
        .field("Receipt ID", payment.id.to_string())
        .field("Patient", or_unknown(details.account_name.as_deref()))
        .field("Email", or_unknown(details.account_email.as_deref()))
        .field("Practitioner", or_unknown(details.practitioner_name.as_deref()))
        .field("Amount", format_amount(payment.amount))
        .field("Method", payment.method.as_str())
        .field("Status", payment.status.as_str())
        .field("Date", payment.date.format("%Y-%m-%d %H:%M UTC").to_string())
        .footer("Thank you for your payment.")
}

pub fn prescription_payload(
    report: &Report,
    patient_name: Option<&str>,
    practitioner_name: Option<&str>,
) -> DocumentPayload {
    let medications = report
        .medications
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let mut line = format!("{}. {} - {}, {}", i + 1, m.name, m.dosage, m.frequency);
            if let Some(instructions) = m.instructions.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(" ({instructions})"));
            }
            line
        })
        .collect();

    let measurements = report
        .measurements
        .iter()
        .map(|m| {
            let mut parts = Vec::new();
            if let Some(date) = &m.date {
                parts.push(date.clone());
            }
            if let (Some(sys), Some(dia)) = (m.systolic, m.diastolic) {
                parts.push(format!("BP {sys}/{dia}"));
            }
            if let Some(sugar) = m.sugar {
                parts.push(format!("sugar {sugar}"));
            }
            if let Some(weight) = m.weight {
                parts.push(format!("weight {weight} kg"));
            }
            parts.join(", ")
        })
        .filter(|line| !line.is_empty())
        .collect();

    let mut payload = DocumentPayload::new("Prescription")
        .field("Report ID", report.id.to_string())
        .field("Patient", or_unknown(patient_name))
        .field("Practitioner", or_unknown(practitioner_name))
        .field("Date", report.created_at.format("%Y-%m-%d").to_string())
        .field("Diagnosis", report.diagnosis.clone());
    if let Some(last_visit) = &report.last_visit {
        payload = payload.field("Last visit", last_visit.clone());
    }

    payload
        .section("Medications", medications)
        .section("Measurements", measurements)
        .section("Notes", report.notes.iter().cloned().collect())
}

pub fn prescription_file_name(report_id: &Uuid) -> String {
    format!("prescription_{report_id}.pdf")
}

pub fn receipt_file_name(payment_id: &Uuid) -> String {
    format!("receipt_{payment_id}.pdf")
}

/// Write a rendered document into `dir`, creating it if needed.
pub fn store_document(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

pub fn remove_document(dir: &Path, file_name: &str) -> std::io::Result<()> {
    std::fs::remove_file(dir.join(file_name))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
