//! # sidreport
//!
//! A page-native PDF report engine for clinical laboratory results.
//!
//! Most report generators lay text onto an infinite vertical canvas and then
//! slice it into pages after the fact, which is how result rows end up
//! straddling page boundaries and "Page 2" arrives with no patient header.
//! sidreport does the opposite: **the A4 page is the fundamental unit of
//! layout.** Every placement decision is made against the page boundary as a
//! hard constraint; content flows *into* pages, repeating the header chrome
//! and column captions on every page that carries results.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON report payload)
//!       ↓
//!  [transform]  — Normalize the raw payload into display groups
//!       ↓
//!  [layout]     — Page-aware layout: cursor, breaks, chrome, footers
//!       ↓
//!  [pdf]        — Serialize recorded pages to PDF bytes
//! ```
//!
//! Patient header, SID barcode, grouped result rows, reference-interval
//! formatting, terminal marker, signature/QR block and "Page X of Y"
//! footers are all handled by the layout pass; the PDF module only
//! translates recorded draw ops into operators.

pub mod barcode;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod range;
pub mod style;
pub mod text;
pub mod transform;

use error::ReportError;
use layout::{lay_out_report, PageRecorder, ReportAssets};
use model::{ClinicProfile, RawReport, RenderOptions, RenderRequest};
use pdf::PdfWriter;

/// Render a raw report payload to PDF bytes.
///
/// This is the primary entry point. Asset failures (logo, signature, QR)
/// degrade to omitted elements; only an empty SID-less payload that still
/// fails normalization would error, so in practice this returns `Ok` for
/// any payload that deserialized.
pub fn render_report(
    report: &RawReport,
    clinic: &ClinicProfile,
    options: &RenderOptions,
) -> Result<Vec<u8>, ReportError> {
    let doc = transform::build_document(report);
    let assets = ReportAssets::prepare(clinic, &doc.sid_number);

    let mut recorder = PageRecorder::new();
    lay_out_report(&doc, clinic, options, &assets, &mut recorder);

    let pages = recorder.into_pages();
    if pages.is_empty() {
        return Err(ReportError::Render("layout produced no pages".to_string()));
    }

    let title = format!("Lab Report {}", doc.sid_number);
    let writer = PdfWriter::new();
    Ok(writer.write(&pages, &assets, &title))
}

/// Render a complete [`RenderRequest`] (report + tenant context).
pub fn render_request(request: &RenderRequest) -> Result<Vec<u8>, ReportError> {
    render_report(&request.report, &request.clinic, &request.options)
}

/// Render a request described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, ReportError> {
    let request: RenderRequest = serde_json::from_str(json)?;
    render_request(&request)
}

/// Default download filename: `{patientName}_{sid}_{YYYY-MM-DD}.pdf`, with
/// each segment stripped to alphanumerics (spaces become underscores) and
/// empty segments dropped. A fully empty name degrades to `Report.pdf`.
pub fn report_file_name(patient_name: &str, sid: &str) -> String {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let mut parts: Vec<String> = [patient_name, sid]
        .iter()
        .map(|s| sanitize_segment(s))
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        parts.push("Report".to_string());
    }
    parts.push(date);
    format!("{}.pdf", parts.join("_"))
}

fn sanitize_segment(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    cleaned.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_file_name_sanitizes() {
        let name = report_file_name("Jane Doe", "SID12345");
        assert!(name.starts_with("Jane_Doe_SID12345_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_report_file_name_strips_specials() {
        let name = report_file_name("O'Brien / Jr.", "S-1");
        assert!(name.starts_with("OBrien__Jr_S-1_"));
    }

    #[test]
    fn test_report_file_name_empty_degrades() {
        let name = report_file_name("", "");
        assert!(name.starts_with("Report_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_render_json_rejects_garbage() {
        assert!(matches!(
            render_json("not json"),
            Err(ReportError::Parse(_))
        ));
    }

    #[test]
    fn test_render_json_minimal_payload() {
        let bytes = render_json(r#"{"report": {}}"#).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }
}
