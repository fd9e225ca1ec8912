//! # Report Document Model
//!
//! Two layers live here.
//!
//! The **raw layer** (`RawReport` and friends) mirrors the billing API's
//! JSON payload: everything optional, camelCase field names, sub-tests and
//! master-data nested the way the wire sends them. It is designed so a
//! partial or sloppy payload still deserializes.
//!
//! The **normalized layer** (`ReportDocument`, `TestGroup`, `TestEntry`,
//! `SubResult`) is what the layout engine consumes. It is produced once by
//! the transformer and never mutated during layout — the layout pass only
//! computes geometry.

use serde::{Deserialize, Serialize};

// ── Raw wire shapes ─────────────────────────────────────────────

/// A billing report as fetched from the report API, keyed by SID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub patient_name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub patient_id: Option<String>,
    pub branch_name: Option<String>,

    /// Sample/Specimen ID — the report's unique identifier.
    pub sid_no: Option<String>,
    pub registered_at: Option<String>,
    pub collected_at: Option<String>,
    pub reported_at: Option<String>,

    #[serde(default)]
    pub test_items: Vec<RawTestItem>,
}

/// One ordered test line from the billing report. May be a standalone test,
/// a profile panel carrying its own sub-test list, or a single sub-test of
/// an ordered profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTestItem {
    pub test_name: Option<String>,
    pub department: Option<String>,

    /// True when this item is one sub-parameter of an ordered profile; the
    /// item then groups under `profile_name` rather than its department.
    #[serde(default)]
    pub profile_sub_test: bool,
    pub profile_name: Option<String>,

    pub method: Option<String>,
    pub specimen: Option<String>,
    pub notes: Option<String>,

    pub result: Option<String>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,

    #[serde(default)]
    pub sub_tests: Vec<RawSubTest>,

    /// Nested master-data record; a secondary source for method, specimen,
    /// unit and reference range when the item's own fields are empty.
    pub master: Option<RawTestMaster>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubTest {
    pub name: Option<String>,
    pub result: Option<String>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTestMaster {
    pub department: Option<String>,
    pub method: Option<String>,
    pub specimen: Option<String>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
}

// ── Normalized layout input ─────────────────────────────────────

/// The input to the layout engine. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub patient: PatientInfo,
    pub sid_number: String,
    pub registered_at: String,
    pub collected_at: String,
    pub reported_at: String,
    /// Insertion order = print order. Never re-sorted.
    pub groups: Vec<TestGroup>,
    /// False only for the synthetic no-data fallback; column headers and
    /// the report title are suppressed in that case.
    pub has_data: bool,
}

/// Patient block fields, already resolved to display strings.
#[derive(Debug, Clone)]
pub struct PatientInfo {
    pub name: String,
    pub age_sex: String,
    pub patient_id: String,
    pub branch: String,
}

/// One printed department/profile section.
#[derive(Debug, Clone)]
pub struct TestGroup {
    pub category_name: String,
    pub tests: Vec<TestEntry>,
}

/// A single test: one name plus one or more parameter rows.
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub name: String,
    pub method: Option<String>,
    pub specimen: Option<String>,
    pub notes: Option<String>,
    /// Always non-empty; a standalone test is a single-element list.
    pub sub_results: Vec<SubResult>,
}

/// One result row.
#[derive(Debug, Clone)]
pub struct SubResult {
    pub name: String,
    /// Display value; "-" when the result is absent.
    pub result: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
}

// ── Render configuration ────────────────────────────────────────

/// Engine options recognized by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// When false the logo/branding is omitted but the barcode and the
    /// patient-info block keep their exact positions, so output printed on
    /// pre-printed letterhead stock still lines up.
    #[serde(default = "default_true")]
    pub include_header: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { include_header: true }
    }
}

fn default_true() -> bool {
    true
}

/// Tenant chrome: branding assets, footer content and signature slots.
/// Sourced from tenant/operator context, not from the report itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicProfile {
    /// Logo image source: file path, data URI, or raw base64.
    pub logo_src: Option<String>,
    /// Signature image source for the "Verified By" slot.
    pub signature_src: Option<String>,
    /// Branch locations, word-wrapped and centered in the footer.
    #[serde(default)]
    pub branches: Vec<String>,
    /// Contact line printed in the colored footer bar.
    #[serde(default)]
    pub contact_line: String,
    /// Base URL for the verification QR; the SID is appended.
    pub verify_url: Option<String>,
    pub verified_by: Option<Signatory>,
    pub authorized_by: Option<Signatory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signatory {
    pub name: String,
    pub title: String,
}

/// A complete render request: report payload plus tenant context. This is
/// the JSON shape the CLI reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub report: RawReport,
    #[serde(default)]
    pub clinic: ClinicProfile,
    #[serde(default)]
    pub options: RenderOptions,
}
