//! Structured error types for the report rendering engine.
//!
//! Two variants cover the real failure sources: parsing the incoming report
//! payload and the layout/PDF pass itself. Asset problems (logo, signature,
//! barcode, QR) are deliberately NOT errors — chrome is additive, so those
//! degrade to a logged warning and an omitted element.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON input failed to parse as a raw report payload.
    #[error("Failed to parse report: {0}")]
    Parse(#[from] serde_json::Error),

    /// Layout or PDF generation failed. The partially built document is
    /// discarded; callers surface this as a single user-facing message.
    #[error("Failed to generate PDF: {0}")]
    Render(String),
}
