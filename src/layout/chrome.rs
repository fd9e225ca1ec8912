//! Chrome renderers: the repeating page decoration.
//!
//! Header block (logo, SID barcode, patient/report info), the title rule
//! and column header row, the terminal "End of Report" marker, the
//! final-page signature/QR block, and the footer post-pass.
//!
//! The barcode and the patient-info block sit at fixed Y positions that do
//! not depend on `include_header`: clinics print on pre-printed letterhead
//! stock, so suppressing the logo must not shift anything else.

use qrcode::QrCode;

use crate::barcode;
use crate::image_loader::{load_optional, LoadedImage};
use crate::model::ClinicProfile;
use crate::style::{Color, FontId, TextAlign, TextStyle};
use crate::text;

use super::{
    ImageSlot, RenderBackend, ReportLayout, COL_NAME_X, COL_REF_X, COL_RESULT_X, COL_UNIT_X,
    CONTENT_RIGHT, CONTENT_WIDTH, END_MARKER_HEIGHT, MARGIN_LEFT, PAGE_WIDTH,
    SIGNATURE_BLOCK_HEIGHT,
};

// Fixed header geometry (mm). Identical with and without branding.
const LOGO_Y: f64 = 8.0;
const LOGO_HEIGHT: f64 = 16.0;
const LOGO_MAX_WIDTH: f64 = 60.0;
const BARCODE_Y: f64 = 9.0;
const BARCODE_WIDTH: f64 = 42.0;
const BARCODE_HEIGHT: f64 = 8.0;
const INFO_BLOCK_TOP: f64 = 28.0;
const INFO_ROW_HEIGHT: f64 = 4.6;
const INFO_VALUE_OFFSET: f64 = 24.0;
const INFO_RIGHT_X: f64 = 118.0;
const DIVIDER_Y: f64 = 47.5;

// Footer band geometry. Everything below MAX_CONTENT_Y belongs here.
const FOOTER_BRANCHES_Y: f64 = 270.0;
const FOOTER_BRANCH_LINE_HEIGHT: f64 = 3.1;
/// Lines that fit between the branch strip top and the contact bar.
const FOOTER_BRANCH_MAX_LINES: usize = 3;
const CONTACT_BAR_Y: f64 = 280.0;
const CONTACT_BAR_HEIGHT: f64 = 7.0;
const PAGINATION_Y: f64 = 292.5;

const LABEL_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 8.0);
const VALUE_STYLE: TextStyle = TextStyle::new(FontId::Helvetica, 8.0);
const SID_TEXT_STYLE: TextStyle = TextStyle::new(FontId::Helvetica, 7.0);
const TITLE_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 11.0);
const COLUMN_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 8.0);
const MARKER_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 9.0);
const FOOTER_STYLE: TextStyle = TextStyle::colored(FontId::Helvetica, 7.0, Color::GRAY);
const CONTACT_STYLE: TextStyle = TextStyle::colored(FontId::Helvetica, 8.0, Color::WHITE);
const SIGNATORY_NAME_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 8.0);
const SIGNATORY_TITLE_STYLE: TextStyle = TextStyle::colored(FontId::Helvetica, 7.0, Color::GRAY);
const SLOT_CAPTION_STYLE: TextStyle = TextStyle::colored(FontId::Helvetica, 7.5, Color::GRAY);

/// The QR matrix, encoded before the layout pass starts.
#[derive(Debug, Clone)]
pub struct QrMatrix {
    pub width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }
}

/// Raster and vector assets resolved before layout begins. Every asset is
/// optional: a failed load degrades to an omitted element, never an error.
#[derive(Default)]
pub struct ReportAssets {
    pub logo: Option<LoadedImage>,
    pub signature: Option<LoadedImage>,
    pub qr: Option<QrMatrix>,
}

impl ReportAssets {
    /// Load branding rasters and encode the verification QR. This is the
    /// only asynchronous-flavored work in a render; the layout pass itself
    /// never waits on anything.
    pub fn prepare(clinic: &ClinicProfile, sid: &str) -> Self {
        let qr = clinic.verify_url.as_deref().and_then(|base| {
            let url = if base.ends_with('/') || base.ends_with('=') {
                format!("{base}{sid}")
            } else {
                format!("{base}/{sid}")
            };
            match QrCode::new(url.as_bytes()) {
                Ok(code) => Some(QrMatrix {
                    width: code.width(),
                    dark: code
                        .to_colors()
                        .iter()
                        .map(|c| *c == qrcode::Color::Dark)
                        .collect(),
                }),
                Err(e) => {
                    log::warn!("verification QR unavailable, omitting: {e}");
                    None
                }
            }
        });

        Self {
            logo: load_optional("logo", clinic.logo_src.as_deref()),
            signature: load_optional("signature", clinic.signature_src.as_deref()),
            qr,
        }
    }
}

impl<'a, B: RenderBackend> ReportLayout<'a, B> {
    /// The repeating header block at the top of every content page.
    pub(crate) fn render_header_chrome(&mut self) {
        if self.options.include_header {
            if let Some(logo) = &self.assets.logo {
                let width = (LOGO_HEIGHT * logo.aspect_ratio()).min(LOGO_MAX_WIDTH);
                self.backend
                    .draw_image(ImageSlot::Logo, MARGIN_LEFT, LOGO_Y, width, LOGO_HEIGHT);
            }
        }

        self.draw_sid_barcode();
        self.draw_info_block();
        self.backend.draw_line(
            MARGIN_LEFT,
            DIVIDER_Y,
            CONTENT_RIGHT,
            DIVIDER_Y,
            0.4,
            Color::BLACK,
        );
    }

    fn draw_sid_barcode(&mut self) {
        let code = barcode::encode(&self.doc.sid_number);
        let scale = BARCODE_WIDTH / code.total_modules;
        let x0 = CONTENT_RIGHT - BARCODE_WIDTH;
        for bar in &code.bars {
            self.backend.draw_rect(
                x0 + bar.offset * scale,
                BARCODE_Y,
                bar.width * scale,
                BARCODE_HEIGHT,
                Color::BLACK,
            );
        }
        self.backend.draw_text(
            x0 + BARCODE_WIDTH / 2.0,
            BARCODE_Y + BARCODE_HEIGHT + 3.2,
            &self.doc.sid_number,
            &SID_TEXT_STYLE,
            TextAlign::Center,
        );
    }

    /// Two-column patient / report info block.
    fn draw_info_block(&mut self) {
        let patient = &self.doc.patient;
        let left: [(&str, &str); 4] = [
            ("Patient", &patient.name),
            ("Age / Sex", &patient.age_sex),
            ("Patient ID", &patient.patient_id),
            ("Branch", &patient.branch),
        ];
        let right: [(&str, &str); 4] = [
            ("SID No.", &self.doc.sid_number),
            ("Registered", &self.doc.registered_at),
            ("Collected", &self.doc.collected_at),
            ("Reported", &self.doc.reported_at),
        ];

        for (i, (label, value)) in left.iter().enumerate() {
            let y = INFO_BLOCK_TOP + i as f64 * INFO_ROW_HEIGHT;
            self.backend
                .draw_text(MARGIN_LEFT, y, label, &LABEL_STYLE, TextAlign::Left);
            self.backend.draw_text(
                MARGIN_LEFT + INFO_VALUE_OFFSET,
                y,
                &format!(": {value}"),
                &VALUE_STYLE,
                TextAlign::Left,
            );
        }
        for (i, (label, value)) in right.iter().enumerate() {
            let y = INFO_BLOCK_TOP + i as f64 * INFO_ROW_HEIGHT;
            self.backend
                .draw_text(INFO_RIGHT_X, y, label, &LABEL_STYLE, TextAlign::Left);
            self.backend.draw_text(
                INFO_RIGHT_X + INFO_VALUE_OFFSET,
                y,
                &format!(": {value}"),
                &VALUE_STYLE,
                TextAlign::Left,
            );
        }
    }

    /// Report title rule and the result-table column header row. Skipped
    /// entirely for no-data documents.
    pub(crate) fn render_title_and_columns(&mut self) {
        let y = self.state.cursor_y;
        self.backend.draw_text(
            PAGE_WIDTH / 2.0,
            y,
            "FINAL TEST REPORT",
            &TITLE_STYLE,
            TextAlign::Center,
        );
        self.backend.draw_line(
            PAGE_WIDTH / 2.0 - 26.0,
            y + 1.6,
            PAGE_WIDTH / 2.0 + 26.0,
            y + 1.6,
            0.4,
            Color::BLACK,
        );
        self.state.advance(7.5);

        let y = self.state.cursor_y;
        self.backend.draw_text(
            COL_NAME_X,
            y,
            "INVESTIGATION / METHOD",
            &COLUMN_STYLE,
            TextAlign::Left,
        );
        self.backend
            .draw_text(COL_RESULT_X, y, "RESULT", &COLUMN_STYLE, TextAlign::Left);
        self.backend
            .draw_text(COL_UNIT_X, y, "UNITS", &COLUMN_STYLE, TextAlign::Left);
        self.backend.draw_text(
            COL_REF_X,
            y,
            "REFERENCE INTERVAL",
            &COLUMN_STYLE,
            TextAlign::Left,
        );
        self.backend
            .draw_line(MARGIN_LEFT, y + 1.8, CONTENT_RIGHT, y + 1.8, 0.3, Color::BLACK);
        self.state.advance(7.0);
    }

    /// Center-aligned terminal marker. A break taken here never re-renders
    /// header chrome — nothing follows but the marker itself.
    pub(crate) fn render_end_marker(&mut self) {
        if self.state.would_overflow(END_MARKER_HEIGHT) {
            self.break_page(false);
        }
        self.state.advance(5.0);
        self.backend.draw_text(
            PAGE_WIDTH / 2.0,
            self.state.cursor_y,
            "----- End of Report -----",
            &MARKER_STYLE,
            TextAlign::Center,
        );
        self.state.advance(6.0);
    }

    /// Verification QR plus the Verified By / Authorized By slots, once,
    /// on the final page.
    pub(crate) fn render_signature_block(&mut self) {
        if self.state.would_overflow(SIGNATURE_BLOCK_HEIGHT) {
            self.break_page(false);
        }
        let y0 = self.state.cursor_y + 3.0;

        if let Some(qr) = &self.assets.qr {
            self.draw_qr(qr, MARGIN_LEFT, y0, 20.0);
            self.backend.draw_text(
                MARGIN_LEFT + 10.0,
                y0 + 23.5,
                "Scan to verify",
                &SLOT_CAPTION_STYLE,
                TextAlign::Center,
            );
        }

        let verified = self.clinic.verified_by.clone();
        let authorized = self.clinic.authorized_by.clone();

        if let Some(signature) = &self.assets.signature {
            let width = (10.0 * signature.aspect_ratio()).min(34.0);
            self.backend.draw_image(
                ImageSlot::Signature,
                105.0 - width / 2.0,
                y0 + 2.0,
                width,
                10.0,
            );
        }
        self.draw_signatory_slot(105.0, y0, "Verified By", verified.as_ref());
        self.draw_signatory_slot(CONTENT_RIGHT - 24.0, y0, "Authorized By", authorized.as_ref());

        self.state.advance(SIGNATURE_BLOCK_HEIGHT);
    }

    fn draw_signatory_slot(
        &mut self,
        center_x: f64,
        y0: f64,
        caption: &str,
        signatory: Option<&crate::model::Signatory>,
    ) {
        self.backend.draw_line(
            center_x - 18.0,
            y0 + 14.0,
            center_x + 18.0,
            y0 + 14.0,
            0.3,
            Color::GRAY,
        );
        if let Some(s) = signatory {
            self.backend
                .draw_text(center_x, y0 + 18.0, &s.name, &SIGNATORY_NAME_STYLE, TextAlign::Center);
            self.backend.draw_text(
                center_x,
                y0 + 21.5,
                &s.title,
                &SIGNATORY_TITLE_STYLE,
                TextAlign::Center,
            );
        }
        self.backend.draw_text(
            center_x,
            y0 + 25.5,
            caption,
            &SLOT_CAPTION_STYLE,
            TextAlign::Center,
        );
    }

    fn draw_qr(&mut self, qr: &QrMatrix, x0: f64, y0: f64, size: f64) {
        let module = size / qr.width as f64;
        for row in 0..qr.width {
            for col in 0..qr.width {
                if qr.is_dark(col, row) {
                    self.backend.draw_rect(
                        x0 + col as f64 * module,
                        y0 + row as f64 * module,
                        module,
                        module,
                        Color::BLACK,
                    );
                }
            }
        }
    }

    /// Footer post-pass: stamped on every produced page once the total
    /// page count is final.
    pub(crate) fn stamp_footers(&mut self) {
        let total = self.backend.page_count();
        let mut branch_lines = {
            let backend = &*self.backend;
            let measure = |s: &str| backend.measure_text(s, &FOOTER_STYLE);
            let joined = self.clinic.branches.join(" | ");
            text::wrap(&joined, CONTENT_WIDTH, &measure)
        };
        // The strip above the contact bar holds three lines; anything past
        // that would print into the bar.
        if branch_lines.len() > FOOTER_BRANCH_MAX_LINES {
            log::warn!(
                "branch list wraps to {} footer lines; keeping the first {}",
                branch_lines.len(),
                FOOTER_BRANCH_MAX_LINES
            );
            branch_lines.truncate(FOOTER_BRANCH_MAX_LINES);
        }

        for index in 0..total {
            self.backend.select_page(index);

            let mut y = FOOTER_BRANCHES_Y;
            for line in &branch_lines {
                self.backend
                    .draw_text(PAGE_WIDTH / 2.0, y, line, &FOOTER_STYLE, TextAlign::Center);
                y += FOOTER_BRANCH_LINE_HEIGHT;
            }

            self.backend.draw_rect(
                0.0,
                CONTACT_BAR_Y,
                PAGE_WIDTH,
                CONTACT_BAR_HEIGHT,
                Color::CONTACT_BAR,
            );
            if !self.clinic.contact_line.is_empty() {
                self.backend.draw_text(
                    PAGE_WIDTH / 2.0,
                    CONTACT_BAR_Y + 4.6,
                    &self.clinic.contact_line,
                    &CONTACT_STYLE,
                    TextAlign::Center,
                );
            }

            self.backend.draw_text(
                MARGIN_LEFT,
                PAGINATION_Y,
                &format!("SID: {}", self.doc.sid_number),
                &FOOTER_STYLE,
                TextAlign::Left,
            );
            self.backend.draw_text(
                CONTENT_RIGHT,
                PAGINATION_Y,
                &format!("Page {} of {}", index + 1, total),
                &FOOTER_STYLE,
                TextAlign::Right,
            );
        }
    }
}
