//! # Page Flow Controller
//!
//! The heart of the engine and the reason it exists.
//!
//! Lab reports are printed documents: the A4 page boundary is a hard
//! constraint on every layout decision, not something to slice into after
//! the fact. The controller runs a single linear pass over the report's
//! test groups with a vertical cursor. Before drawing anything it asks
//! "does this fit below the cursor?"; if not it opens a new page, re-renders
//! the repeating chrome when (and only when) more content follows, and
//! resumes. Footers are stamped in a distinct post-pass because "Page X of
//! Y" needs the final page count, which exists only after the full pass.
//!
//! Layout decisions are separated from drawing by the [`RenderBackend`]
//! trait: the controller emits measure/draw/new-page calls, and the
//! [`PageRecorder`] turns them into inspectable per-page draw ops that the
//! PDF serializer (or a test) consumes. All coordinates are millimeters
//! from the top-left of the page.

pub mod blocks;
pub mod chrome;

pub use chrome::{QrMatrix, ReportAssets};

use crate::font::FontContext;
use crate::model::{ClinicProfile, RenderOptions, ReportDocument};
use crate::style::{Color, TextAlign, TextStyle};

// ── Page geometry (mm, A4 portrait) ─────────────────────────────

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN_LEFT: f64 = 12.0;
pub const MARGIN_RIGHT: f64 = 12.0;
pub const CONTENT_RIGHT: f64 = PAGE_WIDTH - MARGIN_RIGHT;
pub const CONTENT_WIDTH: f64 = CONTENT_RIGHT - MARGIN_LEFT;

/// Bottom boundary for content. The band below belongs to the footer
/// post-pass, so content and footer ops can never collide.
pub const MAX_CONTENT_Y: f64 = 265.0;

/// First content baseline on a page carrying the header chrome.
pub const CONTENT_TOP_WITH_HEADER: f64 = 56.0;
/// First content baseline on a chrome-less page (terminal marker pages).
pub const CONTENT_TOP_BARE: f64 = 24.0;

// Result table column offsets.
pub const COL_NAME_X: f64 = MARGIN_LEFT;
pub const COL_RESULT_X: f64 = 112.0;
pub const COL_UNIT_X: f64 = 141.0;
pub const COL_REF_X: f64 = 162.0;
/// Width available to reference-interval lines.
pub const REF_COL_WIDTH: f64 = CONTENT_RIGHT - COL_REF_X;
/// Width available to the test-name column.
pub const NAME_COL_WIDTH: f64 = COL_RESULT_X - COL_NAME_X - 4.0;

pub const LINE_HEIGHT: f64 = 4.2;
pub const ANNOTATION_LINE_HEIGHT: f64 = 3.4;
/// Fixed gap appended after every sub-result block.
pub const BLOCK_GAP: f64 = 1.6;
/// Minimum room required before writing a group heading.
pub const GROUP_HEADING_RESERVE: f64 = 15.0;
/// Vertical separation between consecutive groups.
pub const GROUP_GAP: f64 = 8.0;

pub const END_MARKER_HEIGHT: f64 = 12.0;
pub const SIGNATURE_BLOCK_HEIGHT: f64 = 34.0;

// ── Backend seam ────────────────────────────────────────────────

/// Which preloaded raster asset an image op refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Logo,
    Signature,
}

/// A recorded drawing operation. Text x is the resolved left edge;
/// alignment is applied at record time using real measurement.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        x: f64,
        /// Baseline, mm from page top.
        y: f64,
        text: String,
        style: TextStyle,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: Color,
    },
    /// Filled rectangle; (x, y) is the top-left corner.
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Color,
    },
    Image {
        slot: ImageSlot,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

/// The seam between layout decisions and drawing. The controller only ever
/// talks to this trait, so layout behavior is testable against the
/// recorder without any PDF machinery.
pub trait RenderBackend {
    /// Width of `text` in mm under `style`.
    fn measure_text(&self, text: &str, style: &TextStyle) -> f64;
    fn draw_text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle, align: TextAlign);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color);
    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color);
    fn draw_image(&mut self, slot: ImageSlot, x: f64, y: f64, w: f64, h: f64);
    /// Open a fresh page and direct subsequent draws to it.
    fn new_page(&mut self);
    fn page_count(&self) -> usize;
    /// Redirect subsequent draws to an existing page (footer post-pass).
    fn select_page(&mut self, index: usize);
}

/// A laid-out page: the ops to serialize, in draw order.
#[derive(Debug, Clone, Default)]
pub struct RecordedPage {
    pub ops: Vec<DrawOp>,
}

/// The production backend: records draw ops per page, measuring with the
/// built-in standard-font metrics.
pub struct PageRecorder {
    pages: Vec<RecordedPage>,
    current: usize,
    fonts: FontContext,
}

impl Default for PageRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRecorder {
    pub fn new() -> Self {
        Self {
            pages: vec![RecordedPage::default()],
            current: 0,
            fonts: FontContext::new(),
        }
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<RecordedPage> {
        self.pages
    }

    fn push(&mut self, op: DrawOp) {
        self.pages[self.current].ops.push(op);
    }
}

impl RenderBackend for PageRecorder {
    fn measure_text(&self, text: &str, style: &TextStyle) -> f64 {
        self.fonts.width_mm(text, style)
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle, align: TextAlign) {
        let width = self.measure_text(text, style);
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        self.push(DrawOp::Text { x: left, y, text: text.to_string(), style: *style });
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color) {
        self.push(DrawOp::Line { x1, y1, x2, y2, width, color });
    }

    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        self.push(DrawOp::Rect { x, y, w, h, color });
    }

    fn draw_image(&mut self, slot: ImageSlot, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::Image { slot, x, y, w, h });
    }

    fn new_page(&mut self) {
        self.pages.push(RecordedPage::default());
        self.current = self.pages.len() - 1;
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn select_page(&mut self, index: usize) {
        debug_assert!(index < self.pages.len());
        self.current = index.min(self.pages.len() - 1);
    }
}

// ── Layout state ────────────────────────────────────────────────

/// Mutable per-render layout state. One instance per render invocation;
/// never reused across documents.
#[derive(Debug, Clone)]
pub struct PageLayoutState {
    /// Current vertical write position, mm from page top.
    pub cursor_y: f64,
    /// 1-based page number of the page being written.
    pub page_index: usize,
    /// Content must not be drawn below this line.
    pub max_content_y: f64,
}

impl PageLayoutState {
    pub fn new(top: f64) -> Self {
        Self { cursor_y: top, page_index: 1, max_content_y: MAX_CONTENT_Y }
    }

    pub fn advance(&mut self, amount: f64) {
        self.cursor_y += amount;
    }

    /// Would drawing `amount` mm of content cross the bottom boundary?
    pub fn would_overflow(&self, amount: f64) -> bool {
        self.cursor_y + amount > self.max_content_y
    }

    pub fn remaining(&self) -> f64 {
        self.max_content_y - self.cursor_y
    }
}

// ── Controller ──────────────────────────────────────────────────

/// Single-pass layout driver. Created per render invocation; the block and
/// chrome renderers are further `impl` blocks in their own modules.
pub struct ReportLayout<'a, B: RenderBackend> {
    pub(crate) backend: &'a mut B,
    pub(crate) doc: &'a ReportDocument,
    pub(crate) clinic: &'a ClinicProfile,
    pub(crate) options: &'a RenderOptions,
    pub(crate) assets: &'a ReportAssets,
    pub(crate) state: PageLayoutState,
}

/// Lay out the whole document onto the backend: content pass, terminal
/// marker, signature block, then the footer post-pass.
pub fn lay_out_report<B: RenderBackend>(
    doc: &ReportDocument,
    clinic: &ClinicProfile,
    options: &RenderOptions,
    assets: &ReportAssets,
    backend: &mut B,
) {
    let mut layout = ReportLayout {
        backend,
        doc,
        clinic,
        options,
        assets,
        state: PageLayoutState::new(CONTENT_TOP_WITH_HEADER),
    };
    layout.run();
}

impl<'a, B: RenderBackend> ReportLayout<'a, B> {
    fn run(&mut self) {
        self.render_header_chrome();
        if self.doc.has_data {
            self.render_title_and_columns();
        }

        for i in 0..self.doc.groups.len() {
            if i > 0 {
                if self.state.would_overflow(GROUP_GAP) {
                    self.break_page(true);
                } else {
                    self.state.advance(GROUP_GAP);
                }
            }
            self.render_group(i);
        }

        self.render_end_marker();
        self.render_signature_block();
        self.stamp_footers();
    }

    fn render_group(&mut self, group_idx: usize) {
        if self.state.would_overflow(GROUP_HEADING_RESERVE) {
            self.break_page(true);
        }

        let group = &self.doc.groups[group_idx];
        let heading = group.category_name.clone();
        self.draw_group_heading(&heading);

        let test_count = self.doc.groups[group_idx].tests.len();
        for t in 0..test_count {
            self.render_entry(group_idx, t);
        }
    }

    /// Page break procedure. Header chrome (and column headers, when the
    /// document shows them) are re-rendered only when more content follows;
    /// a break taken purely to place the terminal marker or signature block
    /// must not leave a data-header ghost on an otherwise empty page.
    pub(crate) fn break_page(&mut self, more_content: bool) {
        self.backend.new_page();
        self.state.page_index += 1;
        if more_content {
            self.state.cursor_y = CONTENT_TOP_WITH_HEADER;
            self.render_header_chrome();
            if self.doc.has_data {
                self.render_title_and_columns();
            }
        } else {
            self.state.cursor_y = CONTENT_TOP_BARE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FontId;

    #[test]
    fn test_state_advance_and_overflow() {
        let mut state = PageLayoutState::new(56.0);
        assert!(!state.would_overflow(10.0));
        state.advance(200.0);
        assert_eq!(state.cursor_y, 256.0);
        assert!(state.would_overflow(10.0));
        assert!(!state.would_overflow(9.0));
    }

    #[test]
    fn test_recorder_starts_with_one_page() {
        let rec = PageRecorder::new();
        assert_eq!(rec.page_count(), 1);
    }

    #[test]
    fn test_recorder_alignment_resolution() {
        let mut rec = PageRecorder::new();
        let style = TextStyle::new(FontId::Helvetica, 10.0);
        rec.draw_text(100.0, 50.0, "CBC", &style, TextAlign::Right);
        let DrawOp::Text { x, .. } = &rec.pages()[0].ops[0] else {
            panic!("expected text op");
        };
        let width = rec.measure_text("CBC", &style);
        assert!((x + width - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_recorder_select_page() {
        let mut rec = PageRecorder::new();
        rec.new_page();
        rec.select_page(0);
        let style = TextStyle::new(FontId::Helvetica, 8.0);
        rec.draw_text(0.0, 0.0, "footer", &style, TextAlign::Left);
        assert_eq!(rec.pages()[0].ops.len(), 1);
        assert!(rec.pages()[1].ops.is_empty());
    }

    #[test]
    fn test_break_without_more_content_renders_no_chrome() {
        let doc = crate::transform::build_document(&crate::model::RawReport {
            sid_no: Some("S9".to_string()),
            test_items: vec![crate::model::RawTestItem {
                test_name: Some("Glucose".to_string()),
                department: Some("BIOCHEMISTRY".to_string()),
                result: Some("96".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        let clinic = crate::model::ClinicProfile::default();
        let options = crate::model::RenderOptions::default();
        let assets = ReportAssets::default();
        let mut recorder = PageRecorder::new();
        let mut layout = ReportLayout {
            backend: &mut recorder,
            doc: &doc,
            clinic: &clinic,
            options: &options,
            assets: &assets,
            state: PageLayoutState::new(CONTENT_TOP_WITH_HEADER),
        };

        layout.break_page(false);
        let cursor = layout.state.cursor_y;
        drop(layout);
        assert_eq!(cursor, CONTENT_TOP_BARE);
        assert!(
            recorder.pages()[1].ops.is_empty(),
            "terminal break must not repeat header chrome"
        );

        let mut recorder = PageRecorder::new();
        let mut layout = ReportLayout {
            backend: &mut recorder,
            doc: &doc,
            clinic: &clinic,
            options: &options,
            assets: &assets,
            state: PageLayoutState::new(CONTENT_TOP_WITH_HEADER),
        };
        layout.break_page(true);
        drop(layout);
        assert!(!recorder.pages()[1].ops.is_empty());
    }

    #[test]
    fn test_column_offsets_are_ordered() {
        assert!(COL_NAME_X < COL_RESULT_X);
        assert!(COL_RESULT_X < COL_UNIT_X);
        assert!(COL_UNIT_X < COL_REF_X);
        assert!(COL_REF_X + REF_COL_WIDTH <= CONTENT_RIGHT + 1e-9);
    }
}
