//! Block renderers: the per-test content rows.
//!
//! Each sub-result block draws a parameter name (with optional method and
//! specimen annotations beneath it), the result, the unit, and the stacked
//! reference-interval lines at fixed column offsets, then advances the
//! cursor by the space actually consumed. The controller pre-checks the
//! estimated block height; blocks whose reference text cannot fit even on
//! a fresh page page themselves line by line rather than dropping content.

use crate::range::format_reference_range;
use crate::style::{Color, FontId, TextAlign, TextStyle};
use crate::text;

use super::{
    RenderBackend, ReportLayout, ANNOTATION_LINE_HEIGHT, BLOCK_GAP, COL_NAME_X, COL_RESULT_X,
    COL_REF_X, COL_UNIT_X, CONTENT_TOP_WITH_HEADER, CONTENT_WIDTH, LINE_HEIGHT, MAX_CONTENT_Y,
    NAME_COL_WIDTH, REF_COL_WIDTH,
};

const GROUP_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 9.5);
const NAME_STYLE: TextStyle = TextStyle::new(FontId::Helvetica, 8.5);
const ANNOTATION_STYLE: TextStyle =
    TextStyle::colored(FontId::HelveticaOblique, 7.0, Color::GRAY);
const RESULT_STYLE: TextStyle = TextStyle::new(FontId::HelveticaBold, 8.5);
const UNIT_STYLE: TextStyle = TextStyle::new(FontId::Helvetica, 8.0);
const REF_STYLE: TextStyle = TextStyle::new(FontId::Helvetica, 7.5);
const NOTES_STYLE: TextStyle = TextStyle::colored(FontId::HelveticaOblique, 7.5, Color::GRAY);

/// Indent for sub-parameter rows under a multi-parameter test title.
const SUB_ROW_INDENT: f64 = 4.0;

/// Tallest block that can be placed in one piece on a fresh page; anything
/// larger pages itself mid-block.
const FRESH_PAGE_CAPACITY: f64 = MAX_CONTENT_Y - CONTENT_TOP_WITH_HEADER;

impl<'a, B: RenderBackend> ReportLayout<'a, B> {
    pub(crate) fn draw_group_heading(&mut self, heading: &str) {
        let y = self.state.cursor_y;
        self.backend
            .draw_text(COL_NAME_X, y, heading, &GROUP_STYLE, TextAlign::Left);
        self.backend.draw_line(
            COL_NAME_X,
            y + 1.4,
            COL_NAME_X + self.backend.measure_text(heading, &GROUP_STYLE),
            y + 1.4,
            0.3,
            Color::BLACK,
        );
        self.state.advance(LINE_HEIGHT + 1.6);
    }

    pub(crate) fn render_entry(&mut self, group_idx: usize, test_idx: usize) {
        let doc = self.doc;
        let entry = &doc.groups[group_idx].tests[test_idx];

        let mut annotations = Vec::new();
        if let Some(method) = &entry.method {
            annotations.push(format!("(Method: {method})"));
        }
        if let Some(specimen) = &entry.specimen {
            annotations.push(format!("(Specimen: {specimen})"));
        }

        let standalone =
            entry.sub_results.len() == 1 && entry.sub_results[0].name == entry.name;

        if standalone {
            self.render_sub_result_block(
                &entry.name,
                &annotations,
                &entry.sub_results[0],
                0.0,
            );
        } else {
            self.render_entry_title(&entry.name, &annotations);
            for sub in &entry.sub_results {
                self.render_sub_result_block(&sub.name, &[], sub, SUB_ROW_INDENT);
            }
        }

        if let Some(notes) = &entry.notes {
            self.render_notes(notes);
        }
    }

    /// Title row for a multi-parameter test: name plus annotations, no
    /// result columns of its own.
    fn render_entry_title(&mut self, name: &str, annotations: &[String]) {
        let name_lines = self.wrap_name(name, 0.0);
        let height = name_lines.len() as f64 * LINE_HEIGHT
            + annotations.len() as f64 * ANNOTATION_LINE_HEIGHT;
        if self
            .state
            .would_overflow((height + LINE_HEIGHT).min(FRESH_PAGE_CAPACITY))
        {
            self.break_page(true);
        }

        let mut y = self.state.cursor_y;
        for (i, line) in name_lines.iter().enumerate() {
            if i > 0 {
                y += LINE_HEIGHT;
            }
            if y > self.state.max_content_y {
                self.break_page(true);
                y = self.state.cursor_y;
            }
            self.backend
                .draw_text(COL_NAME_X, y, line, &NAME_STYLE, TextAlign::Left);
        }
        for annotation in annotations {
            y += ANNOTATION_LINE_HEIGHT;
            if y > self.state.max_content_y {
                self.break_page(true);
                y = self.state.cursor_y;
            }
            self.backend
                .draw_text(COL_NAME_X + 1.5, y, annotation, &ANNOTATION_STYLE, TextAlign::Left);
        }
        self.state.cursor_y = y + LINE_HEIGHT;
    }

    /// Draw one result row. Returns nothing; the cursor ends up just below
    /// the space the block consumed, including the fixed inter-block gap.
    fn render_sub_result_block(
        &mut self,
        name: &str,
        annotations: &[String],
        sub: &crate::model::SubResult,
        indent: f64,
    ) {
        let name_lines = self.wrap_name(name, indent);
        let ref_lines = self.resolve_reference_lines(sub);

        let left_height = name_lines.len() as f64 * LINE_HEIGHT
            + annotations.len() as f64 * ANNOTATION_LINE_HEIGHT;
        let ref_height = ref_lines.len() as f64 * LINE_HEIGHT;
        let estimate = left_height.max(ref_height).max(LINE_HEIGHT) + BLOCK_GAP;

        // A block taller than a fresh page can never be placed whole, so
        // it starts at the top of a fresh page and pages itself line by
        // line from there.
        if self.state.would_overflow(estimate.min(FRESH_PAGE_CAPACITY)) {
            self.break_page(true);
        }

        let y0 = self.state.cursor_y;

        // Result and unit sit on the shared first baseline; draw them
        // before any mid-block paging can move the cursor off this page.
        self.backend
            .draw_text(COL_RESULT_X, y0, &sub.result, &RESULT_STYLE, TextAlign::Left);
        if let Some(unit) = &sub.unit {
            self.backend
                .draw_text(COL_UNIT_X, y0, unit, &UNIT_STYLE, TextAlign::Left);
        }

        let mut left_y = y0;
        let mut left_paged = false;
        for (i, line) in name_lines.iter().enumerate() {
            if i > 0 {
                left_y += LINE_HEIGHT;
            }
            if left_y > self.state.max_content_y {
                self.break_page(true);
                left_paged = true;
                left_y = self.state.cursor_y;
            }
            self.backend
                .draw_text(COL_NAME_X + indent, left_y, line, &NAME_STYLE, TextAlign::Left);
        }
        for annotation in annotations {
            left_y += ANNOTATION_LINE_HEIGHT;
            if left_y > self.state.max_content_y {
                self.break_page(true);
                left_paged = true;
                left_y = self.state.cursor_y;
            }
            self.backend.draw_text(
                COL_NAME_X + indent + 1.5,
                left_y,
                annotation,
                &ANNOTATION_STYLE,
                TextAlign::Left,
            );
        }

        // Reference lines stack below the shared baseline. Once the left
        // column has paged, the parallel alignment is gone and they
        // continue below it instead. A line that would cross the boundary
        // pages the rest of the block onward.
        let mut ref_y = if left_paged { left_y + LINE_HEIGHT } else { y0 };
        let mut paged_mid_block = left_paged;
        for (i, line) in ref_lines.iter().enumerate() {
            if i > 0 {
                ref_y += LINE_HEIGHT;
            }
            if ref_y > self.state.max_content_y {
                self.break_page(true);
                paged_mid_block = true;
                ref_y = self.state.cursor_y;
            }
            self.backend
                .draw_text(COL_REF_X, ref_y, line, &REF_STYLE, TextAlign::Left);
        }

        let bottom = if !paged_mid_block {
            left_y.max(ref_y)
        } else if ref_lines.is_empty() {
            left_y
        } else {
            ref_y
        };
        self.state.cursor_y = bottom + BLOCK_GAP + 1.2;
    }

    /// Notes paragraph after a test's rows, word-wrapped to the printable
    /// width and paged line by line.
    fn render_notes(&mut self, notes: &str) {
        let lines = {
            let backend = &*self.backend;
            let measure = |s: &str| backend.measure_text(s, &NOTES_STYLE);
            text::wrap(notes, CONTENT_WIDTH - 6.0, &measure)
        };

        for line in &lines {
            if self.state.would_overflow(ANNOTATION_LINE_HEIGHT) {
                self.break_page(true);
            }
            self.backend.draw_text(
                COL_NAME_X + 2.0,
                self.state.cursor_y,
                line,
                &NOTES_STYLE,
                TextAlign::Left,
            );
            self.state.advance(ANNOTATION_LINE_HEIGHT);
        }
        self.state.advance(1.0);
    }

    fn wrap_name(&self, name: &str, indent: f64) -> Vec<String> {
        let backend = &*self.backend;
        let measure = |s: &str| backend.measure_text(s, &NAME_STYLE);
        let lines = text::wrap(name, NAME_COL_WIDTH - indent, &measure);
        if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        }
    }

    /// Resolve the display lines for a reference interval: formatted text,
    /// "N/A" when absent on a real data row, nothing on the no-data
    /// placeholder row.
    fn resolve_reference_lines(&self, sub: &crate::model::SubResult) -> Vec<String> {
        let backend = &*self.backend;
        let measure = |s: &str| backend.measure_text(s, &REF_STYLE);
        match &sub.reference_range {
            Some(raw) => {
                let lines = format_reference_range(raw, REF_COL_WIDTH, &measure);
                if lines.is_empty() {
                    vec!["N/A".to_string()]
                } else {
                    lines
                }
            }
            None if self.doc.has_data => vec!["N/A".to_string()],
            None => Vec::new(),
        }
    }
}
