//! # PDF Serializer
//!
//! Takes the recorded pages from the layout engine and writes a valid PDF
//! file.
//!
//! This is a from-scratch PDF 1.7 writer. We write the raw bytes ourselves
//! because it gives us full control over the output and keeps the engine
//! self-contained. The PDF spec is verbose but the subset a lab report
//! needs — Type1 standard fonts, Flate-compressed content streams, image
//! XObjects — is manageable.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Only the four standard Helvetica variants are emitted, so fonts are
//! simple Type1 references with WinAnsiEncoding and nothing is embedded.
//!
//! Coordinates arrive in millimeters from the top-left; this module is the
//! single place where they become points from the bottom-left.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::PT_PER_MM;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawOp, ImageSlot, RecordedPage, ReportAssets, PAGE_HEIGHT, PAGE_WIDTH};
use crate::style::FontId;

const ALL_FONTS: [FontId; 4] = [
    FontId::Helvetica,
    FontId::HelveticaBold,
    FontId::HelveticaOblique,
    FontId::HelveticaBoldOblique,
];

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Registered Type1 fonts: (font, object_id), indexed as /F0, /F1, ...
    font_objects: Vec<(FontId, usize)>,
    /// Registered image XObjects: (slot, object_id), indexed as /Im0, ...
    image_objects: Vec<(ImageSlot, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write recorded pages to a PDF byte vector.
    pub fn write(&self, pages: &[RecordedPage], assets: &ReportAssets, title: &str) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, images, then page objects and content streams
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages, assets);

        let resources = self.build_resource_dict(&builder);

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let page_obj_id = builder.objects.len();
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                PAGE_WIDTH * PT_PER_MM,
                PAGE_HEIGHT * PT_PER_MM,
                content_obj_id,
                resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        // Catalog (object 1)
        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        // Pages tree (object 2)
        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        // Info dictionary
        let info_obj_id = builder.objects.len();
        let info = format!(
            "<< /Title ({}) /Producer (sidreport) >>",
            Self::escape_pdf_string(title)
        );
        builder.objects.push(PdfObject {
            data: info.into_bytes(),
        });

        self.serialize(&builder, Some(info_obj_id))
    }

    /// Register a Type1 font object for each variant the pages actually use.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[RecordedPage]) {
        for font in ALL_FONTS {
            let used = pages.iter().any(|page| {
                page.ops
                    .iter()
                    .any(|op| matches!(op, DrawOp::Text { style, .. } if style.font == font))
            });
            if !used {
                continue;
            }
            let obj_id = builder.objects.len();
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            builder.objects.push(PdfObject {
                data: dict.into_bytes(),
            });
            builder.font_objects.push((font, obj_id));
        }
    }

    /// Register an XObject for each asset slot that any page references.
    fn register_images(
        &self,
        builder: &mut PdfBuilder,
        pages: &[RecordedPage],
        assets: &ReportAssets,
    ) {
        let slots = [
            (ImageSlot::Logo, assets.logo.as_ref()),
            (ImageSlot::Signature, assets.signature.as_ref()),
        ];
        for (slot, image) in slots {
            let referenced = pages.iter().any(|page| {
                page.ops
                    .iter()
                    .any(|op| matches!(op, DrawOp::Image { slot: s, .. } if *s == slot))
            });
            if !referenced {
                continue;
            }
            // A referenced slot always has an image: layout only emits the
            // op when the asset loaded.
            if let Some(image) = image {
                let obj_id = Self::write_image_xobject(builder, image);
                builder.image_objects.push((slot, obj_id));
            }
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };

                let obj_id = builder.objects.len();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace {} \
                     /BitsPerComponent 8 \
                     /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj_data });
                obj_id
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                // Write SMask first if alpha channel exists
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
                    let smask_obj_id = builder.objects.len();
                    let mut smask_data: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask_data,
                        "<< /Type /XObject /Subtype /Image \
                         /Width {} /Height {} \
                         /ColorSpace /DeviceGray \
                         /BitsPerComponent 8 \
                         /Filter /FlateDecode \
                         /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed_alpha.len()
                    );
                    smask_data.extend_from_slice(&compressed_alpha);
                    smask_data.extend_from_slice(b"\nendstream");
                    builder.objects.push(PdfObject { data: smask_data });
                    smask_obj_id
                });

                let compressed_rgb = compress_to_vec_zlib(rgb, 6);
                let obj_id = builder.objects.len();
                let mut obj_data: Vec<u8> = Vec::new();

                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();

                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace /DeviceRGB \
                     /BitsPerComponent 8 \
                     /Filter /FlateDecode \
                     /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed_rgb.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed_rgb);
                obj_data.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj_data });
                obj_id
            }
        }
    }

    /// Shared /Resources dict: every page sees the same fonts and XObjects.
    fn build_resource_dict(&self, builder: &PdfBuilder) -> String {
        let fonts: String = builder
            .font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ");
        let mut resources = format!("/Font << {} >>", fonts);
        if !builder.image_objects.is_empty() {
            let xobjects: String = builder
                .image_objects
                .iter()
                .enumerate()
                .map(|(i, (_, obj_id))| format!("/Im{} {} 0 R", i, obj_id))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(resources, " /XObject << {} >>", xobjects);
        }
        resources
    }

    fn font_index(&self, builder: &PdfBuilder, font: FontId) -> usize {
        builder
            .font_objects
            .iter()
            .position(|(f, _)| *f == font)
            .unwrap_or(0)
    }

    fn image_name(&self, builder: &PdfBuilder, slot: ImageSlot) -> Option<String> {
        builder
            .image_objects
            .iter()
            .position(|(s, _)| *s == slot)
            .map(|i| format!("Im{}", i))
    }

    /// Build the content stream for one page, converting each recorded op
    /// to PDF operators. mm from top-left become pt from bottom-left here.
    fn build_content_stream(&self, page: &RecordedPage, builder: &PdfBuilder) -> String {
        let page_height_pt = PAGE_HEIGHT * PT_PER_MM;
        let mut stream = String::new();

        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, style } => {
                    let pdf_x = x * PT_PER_MM;
                    let pdf_y = page_height_pt - y * PT_PER_MM;
                    let font_name = format!("F{}", self.font_index(builder, style.font));
                    let _ = write!(
                        stream,
                        "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n",
                        style.color.r, style.color.g, style.color.b, font_name, style.size, pdf_x,
                        pdf_y
                    );
                    let _ = write!(stream, "({}) Tj\nET\n", Self::encode_text(text));
                }

                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        color.r,
                        color.g,
                        color.b,
                        width * PT_PER_MM,
                        x1 * PT_PER_MM,
                        page_height_pt - y1 * PT_PER_MM,
                        x2 * PT_PER_MM,
                        page_height_pt - y2 * PT_PER_MM,
                    );
                }

                DrawOp::Rect { x, y, w, h, color } => {
                    // PDF rects anchor at the bottom-left corner.
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        color.r,
                        color.g,
                        color.b,
                        x * PT_PER_MM,
                        page_height_pt - (y + h) * PT_PER_MM,
                        w * PT_PER_MM,
                        h * PT_PER_MM,
                    );
                }

                DrawOp::Image { slot, x, y, w, h } => {
                    if let Some(name) = self.image_name(builder, *slot) {
                        let _ = write!(
                            stream,
                            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{} Do\nQ\n",
                            w * PT_PER_MM,
                            h * PT_PER_MM,
                            x * PT_PER_MM,
                            page_height_pt - (y + h) * PT_PER_MM,
                            name
                        );
                    }
                }
            }
        }

        stream
    }

    /// Encode a text run as a WinAnsi PDF string, escaping delimiters.
    /// Characters outside WinAnsiEncoding render as '?'.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        // ASCII printable range maps directly
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        // Windows-1252 special mappings (0x80-0x9F)
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for i in 1..builder.objects.len() {
            let _ = write!(output, "{:010} 00000 n \n", offsets[i]);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R",
            builder.objects.len()
        );
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{TextAlign, TextStyle};

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(
            PdfWriter::escape_pdf_string("Hello (World)"),
            "Hello \\(World\\)"
        );
        assert_eq!(PdfWriter::escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_encode_text_escapes_and_maps() {
        assert_eq!(PdfWriter::encode_text("a(b)c"), "a\\(b\\)c");
        // En dash maps to the Windows-1252 byte, emitted as octal.
        assert_eq!(PdfWriter::encode_text("\u{2013}"), "\\226");
        // Unmappable characters degrade to '?'.
        assert_eq!(PdfWriter::encode_text("\u{4e2d}"), "?");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let writer = PdfWriter::new();
        let pages = vec![RecordedPage::default()];
        let assets = ReportAssets::default();
        let bytes = writer.write(&pages, &assets, "Lab Report SID001");

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
    }

    #[test]
    fn test_title_in_info_dict() {
        let writer = PdfWriter::new();
        let pages = vec![RecordedPage::default()];
        let bytes = writer.write(&pages, &ReportAssets::default(), "Lab Report S42");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Lab Report S42)"));
    }

    #[test]
    fn test_only_used_fonts_registered() {
        let writer = PdfWriter::new();
        let mut page = RecordedPage::default();
        page.ops.push(DrawOp::Text {
            x: 10.0,
            y: 10.0,
            text: "Hemoglobin".to_string(),
            style: TextStyle::new(FontId::HelveticaBold, 8.5),
        });
        let bytes = writer.write(&[page], &ReportAssets::default(), "t");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(!text.contains("/BaseFont /Helvetica-Oblique"));
        assert!(!text.contains("/BaseFont /Helvetica /"));
    }

    #[test]
    fn test_page_count_in_pages_tree() {
        let writer = PdfWriter::new();
        let pages = vec![RecordedPage::default(), RecordedPage::default()];
        let bytes = writer.write(&pages, &ReportAssets::default(), "t");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn test_mediabox_is_a4() {
        let writer = PdfWriter::new();
        let bytes = writer.write(
            &[RecordedPage::default()],
            &ReportAssets::default(),
            "t",
        );
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 595.28 841.89]"));
    }

    // Keep the recorder out of this: ops are built by hand so the test
    // pins serializer behavior alone.
    #[test]
    fn test_content_stream_is_flate_compressed() {
        let writer = PdfWriter::new();
        let mut page = RecordedPage::default();
        page.ops.push(DrawOp::Rect {
            x: 0.0,
            y: 280.0,
            w: 210.0,
            h: 7.0,
            color: crate::style::Color::CONTACT_BAR,
        });
        let bytes = writer.write(&[page], &ReportAssets::default(), "t");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter /FlateDecode"));
    }

    #[test]
    fn test_recorder_round_trip_smoke() {
        use crate::layout::{PageRecorder, RenderBackend};

        let mut rec = PageRecorder::new();
        let style = TextStyle::new(FontId::Helvetica, 8.0);
        rec.draw_text(12.0, 56.0, "GENERAL TESTS", &style, TextAlign::Left);
        rec.new_page();
        rec.draw_text(12.0, 56.0, "Page two", &style, TextAlign::Left);

        let writer = PdfWriter::new();
        let bytes = writer.write(rec.pages(), &ReportAssets::default(), "Lab Report S1");
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
    }
}
