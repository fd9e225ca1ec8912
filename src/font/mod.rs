//! # Font Measurement
//!
//! Text measurement over the standard Helvetica family. The report engine
//! never embeds fonts: the four Helvetica variants are part of the standard
//! 14 PDF fonts, so the PDF serializer references them by name and this
//! module only has to answer "how wide is this string".
//!
//! Page geometry is in millimeters while font sizes are in points, so the
//! context exposes both units; layout code always wants mm.

pub mod metrics;

use crate::style::TextStyle;

/// Points per millimeter (72 pt / 25.4 mm).
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Measurement context shared by layout and PDF serialization.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Width of `text` in points.
    pub fn width_pt(&self, text: &str, style: &TextStyle) -> f64 {
        metrics::string_width(text, style.font, style.size)
    }

    /// Width of `text` in millimeters — the unit the layout layer works in.
    pub fn width_mm(&self, text: &str, style: &TextStyle) -> f64 {
        self.width_pt(text, style) / PT_PER_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FontId, TextStyle};

    #[test]
    fn test_mm_conversion() {
        let ctx = FontContext::new();
        let style = TextStyle::new(FontId::Helvetica, 10.0);
        let pt = ctx.width_pt("CBC", &style);
        let mm = ctx.width_mm("CBC", &style);
        assert!((mm * PT_PER_MM - pt).abs() < 1e-9);
    }
}
