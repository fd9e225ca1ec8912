//! Draw-call style descriptors.
//!
//! Every draw call carries its full style explicitly. There is no ambient
//! "current font" or "current fill color" anywhere in the engine: the state
//! a PDF viewer mutates per operator is reconstructed from these descriptors
//! at serialization time, which removes order-dependence between renderers.

use serde::{Deserialize, Serialize};

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };
    /// Muted gray used for annotations and secondary text.
    pub const GRAY: Color = Color { r: 0.35, g: 0.35, b: 0.35 };
    /// The contact-bar teal in the page footer.
    pub const CONTACT_BAR: Color = Color { r: 0.0, g: 0.42, b: 0.44 };
}

/// One of the standard Helvetica variants. These are the only fonts the
/// engine emits, so no font files need embedding — the PDF names below are
/// built into every viewer and the width tables live in `font::metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontId {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl FontId {
    /// The PDF BaseFont name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            FontId::Helvetica => "Helvetica",
            FontId::HelveticaBold => "Helvetica-Bold",
            FontId::HelveticaOblique => "Helvetica-Oblique",
            FontId::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, FontId::HelveticaBold | FontId::HelveticaBoldOblique)
    }
}

/// Complete text style for a single draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontId,
    /// Font size in points (text is the one thing specified in pt even
    /// though page geometry is in mm — print sizes are quoted in pt).
    pub size: f64,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(font: FontId, size: f64) -> Self {
        Self { font, size, color: Color::BLACK }
    }

    pub const fn colored(font: FontId, size: f64, color: Color) -> Self {
        Self { font, size, color }
    }
}

/// Horizontal anchoring of a text draw call relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
