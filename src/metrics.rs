//! Font description and the width oracle used by the line breaker.

use std::sync::Arc;

use crate::error::MeasureError;

/// One of the four faces selected by the bold/italic flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FontVariant {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub const ALL: [Self; 4] = [Self::Regular, Self::Bold, Self::Italic, Self::BoldItalic];

    /// Variant for the given style flags.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }

    fn slot(self) -> usize {
        match self {
            Self::Regular => 0,
            Self::Bold => 1,
            Self::Italic => 2,
            Self::BoldItalic => 3,
        }
    }
}

/// Font face reference handed to the measurer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FontFace {
    /// Family name.
    pub family: Arc<str>,
    /// Numeric weight.
    pub weight: u16,
    /// Italic flag.
    pub italic: bool,
}

impl FontFace {
    pub fn new(family: impl Into<Arc<str>>, weight: u16, italic: bool) -> Self {
        Self {
            family: family.into(),
            weight,
            italic,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 700
    }
}

/// Regular, bold, italic and bold-italic faces of one paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontSet {
    faces: [FontFace; 4],
}

impl FontSet {
    /// Four faces of a single family at weights 400/700.
    pub fn new(family: &str) -> Self {
        let family: Arc<str> = Arc::from(family);
        Self {
            faces: [
                FontFace::new(family.clone(), 400, false),
                FontFace::new(family.clone(), 700, false),
                FontFace::new(family.clone(), 400, true),
                FontFace::new(family, 700, true),
            ],
        }
    }

    /// Replace the face used for one variant.
    pub fn with_face(mut self, variant: FontVariant, face: FontFace) -> Self {
        self.faces[variant.slot()] = face;
        self
    }

    pub fn face(&self, variant: FontVariant) -> &FontFace {
        &self.faces[variant.slot()]
    }

    /// Base face, used for indentation and paragraph metrics.
    pub fn regular(&self) -> &FontFace {
        self.face(FontVariant::Regular)
    }

    /// Run style for a variant at `size`.
    pub fn style(&self, variant: FontVariant, size: f32) -> RunStyle {
        RunStyle {
            face: self.face(variant).clone(),
            size,
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::new("Helvetica")
    }
}

/// Face plus size: everything the oracle needs to measure a run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunStyle {
    pub face: FontFace,
    /// Font size in points (or pixels; the unit is the measurer's).
    pub size: f32,
}

/// Width oracle for glyph-accurate line fitting.
///
/// Implementations must be deterministic: identical inputs give identical
/// widths.
pub trait TextMeasurer: Send + Sync {
    /// Rendered width of `text` under `style`.
    fn measure_text(&self, text: &str, style: &RunStyle) -> Result<f32, MeasureError>;

    /// Width of an average character, used to decide whether splitting a long
    /// word can make progress at all.
    fn average_char_width(&self, style: &RunStyle) -> Result<f32, MeasureError>;

    /// Distance from the baseline to the top of the tallest glyphs.
    fn ascent(&self, style: &RunStyle) -> f32;

    /// Distance from the baseline to the bottom of descenders (positive).
    fn descent(&self, style: &RunStyle) -> f32;

    /// Baseline-to-baseline distance.
    fn line_height(&self, style: &RunStyle) -> f32 {
        self.ascent(style) + self.descent(style)
    }
}

/// Deterministic proportional width model used when no real font metrics are
/// available.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeuristicMeasurer {
    /// Line height as a multiple of the font size.
    pub line_height: f32,
}

impl Default for HeuristicMeasurer {
    fn default() -> Self {
        Self { line_height: 1.2 }
    }
}

impl HeuristicMeasurer {
    fn family_scale(face: &FontFace, size: f32) -> f32 {
        let family = face.family.to_ascii_lowercase();
        let mut scale = if family.contains("serif") && !family.contains("sans") {
            1.03
        } else if family.contains("sans") || family.contains("helvetica") {
            0.99
        } else {
            1.00
        };
        if face.is_bold() {
            scale += 0.03;
        }
        if face.italic {
            scale += 0.01;
        }
        if size >= 24.0 {
            scale += 0.01;
        }
        scale
    }

    fn is_monospace(face: &FontFace) -> bool {
        let family = face.family.to_ascii_lowercase();
        family.contains("mono") || family.contains("fixed") || family.contains("courier")
    }
}

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text(&self, text: &str, style: &RunStyle) -> Result<f32, MeasureError> {
        let monospace = Self::is_monospace(&style.face);
        let mut em_sum = 0.0f32;
        for ch in text.chars() {
            if ch.is_control() && !matches!(ch, '\t' | '\n') {
                return Err(MeasureError::missing_glyph(ch));
            }
            em_sum += if monospace {
                if ch == ' ' {
                    0.52
                } else {
                    0.58
                }
            } else {
                proportional_glyph_em_width(ch)
            };
        }
        Ok(em_sum * style.size * Self::family_scale(&style.face, style.size))
    }

    fn average_char_width(&self, style: &RunStyle) -> Result<f32, MeasureError> {
        let em = if Self::is_monospace(&style.face) {
            0.58
        } else {
            0.5
        };
        Ok(em * style.size * Self::family_scale(&style.face, style.size))
    }

    fn ascent(&self, style: &RunStyle) -> f32 {
        style.size * 0.78
    }

    fn descent(&self, style: &RunStyle) -> f32 {
        style.size * 0.22
    }

    fn line_height(&self, style: &RunStyle) -> f32 {
        style.size * self.line_height
    }
}

fn proportional_glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' => 0.32,
        '\t' => 1.28,
        '\u{00A0}' => 0.32,
        '\u{2022}' => 0.35,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}
