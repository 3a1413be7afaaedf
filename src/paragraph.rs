//! Paragraph configuration and the layout entry points.

use std::sync::Arc;

use crate::error::LayoutError;
use crate::line_breaker::{Line, LineBreaker};
use crate::metrics::{FontSet, FontVariant, HeuristicMeasurer, RunStyle, TextMeasurer};
use crate::run_layer::PlacedToken;
use crate::tokenizer::{tokenize, DefaultWrapFunction, WrapFunction};

/// Horizontal placement of each line inside the width budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    /// Parse `left`, `center` or `right` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" | "centre" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// X offset of a line of `line_width` inside `budget`.
    pub fn offset(self, budget: f32, line_width: f32) -> f32 {
        let free = budget - line_width;
        match self {
            Self::Left => 0.0,
            Self::Center => free / 2.0,
            Self::Right => free,
        }
    }
}

/// Line decoration drawn with the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TextDecoration {
    Underline,
    Highlight,
    Squiggly,
    Strikeout,
}

impl TextDecoration {
    pub fn name(self) -> &'static str {
        match self {
            Self::Underline => "underline",
            Self::Highlight => "highlight",
            Self::Squiggly => "squiggly",
            Self::Strikeout => "strikeout",
        }
    }
}

/// 8-bit RGB text color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived brightness in `0..=255`.
    pub fn luminance(self) -> u8 {
        let l = (299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b)) / 1000;
        l.min(255) as u8
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Paragraph layout configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphConfig {
    /// Width budget every line must fit into.
    pub width: f32,
    /// Base font size.
    pub font_size: f32,
    /// Regular, bold, italic and bold-italic faces.
    pub fonts: FontSet,
    /// Horizontal alignment applied when rendering.
    pub align: HorizontalAlignment,
    /// Text color.
    pub color: Rgb,
    /// Optional decoration; only underline is drawable.
    pub decoration: Option<TextDecoration>,
    /// Outline the font metrics box and the width budget when rendering.
    pub draw_debug: bool,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            width: 500.0,
            font_size: 12.0,
            fonts: FontSet::default(),
            align: HorizontalAlignment::Left,
            color: Rgb::BLACK,
            decoration: None,
            draw_debug: false,
        }
    }
}

impl ParagraphConfig {
    /// Convenience for a width and font size with defaults for the rest.
    pub fn for_width(width: f32, font_size: f32) -> Self {
        Self {
            width,
            font_size,
            ..Self::default()
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_align(mut self, align: HorizontalAlignment) -> Self {
        self.align = align;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_decoration(mut self, decoration: TextDecoration) -> Self {
        self.decoration = Some(decoration);
        self
    }

    pub fn with_draw_debug(mut self, draw_debug: bool) -> Self {
        self.draw_debug = draw_debug;
        self
    }

    fn regular_style(&self) -> RunStyle {
        self.fonts.style(FontVariant::Regular, self.font_size)
    }
}

/// Result of one layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LaidOutParagraph {
    pub lines: Vec<Line>,
}

impl LaidOutParagraph {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line(&self, index: usize) -> Result<&Line, LayoutError> {
        self.lines.get(index).ok_or(LayoutError::IndexOutOfRange {
            index,
            line_count: self.lines.len(),
        })
    }

    /// Trimmed width of line `index`.
    pub fn line_width(&self, index: usize) -> Result<f32, LayoutError> {
        self.line(index).map(|line| line.width)
    }

    /// Measured tokens of line `index`.
    pub fn line_tokens(&self, index: usize) -> Result<&[PlacedToken], LayoutError> {
        self.line(index).map(|line| line.entries.as_slice())
    }

    /// Widest trimmed line, 0 when there are no lines.
    pub fn max_line_width(&self) -> f32 {
        self.lines.iter().map(|line| line.width).fold(0.0, f32::max)
    }

    /// Display text of every line.
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }
}

/// A block of markup text laid out into lines of a fixed width.
#[derive(Clone)]
pub struct Paragraph {
    text: String,
    config: ParagraphConfig,
    wrap: Arc<dyn WrapFunction>,
    measurer: Arc<dyn TextMeasurer>,
    last: Option<LaidOutParagraph>,
}

impl core::fmt::Debug for Paragraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Paragraph")
            .field("text", &self.text)
            .field("config", &self.config)
            .field("has_layout", &self.last.is_some())
            .finish()
    }
}

impl Paragraph {
    /// Create a paragraph with the default wrap function and heuristic metrics.
    pub fn new(text: impl Into<String>, config: ParagraphConfig) -> Self {
        Self {
            text: text.into(),
            config,
            wrap: Arc::new(DefaultWrapFunction),
            measurer: Arc::new(HeuristicMeasurer::default()),
            last: None,
        }
    }

    /// Install the function that decides soft wrap points.
    pub fn with_wrap_function(mut self, wrap: Arc<dyn WrapFunction>) -> Self {
        self.wrap = wrap;
        self.last = None;
        self
    }

    /// Install a shared text measurer for glyph-accurate width fitting.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self.last = None;
        self
    }

    /// Lay the paragraph out from scratch.
    pub fn layout(&self) -> Result<LaidOutParagraph, LayoutError> {
        let tokens = tokenize(&self.text, self.wrap.as_ref());
        let lines = LineBreaker::new(
            self.measurer.as_ref(),
            &self.config.fonts,
            self.config.font_size,
            self.config.width,
        )
        .break_lines(&tokens)?;
        Ok(LaidOutParagraph { lines })
    }

    /// Recompute the layout, keep it for the per-line accessors and return
    /// the display lines.
    pub fn compute_lines(&mut self) -> Result<Vec<String>, LayoutError> {
        let laid_out = self.layout()?;
        let texts = laid_out.texts();
        self.last = Some(laid_out);
        Ok(texts)
    }

    /// Result of the latest [`compute_lines`](Self::compute_lines).
    pub fn last_layout(&self) -> Option<&LaidOutParagraph> {
        self.last.as_ref()
    }

    fn cached(&self) -> &LaidOutParagraph {
        static EMPTY: LaidOutParagraph = LaidOutParagraph { lines: Vec::new() };
        self.last.as_ref().unwrap_or(&EMPTY)
    }

    pub fn line_width(&self, index: usize) -> Result<f32, LayoutError> {
        self.cached().line_width(index)
    }

    pub fn line_tokens(&self, index: usize) -> Result<&[PlacedToken], LayoutError> {
        self.cached().line_tokens(index)
    }

    pub fn max_line_width(&self) -> f32 {
        self.cached().max_line_width()
    }

    /// Line height of the regular face at the base size.
    pub fn font_height(&self) -> f32 {
        self.measurer.line_height(&self.config.regular_style())
    }

    /// Total height of a fresh layout.
    pub fn height(&self) -> Result<f32, LayoutError> {
        let laid_out = self.layout()?;
        Ok(laid_out.line_count() as f32 * self.font_height())
    }

    /// Budget left over by `line` measured in the regular face.
    pub fn horizontal_free_space(&self, line: &str) -> Result<f32, LayoutError> {
        let trimmed = line.trim();
        let width = self
            .measurer
            .measure_text(trimmed, &self.config.regular_style())
            .map_err(|err| LayoutError::measurement(trimmed, err))?;
        Ok(self.config.width - width)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn config(&self) -> &ParagraphConfig {
        &self.config
    }

    pub fn width(&self) -> f32 {
        self.config.width
    }

    pub fn font_size(&self) -> f32 {
        self.config.font_size
    }

    pub fn fonts(&self) -> &FontSet {
        &self.config.fonts
    }

    pub fn align(&self) -> HorizontalAlignment {
        self.config.align
    }

    pub fn color(&self) -> Rgb {
        self.config.color
    }

    pub fn decoration(&self) -> Option<TextDecoration> {
        self.config.decoration
    }

    pub fn draw_debug(&self) -> bool {
        self.config.draw_debug
    }

    pub fn wrap_function(&self) -> &dyn WrapFunction {
        self.wrap.as_ref()
    }

    pub fn text_measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn set_align(&mut self, align: HorizontalAlignment) {
        self.config.align = align;
    }

    pub fn set_draw_debug(&mut self, draw_debug: bool) {
        self.config.draw_debug = draw_debug;
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.config.color = color;
    }

    /// Changing the budget invalidates the cached layout.
    pub fn set_width(&mut self, width: f32) {
        self.config.width = width;
        self.last = None;
    }

    pub fn set_font(&mut self, fonts: FontSet) {
        self.config.fonts = fonts;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeasureError;
    use crate::token::Token;

    struct WideMeasurer;

    impl TextMeasurer for WideMeasurer {
        fn measure_text(&self, text: &str, _style: &RunStyle) -> Result<f32, MeasureError> {
            Ok(text.chars().count() as f32 * 10.0)
        }

        fn average_char_width(&self, _style: &RunStyle) -> Result<f32, MeasureError> {
            Ok(10.0)
        }

        fn ascent(&self, _style: &RunStyle) -> f32 {
            9.0
        }

        fn descent(&self, _style: &RunStyle) -> f32 {
            3.0
        }
    }

    fn paragraph(text: &str, width: f32) -> Paragraph {
        Paragraph::new(text, ParagraphConfig::for_width(width, 10.0))
            .with_text_measurer(Arc::new(WideMeasurer))
    }

    #[test]
    fn default_config_values() {
        let cfg = ParagraphConfig::default();
        assert_eq!(cfg.width, 500.0);
        assert_eq!(cfg.font_size, 12.0);
        assert_eq!(cfg.fonts.regular().family.as_ref(), "Helvetica");
        assert_eq!(cfg.align, HorizontalAlignment::Left);
        assert_eq!(cfg.color, Rgb::BLACK);
        assert_eq!(cfg.decoration, None);
        assert!(!cfg.draw_debug);
    }

    #[test]
    fn accessors_fail_before_compute() {
        let p = paragraph("hello", 100.0);
        assert_eq!(
            p.line_width(0),
            Err(LayoutError::IndexOutOfRange {
                index: 0,
                line_count: 0
            })
        );
        assert_eq!(p.max_line_width(), 0.0);
    }

    #[test]
    fn compute_lines_caches_widths_and_tokens() {
        let mut p = paragraph("hello world", 100.0);
        let lines = p.compute_lines().unwrap();
        assert_eq!(lines, vec!["hello", "world"]);
        assert_eq!(p.line_width(1).unwrap(), 50.0);
        assert_eq!(p.max_line_width(), 50.0);
        let tokens: Vec<&Token> = p.line_tokens(1).unwrap().iter().map(|e| &e.token).collect();
        assert!(tokens.contains(&&Token::text("world")));
        assert!(matches!(
            p.line_width(2),
            Err(LayoutError::IndexOutOfRange {
                index: 2,
                line_count: 2
            })
        ));
    }

    #[test]
    fn height_uses_regular_line_height() {
        let p = paragraph("hello world", 100.0);
        assert_eq!(p.font_height(), 12.0);
        assert_eq!(p.height().unwrap(), 24.0);
    }

    #[test]
    fn set_width_drops_cached_layout() {
        let mut p = paragraph("hello world", 100.0);
        p.compute_lines().unwrap();
        p.set_width(500.0);
        assert!(p.last_layout().is_none());
        assert_eq!(p.compute_lines().unwrap(), vec!["hello world"]);
    }

    #[test]
    fn free_space_and_alignment_offsets() {
        let p = paragraph("", 100.0);
        assert_eq!(p.horizontal_free_space("  abc ").unwrap(), 70.0);
        assert_eq!(HorizontalAlignment::Left.offset(100.0, 30.0), 0.0);
        assert_eq!(HorizontalAlignment::Center.offset(100.0, 30.0), 35.0);
        assert_eq!(HorizontalAlignment::Right.offset(100.0, 30.0), 70.0);
        assert_eq!(
            HorizontalAlignment::from_name("RIGHT"),
            Some(HorizontalAlignment::Right)
        );
    }

    #[test]
    fn custom_wrap_function_controls_soft_breaks() {
        fn never_split(text: &str) -> Vec<&str> {
            vec![text]
        }
        let mut p = paragraph("aaa bbb", 50.0).with_wrap_function(Arc::new(never_split));
        // Without soft points the only option is a character split.
        assert_eq!(p.compute_lines().unwrap(), vec!["aaa", "bbb"]);
    }

    #[test]
    fn luminance_orders_colors() {
        assert_eq!(Rgb::BLACK.luminance(), 0);
        assert_eq!(Rgb::WHITE.luminance(), 255);
    }
}
