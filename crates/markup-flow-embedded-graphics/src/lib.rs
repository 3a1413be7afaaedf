//! embedded-graphics renderer for `markup-flow` paragraphs.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_10X20, FONT_6X13_BOLD, FONT_6X13_ITALIC, FONT_6X9, FONT_7X13_ITALIC, FONT_7X14,
            FONT_7X14_BOLD, FONT_8X13, FONT_8X13_BOLD, FONT_8X13_ITALIC, FONT_9X18,
            FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use markup_flow::{
    FontVariant, LaidOutParagraph, LayoutError, MeasureError, Paragraph, PlacedToken, Rgb,
    RunStyle, TextDecoration, TextMeasurer, Token,
};

/// Backend-local font identifier used for metrics and rasterization dispatch.
pub type FontId = u8;

/// Why style-to-font mapping had to fall back to an approximate face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontFallbackReason {
    UnknownFamily,
    UnsupportedWeightItalic,
}

/// Resolved font selection for a run style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSelection {
    pub font_id: FontId,
    pub fallback_reason: Option<FontFallbackReason>,
}

/// Backend-provided metrics for a specific font id, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: i32,
    pub line_height: i32,
    /// Distance from the top of the line box to the baseline.
    pub baseline: i32,
}

/// Font abstraction used by the measurer and the renderer.
pub trait FontBackend {
    fn resolve_font(&self, style: &RunStyle) -> FontSelection;
    fn metrics(&self, font_id: FontId) -> FontMetrics;
    /// Whether `ch`, after normalization, can be drawn with `font_id`.
    fn has_glyph(&self, font_id: FontId, ch: char) -> bool;
    /// Draw `text` with its top-left corner at `origin`; returns the advance.
    fn draw_text_run<D>(
        &self,
        display: &mut D,
        font_id: FontId,
        text: &str,
        origin: Point,
        color: BinaryColor,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>;
}

/// `TextMeasurer` adapter backed by a `FontBackend`, so line fitting uses
/// the same width model as the renderer.
#[derive(Clone, Debug)]
pub struct EgTextMeasurer<B = MonoFontBackend> {
    backend: B,
}

impl EgTextMeasurer<MonoFontBackend> {
    /// Create a default measurer using the mono backend.
    pub fn new() -> Self {
        Self {
            backend: MonoFontBackend,
        }
    }

    /// Create a shared measurer trait object for paragraph wiring.
    pub fn shared() -> Arc<dyn TextMeasurer> {
        Arc::new(Self::new())
    }
}

impl Default for EgTextMeasurer<MonoFontBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> EgTextMeasurer<B>
where
    B: FontBackend,
{
    /// Create a measurer using an explicit backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    fn metrics_for(&self, style: &RunStyle) -> FontMetrics {
        let selection = self.backend.resolve_font(style);
        self.backend.metrics(selection.font_id)
    }
}

/// Attach mono-font measurement to a paragraph so that wrapping decisions
/// match what [`EgParagraphRenderer`] draws.
pub fn with_embedded_text_measurer(paragraph: Paragraph) -> Paragraph {
    paragraph.with_text_measurer(EgTextMeasurer::shared())
}

impl<B> TextMeasurer for EgTextMeasurer<B>
where
    B: FontBackend + Send + Sync,
{
    fn measure_text(&self, text: &str, style: &RunStyle) -> Result<f32, MeasureError> {
        let selection = self.backend.resolve_font(style);
        let metrics = self.backend.metrics(selection.font_id);
        let normalized = normalize_text_for_mono(text);
        let mut chars = 0i32;
        for ch in normalized.chars() {
            if !self.backend.has_glyph(selection.font_id, ch) {
                return Err(MeasureError::missing_glyph(ch));
            }
            chars += 1;
        }
        Ok((chars * metrics.char_width) as f32)
    }

    fn average_char_width(&self, style: &RunStyle) -> Result<f32, MeasureError> {
        Ok(self.metrics_for(style).char_width as f32)
    }

    fn ascent(&self, style: &RunStyle) -> f32 {
        self.metrics_for(style).baseline as f32
    }

    fn descent(&self, style: &RunStyle) -> f32 {
        let metrics = self.metrics_for(style);
        (metrics.line_height - metrics.baseline) as f32
    }

    fn line_height(&self, style: &RunStyle) -> f32 {
        self.metrics_for(style).line_height as f32
    }
}

/// Mono-font backend built on the embedded-graphics ASCII fonts.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontBackend;

impl MonoFontBackend {
    const SIZE_SMALL: FontId = 0;
    const SIZE_MEDIUM: FontId = 1;
    const SIZE_LARGE: FontId = 2;
    const SIZE_XL: FontId = 3;

    const VARIANT_REGULAR: FontId = 0;
    const VARIANT_ITALIC: FontId = 1;
    const VARIANT_BOLD: FontId = 2;
    const VARIANT_BOLD_ITALIC: FontId = 3;

    fn encode_font_id(size_bucket: FontId, variant: FontId) -> FontId {
        (size_bucket << 2) | (variant & 0x03)
    }

    fn decode_font_id(font_id: FontId) -> (FontId, FontId) {
        ((font_id >> 2) & 0x03, font_id & 0x03)
    }

    fn size_bucket_for(size: f32) -> FontId {
        if size >= 24.0 {
            Self::SIZE_XL
        } else if size >= 20.0 {
            Self::SIZE_LARGE
        } else if size >= 16.0 {
            Self::SIZE_MEDIUM
        } else {
            Self::SIZE_SMALL
        }
    }

    fn variant_for(variant: FontVariant) -> FontId {
        match variant {
            FontVariant::Regular => Self::VARIANT_REGULAR,
            FontVariant::Italic => Self::VARIANT_ITALIC,
            FontVariant::Bold => Self::VARIANT_BOLD,
            FontVariant::BoldItalic => Self::VARIANT_BOLD_ITALIC,
        }
    }

    /// Font for an id, with the approximation made when the exact variant is missing.
    pub fn font_for(font_id: FontId) -> (&'static MonoFont<'static>, Option<FontFallbackReason>) {
        let (size_bucket, variant) = Self::decode_font_id(font_id);
        match (size_bucket, variant) {
            (Self::SIZE_SMALL, Self::VARIANT_REGULAR) => (&FONT_6X9, None),
            (Self::SIZE_SMALL, Self::VARIANT_ITALIC) => (&FONT_6X13_ITALIC, None),
            (Self::SIZE_SMALL, Self::VARIANT_BOLD) => (&FONT_6X13_BOLD, None),
            (Self::SIZE_SMALL, _) => (
                &FONT_6X13_BOLD,
                Some(FontFallbackReason::UnsupportedWeightItalic),
            ),
            (Self::SIZE_MEDIUM, Self::VARIANT_REGULAR) => (&FONT_7X14, None),
            (Self::SIZE_MEDIUM, Self::VARIANT_ITALIC) => (&FONT_7X13_ITALIC, None),
            (Self::SIZE_MEDIUM, Self::VARIANT_BOLD) => (&FONT_7X14_BOLD, None),
            (Self::SIZE_MEDIUM, _) => (
                &FONT_7X14_BOLD,
                Some(FontFallbackReason::UnsupportedWeightItalic),
            ),
            (Self::SIZE_LARGE, Self::VARIANT_REGULAR) => (&FONT_8X13, None),
            (Self::SIZE_LARGE, Self::VARIANT_ITALIC) => (&FONT_8X13_ITALIC, None),
            (Self::SIZE_LARGE, Self::VARIANT_BOLD) => (&FONT_8X13_BOLD, None),
            (Self::SIZE_LARGE, _) => (
                &FONT_8X13_BOLD,
                Some(FontFallbackReason::UnsupportedWeightItalic),
            ),
            (_, Self::VARIANT_REGULAR) => (&FONT_10X20, None),
            (_, Self::VARIANT_ITALIC) => (
                &FONT_9X18,
                Some(FontFallbackReason::UnsupportedWeightItalic),
            ),
            (_, Self::VARIANT_BOLD) => (&FONT_9X18_BOLD, None),
            (_, _) => (
                &FONT_9X18_BOLD,
                Some(FontFallbackReason::UnsupportedWeightItalic),
            ),
        }
    }

    fn family_supported(family: &str) -> bool {
        let family = family.trim().to_ascii_lowercase();
        matches!(
            family.as_str(),
            "monospace" | "mono" | "fixed" | "serif" | "sans-serif" | "helvetica" | "courier"
        ) || family.contains("mono")
    }
}

impl FontBackend for MonoFontBackend {
    fn resolve_font(&self, style: &RunStyle) -> FontSelection {
        let variant = FontVariant::from_flags(style.face.is_bold(), style.face.italic);
        let font_id =
            Self::encode_font_id(Self::size_bucket_for(style.size), Self::variant_for(variant));
        let (_, style_fallback) = Self::font_for(font_id);
        let fallback_reason = style_fallback.or_else(|| {
            (!Self::family_supported(&style.face.family))
                .then_some(FontFallbackReason::UnknownFamily)
        });
        FontSelection {
            font_id,
            fallback_reason,
        }
    }

    fn metrics(&self, font_id: FontId) -> FontMetrics {
        let (font, _) = Self::font_for(font_id);
        FontMetrics {
            char_width: (font.character_size.width + font.character_spacing) as i32,
            line_height: font.character_size.height as i32,
            baseline: font.baseline as i32,
        }
    }

    fn has_glyph(&self, _font_id: FontId, ch: char) -> bool {
        ch == ' ' || ch.is_ascii_graphic()
    }

    fn draw_text_run<D>(
        &self,
        display: &mut D,
        font_id: FontId,
        text: &str,
        origin: Point,
        color: BinaryColor,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let (font, _) = Self::font_for(font_id);
        let style = MonoTextStyle::new(font, color);
        let normalized = normalize_text_for_mono(text);
        Text::with_baseline(normalized.as_ref(), origin, style, Baseline::Top).draw(display)?;
        let advance = (font.character_size.width + font.character_spacing) as i32;
        Ok(normalized.chars().count() as i32 * advance)
    }
}

/// Map typographic punctuation onto the ASCII glyphs mono fonts carry.
fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|ch| {
        matches!(
            ch,
            '\t' | '\u{00A0}' // nbsp
                | '\u{2022}' // bullet
                | '\u{2013}' // en dash
                | '\u{2014}' // em dash
                | '\u{2018}' // left single quote
                | '\u{2019}' // right single quote
                | '\u{201C}' // left double quote
                | '\u{201D}' // right double quote
                | '\u{2026}' // ellipsis
        )
    }) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\t' | '\u{00A0}' => out.push(' '),
            '\u{2022}' => out.push('*'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Renderer options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgRenderConfig {
    /// Clear the display before drawing the paragraph.
    pub clear_first: bool,
    /// Pixels between the baseline and the underline.
    pub underline_gap_px: i32,
}

impl Default for EgRenderConfig {
    fn default() -> Self {
        Self {
            clear_first: false,
            underline_gap_px: 1,
        }
    }
}

/// Rendering failure.
#[derive(Debug)]
pub enum EgRenderError<E> {
    /// The draw target rejected a primitive.
    Draw(E),
    /// Layout failed or the paragraph asks for something the renderer cannot draw.
    Layout(LayoutError),
}

impl<E> From<LayoutError> for EgRenderError<E> {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl<E: fmt::Debug> fmt::Display for EgRenderError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draw(err) => write!(f, "draw target error: {:?}", err),
            Self::Layout(err) => write!(f, "layout error: {}", err),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for EgRenderError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Draw(_) => None,
            Self::Layout(err) => Some(err),
        }
    }
}

/// Draws laid-out paragraphs onto embedded-graphics targets.
#[derive(Clone, Debug)]
pub struct EgParagraphRenderer<B = MonoFontBackend> {
    cfg: EgRenderConfig,
    backend: B,
}

impl Default for EgParagraphRenderer<MonoFontBackend> {
    fn default() -> Self {
        Self::new(EgRenderConfig::default())
    }
}

impl EgParagraphRenderer<MonoFontBackend> {
    pub fn new(cfg: EgRenderConfig) -> Self {
        Self {
            cfg,
            backend: MonoFontBackend,
        }
    }
}

/// Binary color closest to an RGB text color.
pub fn binary_color(color: Rgb) -> BinaryColor {
    if color.luminance() < 128 {
        BinaryColor::On
    } else {
        BinaryColor::Off
    }
}

/// Index range of the entries that survive trimming.
fn content_bounds(entries: &[PlacedToken]) -> Option<(usize, usize)> {
    let visible = |entry: &PlacedToken| match &entry.token {
        Token::Text(literal) => !literal.trim().is_empty(),
        token => token.is_synthetic(),
    };
    let first = entries.iter().position(visible)?;
    let last = entries.iter().rposition(visible)?;
    Some((first, last))
}

impl<B> EgParagraphRenderer<B>
where
    B: FontBackend,
{
    /// Create renderer with config and backend.
    pub fn with_backend(cfg: EgRenderConfig, backend: B) -> Self {
        Self { cfg, backend }
    }

    pub fn config(&self) -> &EgRenderConfig {
        &self.cfg
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Lay out `paragraph` and draw it with its top-left corner at `origin`.
    ///
    /// Returns the y coordinate just below the last line.
    pub fn render<D>(
        &self,
        paragraph: &Paragraph,
        display: &mut D,
        origin: Point,
    ) -> Result<i32, EgRenderError<D::Error>>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let laid_out = paragraph.layout()?;
        self.render_layout(paragraph, &laid_out, display, origin)
    }

    /// Draw an existing layout of `paragraph`.
    pub fn render_layout<D>(
        &self,
        paragraph: &Paragraph,
        laid_out: &LaidOutParagraph,
        display: &mut D,
        origin: Point,
    ) -> Result<i32, EgRenderError<D::Error>>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let underline = match paragraph.decoration() {
            None => false,
            Some(TextDecoration::Underline) => true,
            Some(other) => return Err(LayoutError::UnsupportedDecoration(other).into()),
        };
        let color = binary_color(paragraph.color());
        let budget = paragraph.width();
        let regular = paragraph
            .fonts()
            .style(FontVariant::Regular, paragraph.font_size());
        let regular_selection = self.backend.resolve_font(&regular);
        let regular_metrics = self.backend.metrics(regular_selection.font_id);
        let line_height = regular_metrics.line_height;

        if self.cfg.clear_first {
            display.clear(BinaryColor::Off).map_err(EgRenderError::Draw)?;
        }
        if paragraph.draw_debug() {
            self.draw_debug_guides(display, origin, budget, regular_metrics, color)
                .map_err(EgRenderError::Draw)?;
        }

        let mut fallback = regular_selection.fallback_reason;
        let mut y = origin.y;
        for line in &laid_out.lines {
            let offset = paragraph.align().offset(budget, line.width).max(0.0);
            let x = origin.x + offset.round() as i32;
            let line_fallback = self
                .draw_line_tokens(display, &line.entries, Point::new(x, y), color)
                .map_err(EgRenderError::Draw)?;
            fallback = fallback.or(line_fallback);

            if underline && line.width > 0.0 {
                let underline_y = y + regular_metrics.baseline + self.cfg.underline_gap_px;
                let end_x = x + line.width.round() as i32;
                Line::new(Point::new(x, underline_y), Point::new(end_x, underline_y))
                    .into_styled(PrimitiveStyle::with_stroke(color, 1))
                    .draw(display)
                    .map_err(EgRenderError::Draw)?;
            }
            y += line_height;
        }

        if let Some(reason) = fallback {
            log::warn!(
                "approximated font for {:?} ({:?})",
                paragraph.fonts().regular().family,
                reason
            );
        }
        log::debug!("rendered {} lines, y {} -> {}", laid_out.lines.len(), origin.y, y);
        Ok(y)
    }

    /// Draw a line's measured runs left to right, trimming outer whitespace.
    fn draw_line_tokens<D>(
        &self,
        display: &mut D,
        entries: &[PlacedToken],
        origin: Point,
        color: BinaryColor,
    ) -> Result<Option<FontFallbackReason>, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some((first, last)) = content_bounds(entries) else {
            return Ok(None);
        };
        let mut fallback = None;
        let mut x = origin.x as f32;
        for (idx, entry) in entries.iter().enumerate().take(last + 1).skip(first) {
            let Some(style) = entry.style.as_ref() else {
                continue;
            };
            if let Token::Padding(width) = entry.token {
                x += width;
                continue;
            }
            let full = entry.token.display_text();
            let mut text: &str = &full;
            if idx == first {
                text = text.trim_start();
            }
            if idx == last {
                text = text.trim_end();
            }
            if text.is_empty() {
                continue;
            }
            let selection = self.backend.resolve_font(style);
            fallback = fallback.or(selection.fallback_reason);
            let advance = self.backend.draw_text_run(
                display,
                selection.font_id,
                text,
                Point::new(x.round() as i32, origin.y),
                color,
            )?;
            x += advance as f32;
        }
        Ok(fallback)
    }

    fn draw_debug_guides<D>(
        &self,
        display: &mut D,
        origin: Point,
        budget: f32,
        metrics: FontMetrics,
        color: BinaryColor,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let width = budget.max(1.0).round() as u32;
        Rectangle::new(origin, Size::new(width, metrics.line_height.max(1) as u32))
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(display)?;
        let baseline_y = origin.y + metrics.baseline;
        Line::new(
            Point::new(origin.x, baseline_y),
            Point::new(origin.x + width as i32 - 1, baseline_y),
        )
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display)?;
        Ok(())
    }
}
