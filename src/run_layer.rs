//! Ordered buffer of measured tokens.

use smallvec::SmallVec;

use crate::error::LayoutError;
use crate::metrics::{RunStyle, TextMeasurer};
use crate::token::Token;

/// A token with the style it was measured under and its width.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlacedToken {
    pub token: Token,
    /// `None` for tags, which carry no glyphs.
    pub style: Option<RunStyle>,
    /// Untrimmed width.
    pub width: f32,
    #[cfg_attr(feature = "serde", serde(skip))]
    trimmed: TrimmedWidths,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TrimmedWidths {
    start: f32,
    end: f32,
    both: f32,
}

impl TrimmedWidths {
    fn untrimmed(width: f32) -> Self {
        Self {
            start: width,
            end: width,
            both: width,
        }
    }
}

impl PlacedToken {
    fn tag(token: Token) -> Self {
        Self {
            token,
            style: None,
            width: 0.0,
            trimmed: TrimmedWidths::default(),
        }
    }

    /// Visible content that trimming must keep: synthetic spacing or text
    /// with at least one non-whitespace character.
    fn has_content(&self) -> bool {
        match &self.token {
            Token::Text(literal) => !literal.trim().is_empty(),
            token => token.is_synthetic(),
        }
    }
}

fn measure(
    measurer: &dyn TextMeasurer,
    text: &str,
    style: &RunStyle,
) -> Result<f32, LayoutError> {
    measurer
        .measure_text(text, style)
        .map_err(|err| LayoutError::measurement(text, err))
}

fn measure_text_entry(
    measurer: &dyn TextMeasurer,
    literal: &str,
    style: &RunStyle,
) -> Result<(f32, TrimmedWidths), LayoutError> {
    let width = measure(measurer, literal, style)?;
    let trimmed_start = literal.trim_start();
    let trimmed_end = literal.trim_end();
    let trimmed_both = literal.trim();
    if trimmed_both.len() == literal.len() {
        return Ok((width, TrimmedWidths::untrimmed(width)));
    }
    if trimmed_both.is_empty() {
        return Ok((width, TrimmedWidths::default()));
    }

    let start = if trimmed_start.len() == literal.len() {
        width
    } else {
        measure(measurer, trimmed_start, style)?
    };
    let end = if trimmed_end.len() == literal.len() {
        width
    } else {
        measure(measurer, trimmed_end, style)?
    };
    let both = if trimmed_both.len() == trimmed_end.len() {
        end
    } else if trimmed_both.len() == trimmed_start.len() {
        start
    } else {
        measure(measurer, trimmed_both, style)?
    };
    Ok((width, TrimmedWidths { start, end, both }))
}

/// Ordered, mutable buffer of measured tokens with a cached total width.
///
/// Trimming only affects what is reported; entries keep their full widths.
#[derive(Clone, Debug, Default)]
pub struct RunLayer {
    entries: SmallVec<[PlacedToken; 8]>,
    width: f32,
}

impl RunLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure `token` under `style` and append it.
    pub fn push(
        &mut self,
        measurer: &dyn TextMeasurer,
        style: &RunStyle,
        token: Token,
    ) -> Result<(), LayoutError> {
        let (width, trimmed) = match &token {
            Token::Text(literal) => measure_text_entry(measurer, literal, style)?,
            Token::Padding(width) => {
                let width = width.max(0.0);
                (width, TrimmedWidths::untrimmed(width))
            }
            Token::Bullet(_) | Token::Ordinal(_) => {
                let width = measure(measurer, &token.display_text(), style)?;
                (width, TrimmedWidths::untrimmed(width))
            }
            Token::OpenTag(_) | Token::CloseTag(_) | Token::WrapPoint(_) | Token::PossibleWrapPoint => {
                self.push_tag(token);
                return Ok(());
            }
        };
        self.width += width;
        self.entries.push(PlacedToken {
            token,
            style: Some(style.clone()),
            width,
            trimmed,
        });
        Ok(())
    }

    /// Append a zero-width marker token.
    pub fn push_tag(&mut self, token: Token) {
        self.entries.push(PlacedToken::tag(token));
    }

    /// Move every entry of `other` to the end of this layer, leaving `other`
    /// empty.
    pub fn push_layer(&mut self, other: &mut RunLayer) {
        self.width += other.width;
        self.entries.extend(other.entries.drain(..));
        other.reset();
    }

    /// Sum of all entry widths.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Width with leading and trailing whitespace text left out.
    ///
    /// Tags and whitespace-only text at either end are skipped; the outermost
    /// visible text entries contribute their trimmed widths. Padding, bullets
    /// and ordinals are never trimmed.
    pub fn trimmed_width(&self) -> f32 {
        let Some(first) = self.entries.iter().position(PlacedToken::has_content) else {
            return 0.0;
        };
        let last = self
            .entries
            .iter()
            .rposition(PlacedToken::has_content)
            .unwrap_or(first);

        let mut width = 0.0;
        for (idx, entry) in self.entries[first..=last].iter().enumerate() {
            let idx = first + idx;
            width += match (idx == first, idx == last) {
                (true, true) => entry.trimmed.both,
                (true, false) => entry.trimmed.start,
                (false, true) => entry.trimmed.end,
                (false, false) => entry.width,
            };
        }
        width
    }

    /// Display text of all entries with surrounding whitespace stripped.
    pub fn trimmed_text(&self) -> String {
        let mut text = String::with_capacity(32);
        for entry in &self.entries {
            text.push_str(&entry.token.display_text());
        }
        let trimmed = text.trim();
        if trimmed.len() == text.len() {
            text
        } else {
            trimmed.to_string()
        }
    }

    pub fn entries(&self) -> &[PlacedToken] {
        &self.entries
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.entries.iter().map(|entry| &entry.token)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether anything survives trimming.
    pub fn has_visible_content(&self) -> bool {
        self.entries.iter().any(PlacedToken::has_content)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.width = 0.0;
    }

    /// Drain the entries into an owned vector, leaving the layer empty.
    pub(crate) fn take_entries(&mut self) -> Vec<PlacedToken> {
        self.width = 0.0;
        core::mem::take(&mut self.entries).into_vec()
    }
}
