//! Single-pass greedy line breaker over the markup token stream.

use crate::error::LayoutError;
use crate::metrics::{FontSet, FontVariant, RunStyle, TextMeasurer};
use crate::run_layer::{PlacedToken, RunLayer};
use crate::token::{Tag, Token, WrapKind, BULLET};

/// Spaces making up one list tab.
const LIST_TAB: &str = "    ";
/// Continuation indent of an unordered list item: tab plus bullet.
const LIST_TAB_AND_BULLET: &str = "      ";

/// One laid-out line.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Line {
    /// Display text with surrounding whitespace trimmed.
    pub text: String,
    /// Trimmed width in measurer units.
    pub width: f32,
    /// Measured tokens composing the line, tags included.
    pub entries: Vec<PlacedToken>,
}

impl Line {
    /// Blank line emitted between paragraphs and after lists.
    pub fn separator() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.entries.iter().map(|entry| &entry.token)
    }

    /// Whether the line carries no tokens at all.
    pub fn is_separator(&self) -> bool {
        self.entries.is_empty() && self.text.is_empty()
    }
}

/// Inline style and list context threaded through one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StyleState {
    bold: bool,
    italic: bool,
    ordered_list: bool,
    next_ordinal: u32,
    list_element: bool,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            ordered_list: false,
            next_ordinal: 1,
            list_element: false,
        }
    }
}

impl StyleState {
    fn variant(self) -> FontVariant {
        FontVariant::from_flags(self.bold, self.italic)
    }

    fn with_bold(self, bold: bool) -> Self {
        Self { bold, ..self }
    }

    fn with_italic(self, italic: bool) -> Self {
        Self { italic, ..self }
    }

    fn with_list_element(self, list_element: bool) -> Self {
        Self {
            list_element,
            ..self
        }
    }

    fn enter_ordered_list(self) -> Self {
        Self {
            ordered_list: true,
            next_ordinal: 1,
            ..self
        }
    }

    fn leave_list(self) -> Self {
        Self {
            ordered_list: false,
            next_ordinal: 1,
            ..self
        }
    }

    /// Label for the next list item and the state after emitting it.
    fn next_label(self) -> (Token, Self) {
        if self.ordered_list {
            let label = Token::ordinal(self.next_ordinal);
            let next = Self {
                next_ordinal: self.next_ordinal.saturating_add(1),
                ..self
            };
            (label, next)
        } else {
            (Token::Bullet(BULLET), self)
        }
    }

    /// Ordinal of the item currently being laid out.
    fn current_ordinal(self) -> u32 {
        self.next_ordinal.saturating_sub(1).max(1)
    }
}

/// Greedy line breaker for a fixed width budget.
#[derive(Clone, Copy)]
pub struct LineBreaker<'a> {
    measurer: &'a dyn TextMeasurer,
    fonts: &'a FontSet,
    font_size: f32,
    width: f32,
}

impl<'a> LineBreaker<'a> {
    pub fn new(
        measurer: &'a dyn TextMeasurer,
        fonts: &'a FontSet,
        font_size: f32,
        width: f32,
    ) -> Self {
        Self {
            measurer,
            fonts,
            font_size,
            width,
        }
    }

    /// Width budget `W`.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Break `tokens` into lines.
    ///
    /// Measurement failures abort the whole pass and report the index of the
    /// token being processed.
    pub fn break_lines(&self, tokens: &[Token]) -> Result<Vec<Line>, LayoutError> {
        log::debug!(
            "breaking {} tokens at width {} (size {})",
            tokens.len(),
            self.width,
            self.font_size
        );
        let mut pass = Pass::new(self);
        for (index, token) in tokens.iter().enumerate() {
            pass.step(token).map_err(|err| err.at_token(index))?;
        }
        let lines = pass.finish();
        log::debug!("produced {} lines", lines.len());
        Ok(lines)
    }
}

/// Mutable state of one breaking pass.
struct Pass<'b, 'a> {
    breaker: &'b LineBreaker<'a>,
    state: StyleState,
    committed: RunLayer,
    pending: RunLayer,
    lines: Vec<Line>,
}

impl<'b, 'a> Pass<'b, 'a> {
    fn new(breaker: &'b LineBreaker<'a>) -> Self {
        Self {
            breaker,
            state: StyleState::default(),
            committed: RunLayer::new(),
            pending: RunLayer::new(),
            lines: Vec::new(),
        }
    }

    fn active_style(&self) -> RunStyle {
        self.breaker
            .fonts
            .style(self.state.variant(), self.breaker.font_size)
    }

    fn regular_style(&self) -> RunStyle {
        self.breaker
            .fonts
            .style(FontVariant::Regular, self.breaker.font_size)
    }

    fn measure(&self, text: &str, style: &RunStyle) -> Result<f32, LayoutError> {
        self.breaker
            .measurer
            .measure_text(text, style)
            .map_err(|err| LayoutError::measurement(text, err))
    }

    fn overflows(&self) -> bool {
        self.committed.width() + self.pending.trimmed_width() > self.breaker.width
    }

    fn merge_pending(&mut self) {
        self.committed.push_layer(&mut self.pending);
    }

    fn finalize(&mut self) {
        let line = Line {
            text: self.committed.trimmed_text(),
            width: self.committed.trimmed_width(),
            entries: self.committed.take_entries(),
        };
        log::trace!("line {}: {:?} ({})", self.lines.len(), line.text, line.width);
        self.lines.push(line);
    }

    fn separator(&mut self) {
        self.lines.push(Line::separator());
    }

    /// Finalize the current line if it has anything to show.
    fn finalize_visible(&mut self) {
        if self.committed.has_visible_content() {
            self.finalize();
        } else {
            self.committed.reset();
        }
    }

    /// Padding that aligns a wrapped list item's continuation under its text.
    fn push_list_indent(&mut self) -> Result<(), LayoutError> {
        let indent = if self.state.ordered_list {
            format!("{}. {}", self.state.current_ordinal(), LIST_TAB)
        } else {
            LIST_TAB_AND_BULLET.to_string()
        };
        let regular = self.regular_style();
        let width = self.measure(&indent, &regular)?;
        self.committed.push(self.breaker.measurer, &regular, Token::Padding(width))
    }

    /// Break before `pending` when it no longer fits after `committed`.
    fn resolve_overflow(&mut self) -> Result<bool, LayoutError> {
        if !self.overflows() {
            return Ok(false);
        }
        self.finalize_visible();
        if self.state.list_element {
            self.push_list_indent()?;
        }
        self.merge_pending();
        Ok(true)
    }

    fn step(&mut self, token: &Token) -> Result<(), LayoutError> {
        match token {
            Token::OpenTag(tag) => self.open_tag(*tag, token),
            Token::CloseTag(tag) => self.close_tag(*tag, token),
            Token::PossibleWrapPoint => {
                if !self.resolve_overflow()? {
                    self.merge_pending();
                }
                Ok(())
            }
            Token::WrapPoint(kind) => self.wrap_point(*kind),
            Token::Text(literal) => self.text(literal),
            Token::Padding(_) | Token::Bullet(_) | Token::Ordinal(_) => {
                let style = self.active_style();
                self.pending.push(self.breaker.measurer, &style, token.clone())
            }
        }
    }

    fn open_tag(&mut self, tag: Tag, token: &Token) -> Result<(), LayoutError> {
        match tag {
            Tag::Bold => self.state = self.state.with_bold(true),
            Tag::Italic => self.state = self.state.with_italic(true),
            Tag::OrderedList => {
                self.merge_pending();
                self.finalize();
                self.state = self.state.enter_ordered_list();
            }
            Tag::UnorderedList => {
                self.merge_pending();
                if self.committed.trimmed_width() > 0.0 {
                    self.finalize();
                }
            }
            Tag::Paragraph | Tag::ListItem => {}
        }
        self.pending.push_tag(token.clone());
        Ok(())
    }

    fn close_tag(&mut self, tag: Tag, token: &Token) -> Result<(), LayoutError> {
        match tag {
            Tag::Bold => {
                self.state = self.state.with_bold(false);
                self.pending.push_tag(token.clone());
            }
            Tag::Italic => {
                self.state = self.state.with_italic(false);
                self.pending.push_tag(token.clone());
            }
            Tag::OrderedList | Tag::UnorderedList => {
                self.state = self.state.leave_list();
                self.separator();
            }
            Tag::ListItem => {
                if self.overflows() {
                    self.finalize();
                    self.push_list_indent()?;
                }
                self.merge_pending();
                self.finalize();
                self.state = self.state.with_list_element(false);
            }
            Tag::Paragraph => {
                if self.overflows() {
                    self.finalize();
                }
                self.merge_pending();
                self.finalize();
                self.separator();
            }
        }
        Ok(())
    }

    fn wrap_point(&mut self, kind: WrapKind) -> Result<(), LayoutError> {
        self.resolve_overflow()?;
        match kind {
            WrapKind::Paragraph => {
                // Blank line before a paragraph that starts mid-line; the
                // current line keeps accumulating.
                if self.committed.trimmed_width() > 0.0 {
                    self.separator();
                }
            }
            WrapKind::ListItem => {
                self.state = self.state.with_list_element(true);
                let style = self.active_style();
                let tab = self.measure(LIST_TAB, &self.regular_style())?;
                self.committed
                    .push(self.breaker.measurer, &style, Token::Padding(tab))?;
                let (label, next) = self.state.next_label();
                self.state = next;
                self.committed.push(self.breaker.measurer, &style, label)?;
            }
            WrapKind::LineBreak => {
                self.merge_pending();
                self.finalize();
            }
        }
        Ok(())
    }

    fn text(&mut self, literal: &str) -> Result<(), LayoutError> {
        let style = self.active_style();
        let budget = self.breaker.width;
        let word_width = self.measure(literal, &style)?;
        let average = self
            .breaker
            .measurer
            .average_char_width(&style)
            .map_err(|err| LayoutError::measurement(literal, err))?;

        if word_width <= budget || budget <= average {
            return self
                .pending
                .push(self.breaker.measurer, &style, Token::text(literal));
        }

        let mut already = self.committed.trimmed_width() + self.pending.trimmed_width() > 0.0;
        let mut rest = literal;
        loop {
            let threshold = if already {
                budget - (self.committed.width() + self.pending.width())
            } else {
                budget
            };
            let split = self.split_index(rest, &style, threshold, !already)?;
            let (prefix, remainder) = rest.split_at(split);
            log::trace!(
                "split {:?} into {:?} + {} bytes (threshold {})",
                rest,
                prefix,
                remainder.len(),
                threshold
            );
            if !prefix.is_empty() {
                self.pending
                    .push(self.breaker.measurer, &style, Token::text(prefix))?;
            }
            self.merge_pending();
            self.finalize();
            already = false;
            rest = remainder;
            if rest.is_empty() || self.measure(rest, &style)? <= budget {
                break;
            }
        }
        if !rest.is_empty() {
            self.pending
                .push(self.breaker.measurer, &style, Token::text(rest))?;
        }
        Ok(())
    }

    /// Byte index ending the longest prefix whose cumulative per-character
    /// width does not exceed `threshold`.
    fn split_index(
        &self,
        word: &str,
        style: &RunStyle,
        threshold: f32,
        keep_first: bool,
    ) -> Result<usize, LayoutError> {
        let mut cumulative = 0.0f32;
        for (idx, ch) in word.char_indices() {
            let end = idx + ch.len_utf8();
            cumulative += self.measure(&word[idx..end], style)?;
            if cumulative > threshold {
                if idx == 0 && keep_first {
                    return Ok(end);
                }
                return Ok(idx);
            }
        }
        Ok(word.len())
    }

    fn finish(mut self) -> Vec<Line> {
        if self.committed.trimmed_width() + self.pending.trimmed_width() > 0.0 {
            self.merge_pending();
            self.finalize();
        }
        self.lines
    }
}
