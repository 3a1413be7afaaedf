//! Markup scanner producing the token stream consumed by the line breaker.

use crate::token::{Tag, Token, WrapKind};

/// Splits raw source text into pieces; every piece boundary is a soft wrap point.
pub trait WrapFunction: Send + Sync {
    /// Split `text` into consecutive pieces.
    ///
    /// Pieces are expected to be subslices of `text`; pieces that are not are
    /// located by cumulative length instead.
    fn split_lines<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

impl<F> WrapFunction for F
where
    F: for<'a> Fn(&'a str) -> Vec<&'a str> + Send + Sync,
{
    fn split_lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self(text)
    }
}

/// Splits after whitespace, `-`, `@`, `,`, `.`, `:` and `;`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultWrapFunction;

impl DefaultWrapFunction {
    fn splits_after(ch: char) -> bool {
        ch.is_whitespace() || matches!(ch, '-' | '@' | ',' | '.' | ':' | ';')
    }
}

impl WrapFunction for DefaultWrapFunction {
    fn split_lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::with_capacity(text.len() / 4 + 1);
        let mut start = 0usize;
        for (idx, ch) in text.char_indices() {
            if Self::splits_after(ch) {
                let end = idx + ch.len_utf8();
                pieces.push(&text[start..end]);
                start = end;
            }
        }
        if start < text.len() {
            pieces.push(&text[start..]);
        }
        pieces
    }
}

/// Byte offsets strictly inside `text` where the wrap function allows a break.
pub fn wrap_offsets(text: &str, wrap: &dyn WrapFunction) -> Vec<usize> {
    let base = text.as_ptr() as usize;
    let text_range = base..=base + text.len();
    let mut offsets = Vec::new();
    let mut cumulative = 0usize;
    for piece in wrap.split_lines(text) {
        let start = piece.as_ptr() as usize;
        let end = if text_range.contains(&start) && text_range.contains(&(start + piece.len())) {
            start - base + piece.len()
        } else {
            cumulative + piece.len()
        };
        cumulative = end;
        if end > 0 && end < text.len() && text.is_char_boundary(end) {
            offsets.push(end);
        }
    }
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}

const MARKERS: &[(&str, Token)] = &[
    ("<b>", Token::OpenTag(Tag::Bold)),
    ("</b>", Token::CloseTag(Tag::Bold)),
    ("<i>", Token::OpenTag(Tag::Italic)),
    ("</i>", Token::CloseTag(Tag::Italic)),
    ("<p>", Token::WrapPoint(WrapKind::Paragraph)),
    ("</p>", Token::CloseTag(Tag::Paragraph)),
    ("<li>", Token::WrapPoint(WrapKind::ListItem)),
    ("</li>", Token::CloseTag(Tag::ListItem)),
    ("<ul>", Token::OpenTag(Tag::UnorderedList)),
    ("</ul>", Token::CloseTag(Tag::UnorderedList)),
    ("<ol>", Token::OpenTag(Tag::OrderedList)),
    ("</ol>", Token::CloseTag(Tag::OrderedList)),
    ("<br>", Token::WrapPoint(WrapKind::LineBreak)),
    ("<br/>", Token::WrapPoint(WrapKind::LineBreak)),
    ("<br />", Token::WrapPoint(WrapKind::LineBreak)),
];

fn match_marker(rest: &str) -> Option<(&'static Token, usize)> {
    MARKERS
        .iter()
        .find(|(marker, _)| rest.starts_with(marker))
        .map(|(marker, token)| (token, marker.len()))
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Text(core::mem::take(literal)));
    }
}

/// Tokenize markup text.
///
/// Unknown `<...>` sequences are kept as literal text. Newlines become
/// line-break wrap points. A non-empty stream always ends with a break
/// opportunity so the last word is tested against the width budget.
pub fn tokenize(text: &str, wrap: &dyn WrapFunction) -> Vec<Token> {
    let offsets = wrap_offsets(text, wrap);
    let mut next_wrap = offsets.iter().copied().peekable();
    let mut tokens = Vec::with_capacity(offsets.len() * 2 + 4);
    let mut literal = String::new();
    let mut pos = 0usize;

    while pos < text.len() {
        while let Some(&offset) = next_wrap.peek() {
            if offset > pos {
                break;
            }
            next_wrap.next();
            if offset == pos {
                flush_literal(&mut literal, &mut tokens);
                if !matches!(
                    tokens.last(),
                    Some(Token::WrapPoint(_) | Token::PossibleWrapPoint)
                ) {
                    tokens.push(Token::PossibleWrapPoint);
                }
            }
        }

        let rest = &text[pos..];
        if rest.starts_with('<') {
            if let Some((token, len)) = match_marker(rest) {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(token.clone());
                pos += len;
                continue;
            }
        }
        if rest.starts_with("\r\n") || rest.starts_with('\n') {
            flush_literal(&mut literal, &mut tokens);
            tokens.push(Token::WrapPoint(WrapKind::LineBreak));
            pos += if rest.starts_with('\r') { 2 } else { 1 };
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        literal.push(ch);
        pos += ch.len_utf8();
    }
    flush_literal(&mut literal, &mut tokens);
    if !tokens.is_empty()
        && !matches!(
            tokens.last(),
            Some(Token::WrapPoint(_) | Token::PossibleWrapPoint)
        )
    {
        tokens.push(Token::PossibleWrapPoint);
    }

    log::trace!(
        "tokenized {} bytes into {} tokens ({} wrap offsets)",
        text.len(),
        tokens.len(),
        offsets.len()
    );
    tokens
}
