use std::borrow::Cow;

/// Glyph used for unordered list items.
pub const BULLET: char = '\u{2022}';

/// Markup tags understood by the line breaker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Tag {
    Bold,
    Italic,
    Paragraph,
    ListItem,
    UnorderedList,
    OrderedList,
}

impl Tag {
    /// Markup name as written between angle brackets.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Paragraph => "p",
            Self::ListItem => "li",
            Self::UnorderedList => "ul",
            Self::OrderedList => "ol",
        }
    }

    /// Parse a markup name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" => Some(Self::Bold),
            "i" => Some(Self::Italic),
            "p" => Some(Self::Paragraph),
            "li" => Some(Self::ListItem),
            "ul" => Some(Self::UnorderedList),
            "ol" => Some(Self::OrderedList),
            _ => None,
        }
    }

    /// Whether this tag opens or closes a list.
    pub fn is_list(self) -> bool {
        matches!(self, Self::UnorderedList | Self::OrderedList)
    }
}

/// What a mandatory wrap marker stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WrapKind {
    /// Opening `<p>`.
    Paragraph,
    /// Opening `<li>`: the start of a list item label.
    ListItem,
    /// `<br>` or a newline in the source.
    LineBreak,
}

/// Unit of the layout input stream.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "data", rename_all = "snake_case"))]
pub enum Token {
    OpenTag(Tag),
    CloseTag(Tag),
    Text(String),
    /// Mandatory break opportunity.
    WrapPoint(WrapKind),
    /// Soft break opportunity, taken only on overflow.
    PossibleWrapPoint,
    /// Synthetic horizontal space with a precomputed width.
    Padding(f32),
    /// Unordered list bullet.
    Bullet(char),
    /// Ordered list label such as `3.`.
    Ordinal(String),
}

impl Token {
    /// Convenience constructor for literal text.
    pub fn text(literal: impl Into<String>) -> Self {
        Self::Text(literal.into())
    }

    /// Label token for the `n`-th ordered list item.
    pub fn ordinal(n: u32) -> Self {
        Self::Ordinal(format!("{}.", n))
    }

    /// Text this token contributes to a line's display string.
    ///
    /// List markers carry their trailing separator space so that a line reads
    /// `• item` or `2. item`.
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(literal) => Cow::Borrowed(literal.as_str()),
            Self::Bullet(glyph) => {
                let mut out = String::with_capacity(glyph.len_utf8() + 1);
                out.push(*glyph);
                out.push(' ');
                Cow::Owned(out)
            }
            Self::Ordinal(label) => Cow::Owned(format!("{} ", label)),
            Self::OpenTag(_)
            | Self::CloseTag(_)
            | Self::WrapPoint(_)
            | Self::PossibleWrapPoint
            | Self::Padding(_) => Cow::Borrowed(""),
        }
    }

    /// Literal payload for text tokens.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(literal) => Some(literal),
            _ => None,
        }
    }

    /// Padding, bullets and ordinals: spacing the layout inserts itself.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Padding(_) | Self::Bullet(_) | Self::Ordinal(_))
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Self::OpenTag(_) | Self::CloseTag(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_round_trip() {
        for tag in [
            Tag::Bold,
            Tag::Italic,
            Tag::Paragraph,
            Tag::ListItem,
            Tag::UnorderedList,
            Tag::OrderedList,
        ] {
            assert_eq!(Tag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(Tag::from_name("u"), None);
    }

    #[test]
    fn list_markers_carry_separator_space() {
        assert_eq!(Token::Bullet(BULLET).display_text(), "\u{2022} ");
        assert_eq!(Token::ordinal(12).display_text(), "12. ");
        assert_eq!(Token::Padding(8.0).display_text(), "");
        assert_eq!(Token::OpenTag(Tag::Bold).display_text(), "");
    }

    #[test]
    fn synthetic_and_tag_classification() {
        assert!(Token::Padding(1.0).is_synthetic());
        assert!(Token::ordinal(1).is_synthetic());
        assert!(!Token::text("a").is_synthetic());
        assert!(Token::CloseTag(Tag::Italic).is_tag());
        assert!(!Token::PossibleWrapPoint.is_tag());
    }
}
