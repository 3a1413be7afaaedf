use core::fmt;

use crate::paragraph::TextDecoration;

/// Failure reported by a [`TextMeasurer`](crate::TextMeasurer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasureError {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Character the oracle could not measure, when known.
    pub ch: Option<char>,
}

impl MeasureError {
    /// Create a measurement error with a code and message.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into().into_boxed_str(),
            ch: None,
        }
    }

    /// Error for a character that has no glyph metrics.
    pub fn missing_glyph(ch: char) -> Self {
        Self {
            code: "MEASURE_MISSING_GLYPH",
            message: format!("no glyph metrics for {:?} (U+{:04X})", ch, ch as u32).into(),
            ch: Some(ch),
        }
    }
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MeasureError {}

/// Layout error.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    /// The width oracle failed while measuring part of the input.
    Measurement {
        /// Index of the token being processed, when the failure came from the stream.
        token_index: Option<usize>,
        /// Text that was being measured.
        text: Box<str>,
        /// Underlying oracle failure.
        source: MeasureError,
    },
    /// A decoration other than underline was requested.
    UnsupportedDecoration(TextDecoration),
    /// A line index that the latest layout never produced.
    IndexOutOfRange { index: usize, line_count: usize },
}

impl LayoutError {
    pub(crate) fn measurement(text: &str, source: MeasureError) -> Self {
        Self::Measurement {
            token_index: None,
            text: text.into(),
            source,
        }
    }

    pub(crate) fn at_token(mut self, index: usize) -> Self {
        if let Self::Measurement { token_index, .. } = &mut self {
            token_index.get_or_insert(index);
        }
        self
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measurement {
                token_index: Some(index),
                text,
                source,
            } => write!(
                f,
                "failed to measure {:?} at token {}: {}",
                text, index, source
            ),
            Self::Measurement {
                token_index: None,
                text,
                source,
            } => write!(f, "failed to measure {:?}: {}", text, source),
            Self::UnsupportedDecoration(decoration) => {
                write!(f, "text decoration not supported: {}", decoration.name())
            }
            Self::IndexOutOfRange { index, line_count } => write!(
                f,
                "line index out of range: {} (line_count={})",
                index, line_count
            ),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Measurement { source, .. } => Some(source),
            _ => None,
        }
    }
}
