//! Line breaking for markup-annotated paragraphs.
//!
//! Text with `<b>`, `<i>`, `<p>`, `<br>` and `<ul>`/`<ol>`/`<li>` markup is
//! tokenized, measured through a pluggable [`TextMeasurer`] and broken into
//! lines that fit a fixed width budget.
//!
//! ```
//! use markup_flow::{Paragraph, ParagraphConfig};
//!
//! let mut paragraph = Paragraph::new("hello <b>bold</b> world", ParagraphConfig::default());
//! let lines = paragraph.compute_lines()?;
//! assert_eq!(lines, vec!["hello bold world"]);
//! # Ok::<(), markup_flow::LayoutError>(())
//! ```

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

mod error;
mod line_breaker;
mod metrics;
mod paragraph;
mod run_layer;
mod token;
mod tokenizer;

pub use error::{LayoutError, MeasureError};
pub use line_breaker::{Line, LineBreaker};
pub use metrics::{FontFace, FontSet, FontVariant, HeuristicMeasurer, RunStyle, TextMeasurer};
pub use paragraph::{
    HorizontalAlignment, LaidOutParagraph, Paragraph, ParagraphConfig, Rgb, TextDecoration,
};
pub use run_layer::{PlacedToken, RunLayer};
pub use token::{Tag, Token, WrapKind, BULLET};
pub use tokenizer::{tokenize, wrap_offsets, DefaultWrapFunction, WrapFunction};
