use std::path::{Path, PathBuf};

/// Plain prose with punctuation-driven wrap points.
pub const PROSE: &str = "It was a bright cold day in April, and the clocks were \
striking thirteen. Winston Smith, his chin nuzzled into his breast in an effort \
to escape the vile wind, slipped quickly through the glass doors of Victory \
Mansions, though not quickly enough to prevent a swirl of gritty dust from \
entering along with him.";

/// Inline styles and explicit breaks.
pub const STYLED: &str = "The <b>first rule</b> of layout is that <i>every line</i> \
fits the budget.<br>The second rule: <b><i>bold italic</i></b> runs measure \
wider than regular ones.<br/>Third, breaks are kept.";

/// Paragraph blocks with lists between them.
pub const LISTS: &str = "<p>Shopping list for the week:</p> <ul><li>fresh bread \
from the corner bakery</li><li>two litres of milk</li><li>a bag of apples, \
preferably green ones</li></ul> <p>Steps to follow:</p> <ol><li>preheat the \
oven</li><li>mix the dry ingredients together</li><li>bake for forty \
minutes</li></ol> <p>Enjoy the result.</p>";

/// Long unbreakable runs mixed with ordinary words.
pub const LONG_WORDS: &str = "short words then \
Pneumonoultramicroscopicsilicovolcanoconiosis and \
0123456789012345678901234567890123456789 before the end";

pub const SAMPLES: &[(&str, &str)] = &[
    ("prose", PROSE),
    ("styled", STYLED),
    ("lists", LISTS),
];

/// Widths wide enough that no ordinary word in [`SAMPLES`] needs splitting.
pub const WIDTHS: &[f32] = &[140.0, 200.0, 320.0, 480.0];

/// Repeat every sample until the document reaches `min_bytes`.
pub fn long_document(min_bytes: usize) -> String {
    let mut out = String::with_capacity(min_bytes + PROSE.len());
    while out.len() < min_bytes {
        for (_, sample) in SAMPLES {
            out.push_str(sample);
            out.push_str("<br>");
        }
    }
    out
}

/// Extra `.txt` markup documents dropped under `tests/fixtures/markup`.
pub fn discover_optional_corpus() -> Vec<PathBuf> {
    let root = Path::new("tests/fixtures/markup");
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("txt"))
        .collect();
    out.sort();
    out
}
