mod common;

use common::fixtures::{self, LONG_WORDS, SAMPLES, WIDTHS};
use markup_flow::{
    tokenize, DefaultWrapFunction, FontSet, HeuristicMeasurer, LineBreaker, Paragraph,
    ParagraphConfig, Token,
};

const FONT_SIZE: f32 = 12.0;
const EPSILON: f32 = 0.01;

fn visible_chars(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

fn source_chars(markup: &str) -> String {
    tokenize(markup, &DefaultWrapFunction)
        .iter()
        .filter_map(Token::as_text)
        .flat_map(str::chars)
        .filter(|ch| !ch.is_whitespace())
        .collect()
}

fn laid_out_chars(paragraph: &Paragraph) -> String {
    let laid_out = paragraph.layout().expect("layout should succeed");
    laid_out
        .lines
        .iter()
        .flat_map(|line| line.tokens())
        .filter_map(Token::as_text)
        .flat_map(str::chars)
        .filter(|ch| !ch.is_whitespace())
        .collect()
}

fn all_inputs() -> Vec<(String, String)> {
    let mut inputs: Vec<(String, String)> = SAMPLES
        .iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect();
    inputs.push(("long_words".to_string(), LONG_WORDS.to_string()));
    for path in fixtures::discover_optional_corpus() {
        if let Ok(text) = std::fs::read_to_string(&path) {
            inputs.push((path.display().to_string(), text));
        }
    }
    inputs
}

#[test]
fn every_line_fits_the_budget() {
    for (name, text) in all_inputs() {
        for &width in WIDTHS {
            let paragraph = Paragraph::new(text.as_str(), ParagraphConfig::for_width(width, FONT_SIZE));
            let laid_out = paragraph.layout().expect("layout should succeed");
            assert!(!laid_out.is_empty(), "{} produced no lines", name);
            for (idx, line) in laid_out.lines.iter().enumerate() {
                let single_glyph = visible_chars(&line.text).chars().count() <= 1;
                assert!(
                    line.width <= width + EPSILON || single_glyph,
                    "{} @ {}: line {} {:?} is {} wide",
                    name,
                    width,
                    idx,
                    line.text,
                    line.width
                );
            }
        }
    }
}

#[test]
fn layout_keeps_every_visible_character_in_order() {
    for (name, text) in all_inputs() {
        let expected = source_chars(&text);
        for &width in WIDTHS {
            let paragraph = Paragraph::new(text.as_str(), ParagraphConfig::for_width(width, FONT_SIZE));
            assert_eq!(
                laid_out_chars(&paragraph),
                expected,
                "{} @ {} lost or reordered text",
                name,
                width
            );
        }
    }
}

#[test]
fn max_line_width_is_the_widest_line() {
    for (_, text) in SAMPLES {
        let mut paragraph = Paragraph::new(*text, ParagraphConfig::for_width(200.0, FONT_SIZE));
        let lines = paragraph.compute_lines().expect("layout");
        let widest = (0..lines.len())
            .map(|idx| paragraph.line_width(idx).expect("line width"))
            .fold(0.0f32, f32::max);
        assert_eq!(paragraph.max_line_width(), widest);
        assert!(widest <= 200.0 + EPSILON);
    }
}

#[test]
fn layout_is_deterministic() {
    for (_, text) in SAMPLES {
        let paragraph = Paragraph::new(*text, ParagraphConfig::for_width(200.0, FONT_SIZE));
        let first = paragraph.layout().expect("first layout");
        let second = paragraph.layout().expect("second layout");
        assert_eq!(first, second);
    }
}

#[test]
fn line_breaker_matches_paragraph_layout() {
    let fonts = FontSet::default();
    let measurer = HeuristicMeasurer::default();
    let tokens = tokenize(fixtures::STYLED, &DefaultWrapFunction);
    let direct = LineBreaker::new(&measurer, &fonts, FONT_SIZE, 200.0)
        .break_lines(&tokens)
        .expect("break lines");
    let paragraph = Paragraph::new(fixtures::STYLED, ParagraphConfig::for_width(200.0, FONT_SIZE));
    assert_eq!(direct, paragraph.layout().expect("layout").lines);
}

#[test]
fn explicit_breaks_start_new_lines() {
    let paragraph = Paragraph::new(fixtures::STYLED, ParagraphConfig::for_width(2000.0, FONT_SIZE));
    let texts = paragraph.layout().expect("layout").texts();
    assert_eq!(texts.len(), 3, "{:?}", texts);
    assert!(texts[0].ends_with("budget."), "{:?}", texts);
    assert!(texts[1].starts_with("The second rule"), "{:?}", texts);
    assert_eq!(texts[2], "Third, breaks are kept.");
}

#[test]
fn long_words_are_split_across_lines() {
    let width = 120.0;
    let paragraph = Paragraph::new(LONG_WORDS, ParagraphConfig::for_width(width, FONT_SIZE));
    let texts = paragraph.layout().expect("layout").texts();
    assert!(
        !texts.iter().any(|line| line.contains("Pneumonoultramicroscopicsilicovolcanoconiosis")),
        "long word was not split: {:?}",
        texts
    );
    assert!(texts.first().is_some_and(|line| line.starts_with("short")));
    assert!(texts.last().is_some_and(|line| line.ends_with("end")));
}

#[test]
fn ordered_list_labels_count_up_and_restart() {
    let paragraph = Paragraph::new(fixtures::LISTS, ParagraphConfig::for_width(2000.0, FONT_SIZE));
    let laid_out = paragraph.layout().expect("layout");
    let labels: Vec<String> = laid_out
        .lines
        .iter()
        .flat_map(|line| line.tokens())
        .filter_map(|token| match token {
            Token::Ordinal(label) => Some(label.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["1.", "2.", "3."]);

    let bullets = laid_out
        .lines
        .iter()
        .filter(|line| line.text.starts_with('\u{2022}'))
        .count();
    assert_eq!(bullets, 3);
}
