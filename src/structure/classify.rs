use anyhow::{Context, Result};
use regex::Regex;

use crate::text::TextNormalizer;

pub const MIN_HEADING_CHARS: usize = 3;
pub const MAX_HEADING_CHARS: usize = 220;
/// Bold, period-terminated headings (risk factor captions) may run longer.
pub const MAX_BOLD_SENTENCE_HEADING_CHARS: usize = 520;
pub const MAX_LAYER3_SENTENCE_CHARS: usize = 260;
pub const HEADING_SCORE_THRESHOLD: i32 = 3;
pub const SHORT_HEADING_WORDS: usize = 18;
pub const UPPERCASE_RATIO: f64 = 0.60;
pub const CAPITALIZED_WORD_RATIO: f64 = 0.60;
pub const TITLE_LIKE_MAX_WORDS: usize = 12;
pub const TITLE_CASE_MIN_WORDS: usize = 4;
pub const LONG_SENTENCE_CHARS: usize = 140;
pub const SHORT_BOLD_HEADING_CHARS: usize = 90;
pub const MAX_LEAD_IN_CHARS: usize = 120;
pub const NAME_INTRO_MIN_CHARS: usize = 40;
pub const NAME_INTRO_LABEL_WINDOW: usize = 80;

pub const BOLD_WEIGHT: i32 = 2;
pub const EMPHASIS_WEIGHT: i32 = 1;
pub const CENTERED_WEIGHT: i32 = 1;
pub const SHORT_WEIGHT: i32 = 1;
pub const UPPERCASE_WEIGHT: i32 = 1;
pub const TITLE_SHAPE_WEIGHT: i32 = 1;
pub const LONG_PLAIN_SENTENCE_PENALTY: i32 = -2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub centered: bool,
    pub bold_only_bullet: bool,
    pub table: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingStyle {
    Item,
    Bold,
    BoldSentence,
    Italic,
    Underline,
    Styled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Heading { layer: u8, style: HeadingStyle },
    Body,
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingSignals {
    pub bold: bool,
    pub emphasized: bool,
    pub centered: bool,
    pub short: bool,
    pub mostly_uppercase: bool,
    pub title_shape: bool,
    pub long_plain_sentence: bool,
}

impl HeadingSignals {
    pub fn score(&self) -> i32 {
        [
            (self.bold, BOLD_WEIGHT),
            (self.emphasized, EMPHASIS_WEIGHT),
            (self.centered, CENTERED_WEIGHT),
            (self.short, SHORT_WEIGHT),
            (self.mostly_uppercase, UPPERCASE_WEIGHT),
            (self.title_shape, TITLE_SHAPE_WEIGHT),
            (self.long_plain_sentence, LONG_PLAIN_SENTENCE_PENALTY),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum()
    }
}

#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    normalizer: TextNormalizer,
    item_heading: Regex,
    title_shape: Regex,
    word: Regex,
    name_intro: Vec<Regex>,
}

impl HeadingClassifier {
    pub fn new() -> Result<Self> {
        let name_intro = [
            r"^(?:Mr|Ms|Mrs|Dr)\.\s+[A-Z][A-Za-z'\-]+(?:\s+[A-Z][A-Za-z'\-]+){0,3}\s+is\b",
            r"^[A-Z][A-Za-z'\-]+(?:\s+[A-Z][A-Za-z'\-]+){1,4}\s*,\s*\d{1,3}\s*,?\s+has\b",
            r"^[A-Z][A-Za-z'\-]+(?:\s+[A-Z][A-Za-z'\-]+){1,4}\s+is\b",
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).context("failed to compile name intro regex"))
        .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            normalizer: TextNormalizer::new()?,
            item_heading: Regex::new(r"(?i)^\s*items?\s+\d+[a-z]?\b")
                .context("failed to compile item heading regex")?,
            title_shape: Regex::new(r"^[A-Z][A-Za-z0-9,&/\-'(). ]+$")
                .context("failed to compile title shape regex")?,
            word: Regex::new(r"[A-Za-z][A-Za-z'\-]*").context("failed to compile word regex")?,
            name_intro,
        })
    }

    pub fn is_item_heading(&self, text: &str) -> bool {
        self.item_heading.is_match(text)
    }

    pub fn signals(&self, text: &str, style: &BlockStyle) -> HeadingSignals {
        let length = text.chars().count();
        HeadingSignals {
            bold: style.bold,
            emphasized: style.italic || style.underline,
            centered: style.centered,
            short: text.split_whitespace().count() <= SHORT_HEADING_WORDS,
            mostly_uppercase: uppercase_ratio(text) >= UPPERCASE_RATIO,
            title_shape: self.title_shape.is_match(text) && !text.ends_with('.'),
            long_plain_sentence: length > LONG_SENTENCE_CHARS && text.ends_with('.') && !style.bold,
        }
    }

    pub fn classify(&self, text: &str, style: &BlockStyle) -> Classification {
        if text.is_empty() || self.normalizer.is_page_marker(text) || self.normalizer.is_noise_line(text) {
            return Classification::Ignored;
        }

        let length = text.chars().count();
        if style.table || length < MIN_HEADING_CHARS {
            return Classification::Body;
        }

        if self.is_item_heading(text) {
            return heading(1, HeadingStyle::Item);
        }

        if style.bold && (self.is_name_intro(text) || style.bold_only_bullet) {
            return Classification::Body;
        }

        let period_terminated = text.ends_with('.');
        if length > MAX_HEADING_CHARS
            && !(style.bold && period_terminated && length <= MAX_BOLD_SENTENCE_HEADING_CHARS)
        {
            return Classification::Body;
        }

        let signals = self.signals(text, style);
        // Bold alone is enough: long bold captions never reach the threshold
        // on shape signals.
        if signals.score() < HEADING_SCORE_THRESHOLD && !style.bold {
            return Classification::Body;
        }

        if style.bold {
            if self.is_title_like(text) {
                return heading(2, HeadingStyle::Bold);
            }
            if period_terminated && length <= MAX_LAYER3_SENTENCE_CHARS {
                return heading(3, HeadingStyle::BoldSentence);
            }
            if !period_terminated && self.is_title_case_heading(text) {
                return heading(2, HeadingStyle::Bold);
            }
            if style.centered || signals.mostly_uppercase || length <= SHORT_BOLD_HEADING_CHARS {
                return heading(2, HeadingStyle::Bold);
            }
        }

        if style.italic {
            return heading(3, HeadingStyle::Italic);
        }
        if style.underline {
            return heading(3, HeadingStyle::Underline);
        }
        heading(3, HeadingStyle::Styled)
    }

    fn is_title_like(&self, text: &str) -> bool {
        let words = self.words(text);
        !words.is_empty()
            && words.len() <= TITLE_LIKE_MAX_WORDS
            && capitalized_ratio(&words) >= CAPITALIZED_WORD_RATIO
    }

    fn is_title_case_heading(&self, text: &str) -> bool {
        if text.ends_with('.') || text.chars().count() > MAX_LAYER3_SENTENCE_CHARS {
            return false;
        }
        let words = self.words(text);
        words.len() >= TITLE_CASE_MIN_WORDS && capitalized_ratio(&words) >= CAPITALIZED_WORD_RATIO
    }

    fn is_name_intro(&self, text: &str) -> bool {
        let length = text.chars().count();
        if !(NAME_INTRO_MIN_CHARS..=MAX_BOLD_SENTENCE_HEADING_CHARS).contains(&length) {
            return false;
        }
        if text.chars().take(NAME_INTRO_LABEL_WINDOW).any(|character| character == ':') {
            return false;
        }
        self.name_intro.iter().any(|pattern| pattern.is_match(text))
    }

    fn words<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.word.find_iter(text).map(|found| found.as_str()).collect()
    }
}

fn heading(layer: u8, style: HeadingStyle) -> Classification {
    Classification::Heading { layer, style }
}

fn uppercase_ratio(text: &str) -> f64 {
    let letters = text.chars().filter(char::is_ascii_alphabetic);
    let (upper, total) = letters.fold((0usize, 0usize), |(upper, total), character| {
        (upper + usize::from(character.is_ascii_uppercase()), total + 1)
    });
    if total == 0 {
        return 0.0;
    }
    upper as f64 / total as f64
}

fn capitalized_ratio(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let capitalized = words
        .iter()
        .filter(|word| word.chars().next().is_some_and(|first| first.is_ascii_uppercase()))
        .count();
    capitalized as f64 / words.len() as f64
}
