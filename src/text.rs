use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub const PAGE_BREAK_TOKEN: &str = "[[PAGE_BREAK]]";

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    whitespace: Regex,
    page_number_line: Regex,
    part_label: Regex,
    table_caption: Regex,
    form_footer: Regex,
    company_suffix: Regex,
    company_year: Regex,
    pipe_lead: Regex,
    pipes: Regex,
    item_prefix: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            page_number_line: Regex::new(r"(?i)^(?:page\s+)?\d{1,4}(?:\s+of\s+\d{1,4})?$")
                .context("failed to compile page number regex")?,
            part_label: Regex::new(r"(?i)^part\s+[ivxlcdm]+\.?$")
                .context("failed to compile part label regex")?,
            table_caption: Regex::new(r"(?i)^table\s+\d+(?:\.\d+)*[:.]?(?:\s|$)")
                .context("failed to compile table caption regex")?,
            form_footer: Regex::new(r"(?i)\|\s*\d{4}\s*form\s*10-[kq]\s*\|")
                .context("failed to compile form footer regex")?,
            company_suffix: Regex::new(r"^[a-z&\s]+\s(?:inc|corp|ltd|llc|co)\.?$")
                .context("failed to compile company suffix regex")?,
            company_year: Regex::new(r"^[\w&]+\s+(?:inc|corp|ltd|llc|co)\.?\s*\|\s*\d{4}")
                .context("failed to compile company year regex")?,
            pipe_lead: Regex::new(r"^(?:inc|form|10-?[kq])\s*\|")
                .context("failed to compile pipe lead regex")?,
            pipes: Regex::new(r"^\|+$").context("failed to compile pipe separator regex")?,
            item_prefix: Regex::new(r"(?i)^\s*items?\s+\d{1,2}[a-z]?\s*[.:\-]?\s*")
                .context("failed to compile item prefix regex")?,
        })
    }

    pub fn clean(&self, input: &str) -> String {
        let folded = fold_punctuation(&normalize_unicode(input));
        self.collapse_whitespace(&folded)
    }

    pub fn collapse_whitespace(&self, input: &str) -> String {
        self.whitespace.replace_all(input, " ").trim().to_string()
    }

    pub fn is_page_number_line(&self, line: &str) -> bool {
        self.page_number_line.is_match(line.trim())
    }

    pub fn is_page_marker(&self, text: &str) -> bool {
        text.contains(PAGE_BREAK_TOKEN) || self.form_footer.is_match(text)
    }

    pub fn is_noise_line(&self, text: &str) -> bool {
        let normalized = text.trim().to_lowercase();
        if matches!(
            normalized.as_str(),
            "table of contents" | "index to exhibits" | "index to financial statements"
        ) {
            return true;
        }

        self.part_label.is_match(&normalized)
            || self.table_caption.is_match(&normalized)
            || self.is_page_number_line(&normalized)
    }

    pub fn is_artifact_phrase(&self, chunk: &str) -> bool {
        let normalized = chunk.trim().to_lowercase();
        if normalized.is_empty() {
            return true;
        }

        if normalized.len() <= 3 && normalized.chars().all(|character| character.is_ascii_digit()) {
            return true;
        }

        if matches!(
            normalized.as_str(),
            "table of contents" | "page" | "form" | "10-k" | "10-q" | "10-k/a" | "10-q/a" | "form 10-k summary"
        ) {
            return true;
        }

        let article_led = matches!(normalized.split_whitespace().next(), Some("the" | "a" | "an"));
        if (!article_led && self.company_suffix.is_match(&normalized))
            || self.company_year.is_match(&normalized)
            || self.pipe_lead.is_match(&normalized)
            || self.pipes.is_match(&normalized)
        {
            return true;
        }

        normalized.chars().count() <= 2
            && !normalized.chars().all(|character| character.is_alphanumeric())
    }

    pub fn strip_item_prefix<'a>(&self, title: &'a str) -> &'a str {
        match self.item_prefix.find(title) {
            Some(found) => &title[found.end()..],
            None => title,
        }
    }
}

pub fn normalize_unicode(input: &str) -> String {
    input
        .nfkc()
        .filter(|character| !is_format_control(*character))
        .collect()
}

fn is_format_control(character: char) -> bool {
    matches!(
        character,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

pub fn fold_punctuation(input: &str) -> String {
    input
        .chars()
        .map(|character| match character {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{02BC}'
            | '\u{00B4}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            '\u{2022}' | '\u{25CF}' | '\u{25A0}' | '\u{25AA}' | '\u{25E6}' | '\u{2043}'
            | '\u{2219}' | '\u{00B7}' => ' ',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect()
}

pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }

    let mut boundary = index;
    while !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    boundary
}

pub fn bounded_prefix(text: &str, max_bytes: usize) -> &str {
    &text[..floor_char_boundary(text, max_bytes)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new().expect("patterns should compile")
    }

    #[test]
    fn clean_folds_quotes_dashes_and_invisible_marks() {
        let text = normalizer().clean("Management\u{2019}s\u{200B} Discussion \u{2014}\u{00A0}Overview\n\n");
        assert_eq!(text, "Management's Discussion - Overview");
    }

    #[test]
    fn clean_applies_compatibility_normalization() {
        assert_eq!(normalizer().clean("\u{FB01}nancial"), "financial");
    }

    #[test]
    fn noise_lines_cover_navigation_and_page_numbers() {
        let normalizer = normalizer();
        assert!(normalizer.is_noise_line("Table of Contents"));
        assert!(normalizer.is_noise_line("PART II"));
        assert!(normalizer.is_noise_line("Page 12 of 140"));
        assert!(normalizer.is_noise_line("47"));
        assert!(!normalizer.is_noise_line("Item 7. Management's Discussion"));
    }

    #[test]
    fn artifact_phrases_cover_footer_stamps() {
        let normalizer = normalizer();
        assert!(normalizer.is_artifact_phrase("23"));
        assert!(normalizer.is_artifact_phrase("Apple Inc."));
        assert!(normalizer.is_artifact_phrase("Apple Inc. | 2022"));
        assert!(normalizer.is_artifact_phrase("|"));
        assert!(normalizer.is_artifact_phrase("Form 10-K Summary"));
        assert!(!normalizer.is_artifact_phrase("revenue"));
        assert!(!normalizer.is_artifact_phrase("2023"));
    }

    #[test]
    fn article_led_company_references_are_not_artifacts() {
        let normalizer = normalizer();
        assert!(!normalizer.is_artifact_phrase("the Corporation"));
        assert!(!normalizer.is_artifact_phrase("by the Corporation."));
        assert!(!normalizer.is_artifact_phrase("the Acme Co."));
        assert!(normalizer.is_artifact_phrase("Acme Co."));
    }

    #[test]
    fn page_marker_detects_token_and_form_footer() {
        let normalizer = normalizer();
        assert!(normalizer.is_page_marker(PAGE_BREAK_TOKEN));
        assert!(normalizer.is_page_marker("Apple Inc. | 2022 Form 10-K | 14"));
        assert!(!normalizer.is_page_marker("Form 10-K"));
    }

    #[test]
    fn floor_char_boundary_steps_back_inside_multibyte_char() {
        let text = "ab\u{2014}cd";
        assert_eq!(floor_char_boundary(text, 3), 2);
        assert_eq!(bounded_prefix(text, 4), "ab");
        assert_eq!(bounded_prefix(text, 100), text);
    }

    #[test]
    fn strip_item_prefix_removes_label() {
        let normalizer = normalizer();
        assert_eq!(normalizer.strip_item_prefix("Item 1A. Risk Factors"), "Risk Factors");
        assert_eq!(normalizer.strip_item_prefix("Risk Factors"), "Risk Factors");
    }
}
