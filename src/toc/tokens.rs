use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone)]
pub(crate) struct ItemTokenizer {
    combined: Regex,
    item: Regex,
    part_item: Regex,
    numbered: Regex,
    glued: Regex,
    leading_numbered: Regex,
    leading_spaced: Regex,
    trailing_page: Regex,
}

impl ItemTokenizer {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            // Two-number rows only ("Items 1 and 2"); wider combinations are
            // left to the per-token patterns below.
            combined: Regex::new(
                r"(?i)\bitems?\s+(\d{1,2}[a-z]?)\s*[.:]?\s+and\s+(\d{1,2}[a-z]?)\b",
            )
            .context("failed to compile combined item regex")?,
            item: Regex::new(r"(?i)\bitem\s+(\d{1,2}[a-z]?)\b")
                .context("failed to compile item token regex")?,
            part_item: Regex::new(r"(?i)\bpart\s+[ivx]+\s*[.:\-]?\s*(\d{1,2}[a-z]?)\s*[.:]")
                .context("failed to compile part item regex")?,
            numbered: Regex::new(r"(?i)(?:^|[^\d])(\d{1,2}[a-z]?)\s*[.:]\s*[a-z]")
                .context("failed to compile numbered row regex")?,
            glued: Regex::new(r"^\s*(\d{1,2})(?:([A-Z])[A-Z]|[A-Za-z])")
                .context("failed to compile glued item regex")?,
            leading_numbered: Regex::new(r"(?i)^\s*(\d{1,2}[a-z]?)\s*[.:\-]\s*[a-z]")
                .context("failed to compile leading numbered regex")?,
            leading_spaced: Regex::new(r"(?i)^\s*(\d{1,2}[a-z]?)\s+[a-z]")
                .context("failed to compile leading spaced regex")?,
            trailing_page: Regex::new(r"(\.)?\s*#?\s*\d+(?:\s*-\s*\d+)?\s*$")
                .context("failed to compile trailing page regex")?,
        })
    }

    pub(crate) fn item_numbers(&self, text: &str) -> Vec<String> {
        let mut found = Vec::<String>::new();

        if let Some(captures) = self.combined.captures(text) {
            for group in [captures.get(1), captures.get(2)].into_iter().flatten() {
                push_unique(&mut found, group.as_str());
            }
        }

        for captures in self.item.captures_iter(text) {
            if let Some(group) = captures.get(1) {
                push_unique(&mut found, group.as_str());
            }
        }

        if found.is_empty() {
            for pattern in [&self.part_item, &self.numbered] {
                for captures in pattern.captures_iter(text) {
                    if let Some(group) = captures.get(1) {
                        push_unique(&mut found, group.as_str());
                    }
                }
            }
        }

        if found.is_empty() {
            if let Some(single) = self.item_number(text) {
                found.push(single);
            }
        }

        found
    }

    pub(crate) fn item_number(&self, text: &str) -> Option<String> {
        if let Some(group) = self.item.captures(text).and_then(|captures| captures.get(1)) {
            return Some(group.as_str().to_ascii_uppercase());
        }

        for pattern in [&self.leading_numbered, &self.leading_spaced] {
            if let Some(group) = pattern.captures(text).and_then(|captures| captures.get(1)) {
                return Some(group.as_str().to_ascii_uppercase());
            }
        }

        // "1ARisk Factors" vs "1Business": a suffix letter only counts when
        // another capital follows it directly.
        let captures = self.glued.captures(text)?;
        let number = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let suffix = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        Some(format!("{number}{suffix}"))
    }

    pub(crate) fn clean_title(&self, text: &str) -> String {
        let title = text.trim();
        let Some(captures) = self.trailing_page.captures(title) else {
            return title.to_string();
        };
        let Some(whole) = captures.get(0) else {
            return title.to_string();
        };

        let head = title[..whole.start()].trim_end();
        if head.is_empty() || ends_with_item_label(head) {
            return title.to_string();
        }

        if captures.get(1).is_some() {
            format!("{head}.")
        } else {
            head.to_string()
        }
    }
}

fn push_unique(found: &mut Vec<String>, token: &str) {
    let token = token.to_ascii_uppercase();
    if !found.contains(&token) {
        found.push(token);
    }
}

fn ends_with_item_label(head: &str) -> bool {
    let last_word = head
        .rsplit(|character: char| character.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(last_word.as_str(), "item" | "items" | "and" | "&" | "part")
}
