use anyhow::{Context, Result};
use regex::Regex;

use crate::config::CleanerLimits;
use crate::dom;
use crate::model::ExtractedItem;
use crate::text::{PAGE_BREAK_TOKEN, TextNormalizer, fold_punctuation, normalize_unicode};

#[derive(Debug, Clone)]
pub struct ItemContentCleaner {
    limits: CleanerLimits,
    normalizer: TextNormalizer,
    page_break: Regex,
    leading_page_number: Regex,
    not_applicable: Regex,
    none_disclosure: Regex,
}

impl ItemContentCleaner {
    pub fn new(limits: CleanerLimits) -> Result<Self> {
        Ok(Self {
            limits,
            normalizer: TextNormalizer::new()?,
            page_break: Regex::new(
                r"(?i)<(?:hr|div|p|br)\b[^>]*page-break-(?:before|after)\s*:\s*always[^>]*>",
            )
            .context("failed to compile page break regex")?,
            leading_page_number: Regex::new(r"(?i)^\d{1,3}\s+(?:ITEMS?\s+\d{1,2}[a-z]?\b)")
                .context("failed to compile leading page number regex")?,
            not_applicable: Regex::new(r"(?i)\bnot\s+applicable\b\.?")
                .context("failed to compile not applicable regex")?,
            none_disclosure: Regex::new(r"\b(?:None|NONE)(?:\.|\s*$|\s+[A-Z])")
                .context("failed to compile none disclosure regex")?,
        })
    }

    pub fn clean(&self, html: &str, item_number: &str, toc_title: Option<&str>) -> ExtractedItem {
        let marked = self.mark_page_breaks(html);
        let html_content = dom::fragment_without_scripts(&marked);
        let text_content = self.text_content(&marked, item_number);

        let item_title = toc_title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Item {item_number}"));

        ExtractedItem {
            item_number: item_number.to_string(),
            item_title,
            html_content,
            text_content,
        }
    }

    fn mark_page_breaks(&self, html: &str) -> String {
        self.page_break
            .replace_all(html, |captures: &regex::Captures<'_>| {
                format!("<p>{PAGE_BREAK_TOKEN}</p>{}", &captures[0])
            })
            .into_owned()
    }

    fn text_content(&self, marked_html: &str, item_number: &str) -> String {
        let fragment = dom::parse_fragment(marked_html);
        let raw = dom::block_text(fragment.root_element(), '\n');
        let folded = fold_punctuation(&normalize_unicode(&raw));

        let kept = folded
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                !line.eq_ignore_ascii_case("table of contents")
                    && !self.normalizer.is_page_number_line(line)
            })
            .collect::<Vec<&str>>()
            .join(" ");
        let collapsed = self.normalizer.collapse_whitespace(&kept);

        let pages = collapsed
            .split(PAGE_BREAK_TOKEN)
            .filter_map(|page| self.strip_page_artifacts(page))
            .collect::<Vec<String>>();
        let text = pages.join(" ");

        let text = self.start_at_item_heading(&text, item_number);
        self.truncate_short_disclosure(&text)
    }

    fn strip_page_artifacts(&self, page: &str) -> Option<String> {
        let mut words = page.split_whitespace().collect::<Vec<&str>>();
        if words.is_empty() {
            return None;
        }

        let floor = self.limits.min_residual_words.max(1);
        let max_phrase = self.limits.max_artifact_phrase_words.max(1);

        loop {
            let trailing = (1..=max_phrase)
                .take_while(|count| words.len() >= floor + count)
                .find(|count| self.normalizer.is_artifact_phrase(&words[words.len() - count..].join(" ")));
            let Some(count) = trailing else {
                break;
            };
            words.truncate(words.len() - count);
        }

        loop {
            let leading = (1..=max_phrase)
                .take_while(|count| words.len() >= floor + count)
                .find(|count| self.normalizer.is_artifact_phrase(&words[..*count].join(" ")));
            let Some(count) = leading else {
                break;
            };
            words.drain(..count);
        }

        let residue = words.join(" ");
        if self.normalizer.is_artifact_phrase(&residue) {
            return None;
        }
        Some(residue)
    }

    fn start_at_item_heading(&self, text: &str, item_number: &str) -> String {
        let text = match self.leading_page_number.find(text) {
            Some(_) => text
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim_start())
                .unwrap_or(text),
            None => text,
        };

        let own_heading = format!(
            r"(?i)\bITEMS?\s+{}(?:\b|[.:])",
            regex::escape(item_number)
        );
        let Ok(own_heading) = Regex::new(&own_heading) else {
            return text.to_string();
        };

        match own_heading.find(text) {
            Some(found) if text[..found.start()].chars().count() <= self.limits.heading_cut_window => {
                text[found.start()..].to_string()
            }
            _ => text.to_string(),
        }
    }

    fn truncate_short_disclosure(&self, text: &str) -> String {
        let within_window = |start: usize| {
            text[..start].chars().count() <= self.limits.short_disclosure_window
        };

        let not_applicable = self
            .not_applicable
            .find(text)
            .filter(|found| within_window(found.start()))
            .map(|found| (found.start(), found.end()));

        let none = self
            .none_disclosure
            .find(text)
            .filter(|found| within_window(found.start()))
            .map(|found| {
                let matched = found.as_str();
                let keep = if matched.contains('.') { 5 } else { 4 };
                (found.start(), found.start() + keep)
            });

        let cut = match (not_applicable, none) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };

        match cut {
            Some((_, end)) => text[..end].trim_end().to_string(),
            None => text.to_string(),
        }
    }
}
