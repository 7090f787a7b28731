use scraper::{ElementRef, Html};

use crate::dom;
use crate::model::{TocEntry, TocMap};

use super::TocLocator;
use super::table::href_fragment;

/// Containers checked, in this order, for the item label of a TOC link.
/// Link-only cells ("[Reserved]", a page number) carry their item token in
/// a sibling cell, so the row comes first.
const CONTEXT_TAGS: &[&str] = &["tr", "td", "li", "p", "div"];

const CONTEXT_SCAN_LIMIT: usize = 2_000;

impl TocLocator {
    pub(crate) fn parse_links(&self, document: &Html) -> TocMap {
        let mut toc = TocMap::new();

        for link in dom::find_all(document.root_element(), &["a"]) {
            let Some(anchor) = dom::attr(&link, "href").and_then(href_fragment) else {
                continue;
            };

            let link_text = self.normalizer.clean(&dom::block_text(link, ' '));
            let (context_text, item_numbers) = match self.link_context(link) {
                Some(found) => found,
                None => {
                    let numbers = self.tokenizer.item_number(&link_text).into_iter().collect();
                    (self.nearest_container_text(link).unwrap_or_else(|| link_text.clone()), numbers)
                }
            };
            if item_numbers.is_empty() {
                continue;
            }

            let context_chars = context_text.chars().count();
            let title_source = if context_chars > 0 && context_chars <= self.limits.max_link_context_chars {
                &context_text
            } else {
                &link_text
            };
            let title = self.tokenizer.clean_title(title_source);

            for item_number in &item_numbers {
                toc.offer(TocEntry::new(item_number, Some(anchor.clone()), &title));
            }
        }

        toc
    }

    fn link_context(&self, link: ElementRef<'_>) -> Option<(String, Vec<String>)> {
        for tag in CONTEXT_TAGS {
            let Some(container) = dom::ancestor_of_kind(link, &[*tag]) else {
                continue;
            };
            let Some(raw) = dom::block_text_within(container, ' ', CONTEXT_SCAN_LIMIT) else {
                continue;
            };

            let text = self.normalizer.clean(&raw);
            if text.is_empty() {
                continue;
            }

            let item_numbers = self.tokenizer.item_numbers(&text);
            if !item_numbers.is_empty() {
                return Some((text, item_numbers));
            }
        }

        None
    }

    fn nearest_container_text(&self, link: ElementRef<'_>) -> Option<String> {
        let container = dom::ancestor_of_kind(link, CONTEXT_TAGS)?;
        let raw = dom::block_text_within(container, ' ', CONTEXT_SCAN_LIMIT)?;
        Some(self.normalizer.clean(&raw))
    }
}
