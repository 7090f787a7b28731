use scraper::{ElementRef, Html};

use crate::dom;
use crate::model::{TocEntry, TocMap};

use super::TocLocator;

const HEADING_LIKE_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "p", "div"];

const HEADING_TEXT_LIMIT: usize = 2_000;

impl TocLocator {
    pub(crate) fn parse_headings(&self, document: &Html) -> TocMap {
        let mut toc = TocMap::new();
        let mut scanned = 0usize;
        let mut last_named_anchor: Option<(usize, String)> = None;

        for (position, element) in dom::elements(document.root_element()).enumerate() {
            if scanned >= self.limits.heading_scan_limit
                || toc.len() >= self.limits.heading_max_items
            {
                break;
            }

            if dom::tag_name(&element) == "a" {
                if let Some(name) = dom::attr(&element, "name").filter(|name| !name.trim().is_empty()) {
                    last_named_anchor = Some((position, name.to_string()));
                }
                continue;
            }

            if !HEADING_LIKE_TAGS.contains(&dom::tag_name(&element)) {
                continue;
            }
            scanned += 1;

            let Some(raw) = dom::block_text_within(element, ' ', HEADING_TEXT_LIMIT) else {
                continue;
            };
            let text = self.normalizer.clean(&raw);
            let Some(item_number) = self.tokenizer.item_number(&text) else {
                continue;
            };

            let anchor = own_anchor(element).or_else(|| {
                last_named_anchor
                    .as_ref()
                    .filter(|(anchor_position, _)| {
                        position - anchor_position < self.limits.preceding_anchor_elements
                    })
                    .map(|(_, name)| name.clone())
            });

            toc.offer(TocEntry::new(&item_number, anchor, &self.tokenizer.clean_title(&text)));
        }

        toc
    }
}

fn own_anchor(element: ElementRef<'_>) -> Option<String> {
    let direct = dom::attr(&element, "id").or_else(|| dom::attr(&element, "name"));
    if let Some(value) = direct {
        return Some(value.to_string());
    }

    let nested = dom::find_all(element, &["a"]).into_iter().next()?;
    dom::attr(&nested, "name")
        .or_else(|| dom::attr(&nested, "id"))
        .map(str::to_string)
}
