use scraper::{ElementRef, Html};

use crate::dom;
use crate::model::{TocEntry, TocMap};

use super::TocLocator;

const TOC_PHRASES: &[&str] = &[
    "table of contents",
    "index to financial statements",
    "item 1.",
    "item 1a",
    "part i",
    "part ii",
    "item 1 ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TableScore {
    pub(crate) item_mentions: usize,
    pub(crate) has_links: bool,
    pub(crate) phrase_hits: usize,
}

impl TableScore {
    pub(crate) fn qualifies(&self) -> bool {
        self.item_mentions >= 2 && (self.has_links || self.item_mentions >= 3)
    }
}

impl TocLocator {
    pub(crate) fn score_table(&self, table: ElementRef<'_>) -> TableScore {
        let text = self.normalizer.clean(&dom::block_text(table, ' ')).to_lowercase();
        TableScore {
            item_mentions: self.item_mention.find_iter(&text).count(),
            has_links: dom::has_descendant(table, &["a"]),
            phrase_hits: TOC_PHRASES
                .iter()
                .filter(|phrase| text.contains(*phrase))
                .count(),
        }
    }

    pub(crate) fn find_toc_table<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let mut best: Option<(TableScore, ElementRef<'a>)> = None;

        for table in dom::find_all(document.root_element(), &["table"]) {
            let score = self.score_table(table);
            if !score.qualifies() {
                continue;
            }

            let better = match &best {
                Some((best_score, _)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((score, table));
            }
        }

        best.map(|(_, table)| table)
    }

    pub(crate) fn parse_table_rows(&self, table: ElementRef<'_>) -> TocMap {
        let mut toc = TocMap::new();

        for row in dom::find_all(table, &["tr"]) {
            let row_text = self.normalizer.clean(&dom::block_text(row, ' '));
            let item_numbers = self.tokenizer.item_numbers(&row_text);
            if item_numbers.is_empty() {
                continue;
            }

            let anchor = first_fragment_link(row)
                .or_else(|| dom::attr(&row, "id").map(str::to_string));

            let mut title = self.tokenizer.clean_title(&row_text);
            if title.chars().count() > self.limits.max_title_chars {
                title.clear();
            }

            for item_number in &item_numbers {
                toc.offer(TocEntry::new(item_number, anchor.clone(), &title));
            }
        }

        toc
    }
}

fn first_fragment_link(row: ElementRef<'_>) -> Option<String> {
    dom::find_all(row, &["a"])
        .into_iter()
        .filter_map(|link| dom::attr(&link, "href"))
        .find_map(href_fragment)
}

pub(crate) fn href_fragment(href: &str) -> Option<String> {
    href.trim()
        .split('#')
        .nth(1)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_fragment_handles_local_and_remote_links() {
        assert_eq!(href_fragment("#item1a").as_deref(), Some("item1a"));
        assert_eq!(href_fragment("filing.htm#item7").as_deref(), Some("item7"));
        assert_eq!(href_fragment("filing.htm"), None);
        assert_eq!(href_fragment("#"), None);
    }

    #[test]
    fn table_score_requires_links_or_many_mentions() {
        let linked = TableScore {
            item_mentions: 2,
            has_links: true,
            phrase_hits: 0,
        };
        let unlinked = TableScore {
            item_mentions: 2,
            has_links: false,
            phrase_hits: 3,
        };
        let dense = TableScore {
            item_mentions: 3,
            has_links: false,
            phrase_hits: 0,
        };

        assert!(linked.qualifies());
        assert!(!unlinked.qualifies());
        assert!(dense.qualifies());
        assert!(dense > linked);
    }
}
