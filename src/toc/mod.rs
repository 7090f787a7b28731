use std::cell::OnceCell;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::config::TocLimits;
use crate::dom;
use crate::error::ExtractError;
use crate::model::{FilingKind, TocMap};
use crate::text::{TextNormalizer, bounded_prefix, floor_char_boundary};

mod headings;
mod links;
mod table;
mod tokens;

#[cfg(test)]
mod tests;

use tokens::ItemTokenizer;

#[derive(Debug, Clone)]
pub struct TocLocator {
    limits: TocLimits,
    normalizer: TextNormalizer,
    tokenizer: ItemTokenizer,
    marker: Regex,
    item_mention: Regex,
}

impl TocLocator {
    pub fn new(limits: TocLimits) -> Result<Self> {
        Ok(Self {
            limits,
            normalizer: TextNormalizer::new()?,
            tokenizer: ItemTokenizer::new().context("failed to build item tokenizer")?,
            marker: Regex::new(r"(?i)table\s+of\s+contents|index\s+to\s+financial\s+statements")
                .context("failed to compile TOC marker regex")?,
            item_mention: Regex::new(r"(?i)\bitems?\s+\d{1,2}[a-z]?")
                .context("failed to compile item mention regex")?,
        })
    }

    pub fn parse_toc(&self, html: &str, kind: &FilingKind) -> Result<TocMap, ExtractError> {
        let marker_region = self.marker_region(html);
        let has_marker = marker_region.is_some();
        let prefix = bounded_prefix(html, self.limits.fallback_prefix_length);
        let region = marker_region.unwrap_or(prefix);

        let region_document = dom::parse_document(region);
        let prefix_cache = OnceCell::new();
        let prefix_links = || {
            prefix_cache
                .get_or_init(|| self.parse_links(&dom::parse_document(prefix)))
                .clone()
        };

        if let Some(table) = self.find_toc_table(&region_document) {
            let mut toc = self.parse_table_rows(table);
            if toc.len() >= self.limits.min_table_entries {
                toc.merge_missing(self.parse_links(&region_document));
                if toc.anchored_count() >= self.limits.min_anchored_table_entries {
                    toc.merge_missing(prefix_links());
                    debug!(filing = %kind, entries = toc.len(), step = "table", "located TOC");
                    return Ok(toc);
                }
            }
        }

        let mut toc = self.parse_links(&region_document);
        if self.accepts_links(&toc) {
            toc.merge_missing(prefix_links());
            debug!(filing = %kind, entries = toc.len(), step = "region_links", "located TOC");
            return Ok(toc);
        }

        let toc = prefix_links();
        if self.accepts_links(&toc) {
            debug!(filing = %kind, entries = toc.len(), step = "prefix_links", "located TOC");
            return Ok(toc);
        }

        if prefix.len() < html.len() {
            let toc = self.parse_links(&dom::parse_document(html));
            if self.accepts_links(&toc) {
                debug!(filing = %kind, entries = toc.len(), step = "document_links", "located TOC");
                return Ok(toc);
            }
        }

        if has_marker {
            let toc = self.parse_headings(&region_document);
            if toc.len() >= self.limits.min_heading_entries {
                debug!(filing = %kind, entries = toc.len(), step = "headings", "located TOC");
                return Ok(toc);
            }
        }

        debug!(filing = %kind, has_marker, "no TOC located");
        Err(ExtractError::TocNotFound)
    }

    fn marker_region<'a>(&self, html: &'a str) -> Option<&'a str> {
        let scan_limit = self.limits.max_marker_offset.saturating_add(64);
        let found = self.marker.find(bounded_prefix(html, scan_limit))?;
        if found.start() > self.limits.max_marker_offset {
            return None;
        }

        let start = floor_char_boundary(html, found.start().saturating_sub(self.limits.region_padding_before));
        let end = floor_char_boundary(html, found.start().saturating_add(self.limits.region_length));
        Some(&html[start..end])
    }

    fn accepts_links(&self, toc: &TocMap) -> bool {
        toc.len() >= self.limits.min_link_entries
            && toc.anchored_count() >= self.limits.min_anchored_link_entries
    }
}
