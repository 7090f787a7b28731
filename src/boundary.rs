use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::config::{BoundaryLimits, HeadingMatch};
use crate::model::{ItemPositions, ItemSpan, TocEntry, TocMap};
use crate::text::floor_char_boundary;

#[derive(Debug, Clone)]
pub struct ItemBoundaryResolver {
    limits: BoundaryLimits,
    end_markers: Vec<Regex>,
    part_heading: Regex,
}

impl ItemBoundaryResolver {
    pub fn new(limits: BoundaryLimits) -> Result<Self> {
        let end_markers = [
            r#"(?i)id\s*=\s*["']signatures[^"']*["']"#,
            r#"(?i)id\s*=\s*["']exhibits[^"']*["']"#,
            r#"(?i)id\s*=\s*["'][^"']*cover[^"']*["']"#,
            r"(?i)>SIGNATURES<",
            r"(?i)>\s*SIGNA\s*<.*?>\s*TURES\s*<",
        ]
        .into_iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("failed to compile end marker regex {pattern}"))
        })
        .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            limits,
            end_markers,
            part_heading: Regex::new(r"(?i)>\s*PART(?:\s|&nbsp;)+[IVXLC]+\b")
                .context("failed to compile PART heading regex")?,
        })
    }

    pub fn resolve(&self, html: &str, toc: &TocMap) -> ItemPositions {
        let entries = toc.entries().collect::<Vec<&TocEntry>>();
        let mut anchors = AnchorIndex::new(html);
        let mut positions = ItemPositions::new();

        for (index, entry) in entries.iter().enumerate() {
            let start = match entry.anchor.as_deref() {
                Some(anchor) => anchors.start(anchor),
                None => {
                    let lo = entries[..index]
                        .iter()
                        .rev()
                        .find_map(|previous| previous.anchor.as_deref().and_then(|a| anchors.start(a)))
                        .unwrap_or(0);
                    let hi = first_anchor_start(&mut anchors, &entries[index + 1..]).unwrap_or(html.len());
                    self.heading_start(html, &entry.item_number, lo, hi)
                }
            };

            let Some(start) = start else {
                debug!(item = %entry.item_number, "item start not located");
                continue;
            };

            let end = self.end_of(html, &entries, index, start, &mut anchors);
            let end = self.trim_at_part_heading(html, start, end.max(start));
            positions.insert(entry.item_number.clone(), ItemSpan { start, end });
        }

        debug!(entries = entries.len(), resolved = positions.len(), "resolved item spans");
        positions
    }

    fn end_of(
        &self,
        html: &str,
        entries: &[&TocEntry],
        index: usize,
        start: usize,
        anchors: &mut AnchorIndex<'_>,
    ) -> usize {
        let anchor = entries[index].anchor.as_deref();
        let mut next_index = index + 1;
        while anchor.is_some()
            && entries
                .get(next_index)
                .is_some_and(|next| next.anchor.as_deref() == anchor)
        {
            next_index += 1;
        }

        let Some(next) = entries.get(next_index) else {
            return self.end_marker(html, start);
        };

        if let Some(next_anchor) = next.anchor.as_deref() {
            return anchors.start_from(next_anchor, start).unwrap_or(html.len());
        }

        // Only the immediate next item is searched: later item numbers show
        // up as cross-references ("see Item 8") inside the current item.
        let hi = first_anchor_start(anchors, &entries[next_index..]);
        let hi_or_len = hi.unwrap_or(html.len());
        self.heading_start(html, &next.item_number, start + 1, hi_or_len)
            .or(hi)
            .unwrap_or(html.len())
    }

    fn end_marker(&self, html: &str, start: usize) -> usize {
        self.end_markers
            .iter()
            .find_map(|marker| marker.find(&html[start..]))
            .map(|found| tag_open_before(html, 0, start + found.start()))
            .unwrap_or(html.len())
    }

    fn heading_start(&self, html: &str, item_number: &str, lo: usize, hi: usize) -> Option<usize> {
        let lo = floor_char_boundary(html, lo);
        let hi = floor_char_boundary(html, hi);
        if hi <= lo {
            return None;
        }

        let pattern = format!(
            r"(?i)ITEM(?:\s|&nbsp;|&#160;|<[^>]+>){{0,20}}{}(?:\b|[.:])",
            regex::escape(item_number)
        );
        let heading = Regex::new(&pattern).ok()?;
        let window = &html[lo..hi];
        let found = match self.limits.unanchored_heading_match {
            HeadingMatch::First => heading.find(window),
            HeadingMatch::Last => heading.find_iter(window).last(),
        }?;

        Some(tag_open_before(html, lo, lo + found.start()))
    }

    fn trim_at_part_heading(&self, html: &str, start: usize, end: usize) -> usize {
        if end <= start {
            return end;
        }

        let Some(found) = self.part_heading.find(&html[start..end]) else {
            return end;
        };

        let candidate = start + found.start();
        if candidate - start < self.limits.part_min_distance
            || end - candidate > self.limits.part_max_distance
        {
            return end;
        }

        tag_open_before(html, start, candidate)
    }
}

fn tag_open_before(html: &str, lo: usize, position: usize) -> usize {
    html[lo..position]
        .rfind('<')
        .map(|offset| lo + offset)
        .unwrap_or(position)
}

fn first_anchor_start(anchors: &mut AnchorIndex<'_>, entries: &[&TocEntry]) -> Option<usize> {
    entries
        .iter()
        .find_map(|entry| entry.anchor.as_deref().and_then(|anchor| anchors.start(anchor)))
}

struct AnchorIndex<'a> {
    html: &'a str,
    patterns: HashMap<String, Option<Regex>>,
    first: HashMap<String, Option<usize>>,
}

impl<'a> AnchorIndex<'a> {
    fn new(html: &'a str) -> Self {
        Self {
            html,
            patterns: HashMap::new(),
            first: HashMap::new(),
        }
    }

    fn start(&mut self, anchor: &str) -> Option<usize> {
        if let Some(cached) = self.first.get(anchor) {
            return *cached;
        }

        let position = self.start_from(anchor, 0);
        self.first.insert(anchor.to_string(), position);
        position
    }

    fn start_from(&mut self, anchor: &str, from: usize) -> Option<usize> {
        let html = self.html;
        let pattern = self
            .patterns
            .entry(anchor.to_string())
            .or_insert_with(|| {
                Regex::new(&format!(
                    r#"(?i)(?:id|name)\s*=\s*['"]{}['"]"#,
                    regex::escape(anchor)
                ))
                .ok()
            })
            .as_ref()?;

        let from = floor_char_boundary(html, from);
        let found = pattern.find(&html[from..])?;
        Some(tag_open_before(html, 0, from + found.start()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ItemBoundaryResolver {
        ItemBoundaryResolver::new(BoundaryLimits::default()).expect("resolver should build")
    }

    fn toc(entries: &[(&str, Option<&str>)]) -> TocMap {
        entries
            .iter()
            .map(|(item, anchor)| TocEntry::new(item, anchor.map(ToOwned::to_owned), ""))
            .collect()
    }

    fn slice<'a>(html: &'a str, positions: &ItemPositions, item: &str) -> &'a str {
        let span = positions[item];
        &html[span.start..span.end]
    }

    #[test]
    fn combined_entries_share_identical_spans() {
        let html = concat!(
            r#"<div id="a12">Items 1 and 2. Business and Properties</div><p>We make and own things.</p>"#,
            r#"<div id="a3">Item 3. Legal Proceedings</div><p>None.</p>"#,
            r#"<div id="signatures">SIGNATURES</div>"#,
        );
        let toc = toc(&[("1", Some("a12")), ("2", Some("a12")), ("3", Some("a3"))]);

        let positions = resolver().resolve(html, &toc);

        assert_eq!(positions["1"], positions["2"]);
        assert!(slice(html, &positions, "1").starts_with(r#"<div id="a12">"#));
        assert!(slice(html, &positions, "1").ends_with("things.</p>"));
        assert_eq!(slice(html, &positions, "3"), r#"<div id="a3">Item 3. Legal Proceedings</div><p>None.</p>"#);
    }

    #[test]
    fn starts_never_regress_in_toc_order() {
        let html = concat!(
            r#"<a name="i1"></a><p>Item 1.</p><p>Text one.</p>"#,
            r#"<a name="i1a"></a><p>Item 1A.</p><p>Text two.</p>"#,
            r#"<p id="i2">Item 2.</p><p>Text three.</p>"#,
        );
        let toc = toc(&[("1", Some("i1")), ("1A", Some("i1a")), ("2", Some("i2"))]);

        let positions = resolver().resolve(html, &toc);
        let starts = positions.values().map(|span| span.start).collect::<Vec<usize>>();

        assert_eq!(positions.len(), 3);
        assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(positions["2"].end, html.len());
        assert_eq!(positions["1"].end, positions["1A"].start);
    }

    #[test]
    fn unanchored_item_starts_at_last_heading_match() {
        let html = concat!(
            r#"<div id="i1">Item 1. Business</div><p>See Item 2 below for our sites.</p>"#,
            r#"<p><b>ITEM&nbsp;2.</b> Properties</p><p>We lease offices.</p>"#,
            r#"<div id="i3">Item 3. Legal Proceedings</div>"#,
        );
        let toc = toc(&[("1", Some("i1")), ("2", None), ("3", Some("i3"))]);

        let positions = resolver().resolve(html, &toc);

        assert!(slice(html, &positions, "2").starts_with("<b>ITEM&nbsp;2.</b>"));
        assert!(slice(html, &positions, "1").contains("See Item 2 below"));
        assert_eq!(positions["1"].end, positions["2"].start);
        assert_eq!(positions["2"].end, positions["3"].start);
    }

    #[test]
    fn first_match_policy_picks_cross_reference() {
        let limits = BoundaryLimits {
            unanchored_heading_match: HeadingMatch::First,
            ..BoundaryLimits::default()
        };
        let resolver = ItemBoundaryResolver::new(limits).expect("resolver should build");
        let html = concat!(
            r#"<div id="i1">Item 1.</div><p>See Item 2 below.</p>"#,
            r#"<p><b>ITEM 2.</b> Properties</p><div id="i3">Item 3.</div>"#,
        );
        let toc = toc(&[("1", Some("i1")), ("2", None), ("3", Some("i3"))]);

        let positions = resolver.resolve(html, &toc);

        assert!(slice(html, &positions, "2").starts_with("<p>See Item 2"));
    }

    #[test]
    fn unresolvable_items_are_omitted() {
        let html = r#"<div id="i1">Item 1.</div><p>Body.</p>"#;
        let toc = toc(&[("1", Some("i1")), ("2", Some("missing")), ("9", None)]);

        let positions = resolver().resolve(html, &toc);

        assert_eq!(positions.keys().collect::<Vec<&String>>(), vec!["1"]);
        assert_eq!(positions["1"].end, html.len());
    }

    #[test]
    fn part_divider_inside_span_is_trimmed() {
        let filler = "x".repeat(300);
        let html = format!(
            r#"<div id="i4">Item 4. Mine Safety</div><p>{filler}</p><p>PART II</p><div id="i5">Item 5.</div>"#
        );
        let toc = toc(&[("4", Some("i4")), ("5", Some("i5"))]);

        let positions = resolver().resolve(&html, &toc);

        assert!(slice(&html, &positions, "4").ends_with(&format!("{filler}</p>")));
        assert!(slice(&html, &positions, "5").starts_with(r#"<div id="i5">"#));
    }

    #[test]
    fn part_divider_near_start_is_kept() {
        let html = r#"<div id="i5"><p>PART II</p><p>Item 5. Market</p></div><div id="i6">Item 6.</div>"#;
        let toc = toc(&[("5", Some("i5")), ("6", Some("i6"))]);

        let positions = resolver().resolve(html, &toc);

        assert!(slice(html, &positions, "5").contains("PART II"));
        assert!(slice(html, &positions, "5").contains("Item 5. Market"));
    }

    #[test]
    fn last_item_ends_at_signature_text() {
        let html = r#"<div id="i16">Item 16. Summary</div><p>None.</p><p>SIGNATURES</p><p>By: CEO</p>"#;
        let toc = toc(&[("16", Some("i16"))]);

        let positions = resolver().resolve(html, &toc);

        assert_eq!(
            slice(html, &positions, "16"),
            r#"<div id="i16">Item 16. Summary</div><p>None.</p>"#
        );
    }

    #[test]
    fn split_signature_marker_stays_on_one_line() {
        let resolver = resolver();
        let toc = toc(&[("16", Some("i16"))]);

        let same_line = r#"<div id="i16">Item 16. Summary</div><p>None.</p><p><b>SIGNA</b><b>TURES</b></p>"#;
        let positions = resolver.resolve(same_line, &toc);
        assert_eq!(
            slice(same_line, &positions, "16"),
            r#"<div id="i16">Item 16. Summary</div><p>None.</p><p>"#
        );

        let across_lines = concat!(
            r#"<div id="i16">Item 16. Summary</div><p><b>SIGNA</b>"#,
            "\n</p><p>Exhibit list</p>\n",
            "<p><b>TURES</b></p>",
        );
        let positions = resolver.resolve(across_lines, &toc);
        assert_eq!(slice(across_lines, &positions, "16"), across_lines);
    }
}
