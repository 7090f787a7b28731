use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TocLimits {
    pub max_marker_offset: usize,
    pub region_padding_before: usize,
    pub region_length: usize,
    pub fallback_prefix_length: usize,
    pub max_title_chars: usize,
    pub max_link_context_chars: usize,
    pub min_table_entries: usize,
    pub min_anchored_table_entries: usize,
    pub min_link_entries: usize,
    pub min_anchored_link_entries: usize,
    pub heading_scan_limit: usize,
    pub heading_max_items: usize,
    pub min_heading_entries: usize,
    /// Elements (in document order) a preceding named anchor may sit
    /// before a heading and still be attributed to it.
    pub preceding_anchor_elements: usize,
}

impl Default for TocLimits {
    fn default() -> Self {
        Self {
            max_marker_offset: 4_000_000,
            region_padding_before: 3_000,
            region_length: 260_000,
            fallback_prefix_length: 800_000,
            max_title_chars: 240,
            max_link_context_chars: 250,
            min_table_entries: 2,
            min_anchored_table_entries: 2,
            min_link_entries: 5,
            min_anchored_link_entries: 5,
            heading_scan_limit: 200,
            heading_max_items: 20,
            min_heading_entries: 2,
            preceding_anchor_elements: 10,
        }
    }
}

/// Which "ITEM n" occurrence starts an unanchored item. Earlier hits are
/// usually TOC rows or cross-references, so the last one is the default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeadingMatch {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BoundaryLimits {
    /// A PART heading closer than this to the item start is treated as part
    /// of the item heading itself.
    pub part_min_distance: usize,
    /// A PART heading further than this from the computed end is an in-text
    /// mention, not a divider.
    pub part_max_distance: usize,
    pub unanchored_heading_match: HeadingMatch,
}

impl Default for BoundaryLimits {
    fn default() -> Self {
        Self {
            part_min_distance: 200,
            part_max_distance: 12_000,
            unanchored_heading_match: HeadingMatch::Last,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleanerLimits {
    pub short_disclosure_window: usize,
    pub min_residual_words: usize,
    pub max_artifact_phrase_words: usize,
    pub heading_cut_window: usize,
}

impl Default for CleanerLimits {
    fn default() -> Self {
        Self {
            short_disclosure_window: 350,
            min_residual_words: 1,
            max_artifact_phrase_words: 5,
            heading_cut_window: 1_500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractorConfig {
    pub toc: TocLimits,
    pub boundary: BoundaryLimits,
    pub cleaner: CleanerLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let raw = r#"{ "toc": { "region_length": 1000 }, "cleaner": { "min_residual_words": 3 } }"#;
        let config: ExtractorConfig =
            serde_json::from_str(raw).expect("partial config should deserialize");

        assert_eq!(config.toc.region_length, 1000);
        assert_eq!(config.toc.max_marker_offset, 4_000_000);
        assert_eq!(config.cleaner.min_residual_words, 3);
        assert_eq!(config.boundary, BoundaryLimits::default());
    }

    #[test]
    fn heading_match_policy_reads_snake_case() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{ "boundary": { "unanchored_heading_match": "first" } }"#)
                .expect("policy should deserialize");

        assert_eq!(config.boundary.unanchored_heading_match, HeadingMatch::First);
        assert_eq!(config.boundary.part_min_distance, 200);
    }

    #[test]
    fn preceding_anchor_window_counts_elements() {
        assert_eq!(TocLimits::default().preceding_anchor_elements, 10);

        let config: ExtractorConfig =
            serde_json::from_str(r#"{ "toc": { "preceding_anchor_elements": 3 } }"#)
                .expect("anchor window should deserialize");

        assert_eq!(config.toc.preceding_anchor_elements, 3);
        assert_eq!(config.toc.min_heading_entries, 2);
    }
}
