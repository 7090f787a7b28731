use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    pub item_number: String,
    pub anchor: Option<String>,
    pub title: String,
}

impl TocEntry {
    pub fn new(item_number: &str, anchor: Option<String>, title: &str) -> Self {
        let title = if title.trim().is_empty() {
            format!("Item {item_number}")
        } else {
            title.trim().to_string()
        };

        Self {
            item_number: item_number.to_string(),
            anchor: anchor.filter(|value| !value.trim().is_empty()),
            title,
        }
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TocMap {
    entries: IndexMap<String, TocEntry>,
}

impl TocMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, item_number: &str) -> Option<&TocEntry> {
        self.entries.get(item_number)
    }

    pub fn contains(&self, item_number: &str) -> bool {
        self.entries.contains_key(item_number)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TocEntry> {
        self.entries.values()
    }

    pub fn item_numbers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn anchored_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_anchored()).count()
    }

    pub fn offer(&mut self, entry: TocEntry) -> bool {
        if let Some(existing) = self.entries.get(&entry.item_number) {
            if existing.is_anchored() {
                return false;
            }
        }

        self.entries.insert(entry.item_number.clone(), entry);
        true
    }

    pub fn merge_missing(&mut self, other: TocMap) {
        for (item_number, entry) in other.entries {
            match self.entries.get_mut(&item_number) {
                Some(existing) => {
                    if existing.anchor.is_none() && entry.anchor.is_some() {
                        existing.anchor = entry.anchor;
                        existing.title = entry.title;
                    }
                }
                None => {
                    let index = self.natural_position(&item_number);
                    self.entries.shift_insert(index, item_number, entry);
                }
            }
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&TocEntry) -> bool) {
        self.entries.retain(|_, entry| keep(entry));
    }

    fn natural_position(&self, item_number: &str) -> usize {
        let key = item_sort_key(item_number);
        self.entries
            .keys()
            .position(|existing| item_sort_key(existing) > key)
            .unwrap_or(self.entries.len())
    }
}

impl FromIterator<TocEntry> for TocMap {
    fn from_iter<T: IntoIterator<Item = TocEntry>>(iter: T) -> Self {
        let mut map = TocMap::new();
        for entry in iter {
            map.offer(entry);
        }
        map
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemSpan {
    pub start: usize,
    pub end: usize,
}

impl ItemSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type ItemPositions = IndexMap<String, ItemSpan>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedItem {
    pub item_number: String,
    pub item_title: String,
    pub html_content: String,
    pub text_content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ItemRecord {
    Extracted(ExtractedItem),
    Failed { error: String },
}

impl From<&Result<ExtractedItem, ExtractError>> for ItemRecord {
    fn from(result: &Result<ExtractedItem, ExtractError>) -> Self {
        match result {
            Ok(item) => ItemRecord::Extracted(item.clone()),
            Err(error) => ItemRecord::Failed {
                error: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StructureRecord {
    Built(Vec<StructureNode>),
    Failed { error: String },
}

impl From<&Result<Vec<StructureNode>, ExtractError>> for StructureRecord {
    fn from(result: &Result<Vec<StructureNode>, ExtractError>) -> Self {
        match result {
            Ok(forest) => StructureRecord::Built(forest.clone()),
            Err(error) => StructureRecord::Failed {
                error: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Heading,
    SimpleText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructureNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub layer: u8,
    pub heading: Option<String>,
    pub body: Option<String>,
    pub children: Vec<StructureNode>,
}

impl StructureNode {
    pub fn heading(layer: u8, heading: &str) -> Self {
        Self {
            kind: NodeKind::Heading,
            layer,
            heading: Some(heading.to_string()),
            body: None,
            children: Vec::new(),
        }
    }

    pub fn simple_text(body: &str) -> Self {
        Self {
            kind: NodeKind::SimpleText,
            layer: 1,
            heading: None,
            body: Some(body.to_string()),
            children: Vec::new(),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind == NodeKind::Heading
    }

    pub fn has_content(&self) -> bool {
        self.body
            .as_deref()
            .map(|body| !body.trim().is_empty())
            .unwrap_or(false)
            || !self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilingKind {
    TenK,
    TenKAmendment,
    TenQ,
    TenQAmendment,
    Other(String),
}

const TEN_K_ITEMS: &[(&str, &str)] = &[
    ("1", "Business"),
    ("1A", "Risk Factors"),
    ("1B", "Unresolved Staff Comments"),
    ("1C", "Cybersecurity"),
    ("2", "Properties"),
    ("3", "Legal Proceedings"),
    ("4", "Mine Safety Disclosures"),
    (
        "5",
        "Market for Registrant's Common Equity, Related Stockholder Matters and Issuer Purchases of Equity Securities",
    ),
    ("6", "[Reserved]"),
    (
        "7",
        "Management's Discussion and Analysis of Financial Condition and Results of Operations",
    ),
    ("7A", "Quantitative and Qualitative Disclosures About Market Risk"),
    ("8", "Financial Statements and Supplementary Data"),
    (
        "9",
        "Changes in and Disagreements with Accountants on Accounting and Financial Disclosure",
    ),
    ("9A", "Controls and Procedures"),
    ("9B", "Other Information"),
    (
        "9C",
        "Disclosure Regarding Foreign Jurisdictions that Prevent Inspections",
    ),
    ("10", "Directors, Executive Officers and Corporate Governance"),
    ("11", "Executive Compensation"),
    (
        "12",
        "Security Ownership of Certain Beneficial Owners and Management and Related Stockholder Matters",
    ),
    (
        "13",
        "Certain Relationships and Related Transactions, and Director Independence",
    ),
    ("14", "Principal Accountant Fees and Services"),
    ("15", "Exhibits and Financial Statement Schedules"),
    ("16", "Form 10-K Summary"),
];

// Part I and Part II share item numbers; the first occurrence wins.
const TEN_Q_ITEMS: &[(&str, &str)] = &[
    ("1", "Financial Statements"),
    ("1A", "Risk Factors"),
    (
        "2",
        "Management's Discussion and Analysis of Financial Condition and Results of Operations",
    ),
    ("3", "Quantitative and Qualitative Disclosures About Market Risk"),
    ("4", "Controls and Procedures"),
    ("5", "Other Information"),
    ("6", "Exhibits"),
];

impl FilingKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TenK => "10-K",
            Self::TenKAmendment => "10-K/A",
            Self::TenQ => "10-Q",
            Self::TenQAmendment => "10-Q/A",
            Self::Other(value) => value,
        }
    }

    pub fn expected_items(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::TenK | Self::TenKAmendment => TEN_K_ITEMS,
            Self::TenQ | Self::TenQAmendment => TEN_Q_ITEMS,
            Self::Other(_) => &[],
        }
    }

    pub fn expects_item(&self, item_number: &str) -> bool {
        self.expected_items()
            .iter()
            .any(|(number, _)| *number == item_number)
    }

    pub fn canonical_title(&self, item_number: &str) -> Option<&'static str> {
        self.expected_items()
            .iter()
            .find(|(number, _)| *number == item_number)
            .map(|(_, title)| *title)
    }
}

impl FromStr for FilingKind {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_uppercase()
            .replace(['/', ' ', '_'], "");
        Ok(match normalized.as_str() {
            "10-K" | "10K" => Self::TenK,
            "10-KA" | "10KA" => Self::TenKAmendment,
            "10-Q" | "10Q" => Self::TenQ,
            "10-QA" | "10QA" => Self::TenQAmendment,
            _ => Self::Other(value.trim().to_string()),
        })
    }
}

impl fmt::Display for FilingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn item_sort_key(item_number: &str) -> (u32, String) {
    let token = item_number.trim().to_ascii_uppercase();
    let digits_end = token
        .char_indices()
        .find(|(_, character)| !character.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(token.len());

    match token[..digits_end].parse::<u32>() {
        Ok(number) => (number, token[digits_end..].to_string()),
        Err(_) => (u32::MAX, token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(item: &str, anchor: Option<&str>) -> TocEntry {
        TocEntry::new(item, anchor.map(ToOwned::to_owned), &format!("Item {item}. Title"))
    }

    #[test]
    fn offer_never_replaces_anchored_entry() {
        let mut toc = TocMap::new();
        assert!(toc.offer(entry("1", Some("item1"))));
        assert!(!toc.offer(entry("1", None)));
        assert!(!toc.offer(entry("1", Some("other"))));

        assert_eq!(toc.get("1").and_then(|e| e.anchor.as_deref()), Some("item1"));
    }

    #[test]
    fn offer_upgrades_unanchored_entry_in_place() {
        let mut toc = TocMap::new();
        toc.offer(entry("1", None));
        toc.offer(entry("2", None));
        toc.offer(entry("1", Some("item1")));

        let order = toc.item_numbers().collect::<Vec<&str>>();
        assert_eq!(order, vec!["1", "2"]);
        assert_eq!(toc.anchored_count(), 1);
    }

    #[test]
    fn merge_missing_inserts_at_natural_position() {
        let mut toc = [entry("1", Some("a")), entry("2", Some("b")), entry("7", Some("c"))]
            .into_iter()
            .collect::<TocMap>();
        let extra = [entry("1A", Some("x")), entry("2", Some("y")), entry("9", Some("z"))]
            .into_iter()
            .collect::<TocMap>();

        toc.merge_missing(extra);

        let order = toc.item_numbers().collect::<Vec<&str>>();
        assert_eq!(order, vec!["1", "1A", "2", "7", "9"]);
        assert_eq!(toc.get("2").and_then(|e| e.anchor.as_deref()), Some("b"));
    }

    #[test]
    fn records_serialize_value_or_error_object() {
        let failed = ItemRecord::from(&Err(ExtractError::ItemNotInToc("7".to_string())));
        assert_eq!(
            serde_json::to_value(&failed).expect("record should serialize"),
            serde_json::json!({ "error": "item 7 not found in TOC" })
        );

        let built = StructureRecord::from(&Ok(vec![StructureNode::simple_text("Text.")]));
        assert_eq!(
            serde_json::to_value(&built).expect("record should serialize"),
            serde_json::json!([{
                "type": "simple_text",
                "layer": 1,
                "heading": null,
                "body": "Text.",
                "children": []
            }])
        );
    }

    #[test]
    fn empty_title_defaults_to_item_label() {
        let entry = TocEntry::new("7A", None, "  ");
        assert_eq!(entry.title, "Item 7A");
    }

    #[test]
    fn item_sort_key_orders_suffixes_after_number() {
        let mut items = vec!["10", "1B", "9C", "1", "1A", "2"];
        items.sort_by_key(|item| item_sort_key(item));
        assert_eq!(items, vec!["1", "1A", "1B", "2", "9C", "10"]);
    }

    #[test]
    fn filing_kind_parses_common_spellings() {
        assert_eq!("10-K".parse::<FilingKind>(), Ok(FilingKind::TenK));
        assert_eq!("10-k/a".parse::<FilingKind>(), Ok(FilingKind::TenKAmendment));
        assert_eq!("10-QA".parse::<FilingKind>(), Ok(FilingKind::TenQAmendment));
        assert_eq!(
            "8-K".parse::<FilingKind>(),
            Ok(FilingKind::Other("8-K".to_string()))
        );
        assert!(FilingKind::TenK.expects_item("9C"));
        assert!(!FilingKind::TenQ.expects_item("7A"));
    }
}
