mod classify;
mod root;
mod tree;


use anyhow::{Context, Result};
use regex::Regex;
use scraper::ElementRef;

use crate::dom;
use crate::model::StructureNode;
use crate::text::{PAGE_BREAK_TOKEN, TextNormalizer};

pub use classify::{
    BlockStyle, Classification, HeadingClassifier, HeadingSignals, HeadingStyle,
    HEADING_SCORE_THRESHOLD, MAX_BOLD_SENTENCE_HEADING_CHARS, MAX_HEADING_CHARS, MAX_LEAD_IN_CHARS,
};
pub use tree::{LayerViolation, validate_layers};

use tree::Block;

const BLOCK_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "div", "table"];
const ENCLOSING_TAGS: &[&str] = &["table", "p", "li", "h1", "h2", "h3", "h4", "h5", "h6"];
const NESTED_BLOCK_TAGS: &[&str] = &[
    "p", "li", "td", "h1", "h2", "h3", "h4", "h5", "h6", "div", "table",
];
const BOLD_TAGS: &[&str] = &["b", "strong"];
const ITALIC_TAGS: &[&str] = &["i", "em"];
/// Bold text must cover at least this share of a block for the whole block
/// to count as bold. Partially bold blocks go through the lead-in split.
const BOLD_COVERAGE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct StructureBuilder {
    normalizer: TextNormalizer,
    classifier: HeadingClassifier,
    item_token: Regex,
    bold_style: Regex,
    italic_style: Regex,
    underline_style: Regex,
    center_style: Regex,
}

impl StructureBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            classifier: HeadingClassifier::new()?,
            item_token: Regex::new(r"(?i)items?\s+(\d+[a-z]?)")
                .context("failed to compile item token regex")?,
            bold_style: Regex::new(r"font-weight\s*:\s*(?:bold|bolder|[6-9]00)")
                .context("failed to compile bold style regex")?,
            italic_style: Regex::new(r"font-style\s*:\s*italic")
                .context("failed to compile italic style regex")?,
            underline_style: Regex::new(r"text-decoration(?:-line)?\s*:\s*[^;]*underline")
                .context("failed to compile underline style regex")?,
            center_style: Regex::new(r"text-align\s*:\s*center")
                .context("failed to compile center style regex")?,
        })
    }

    pub fn build(&self, item_html: &str, root_heading: Option<&str>) -> Vec<StructureNode> {
        let fragment = dom::parse_fragment(item_html);
        let root = fragment.root_element();

        let blocks = self.collect_blocks(root);
        let mut forest = tree::assemble(blocks);

        if forest.is_empty() {
            let text = dom::block_text(root, ' ').replace(PAGE_BREAK_TOKEN, " ");
            let text = self.normalizer.clean(&text);
            if !text.is_empty() {
                forest.push(StructureNode::simple_text(&text));
            }
        }

        match root_heading {
            Some(root_heading) => self.apply_root_heading(forest, root_heading),
            None => forest,
        }
    }

    fn collect_blocks(&self, root: ElementRef<'_>) -> Vec<Block> {
        let mut blocks = Vec::new();

        for block in self.candidate_blocks(root) {
            let text = self.normalizer.clean(&dom::block_text(block, ' '));
            let style = self.block_style(block);

            let classification = self.classifier.classify(&text, &style);
            if classification == Classification::Ignored {
                continue;
            }

            if let Some((heading, body)) = self.split_bold_lead(block, &text, &style) {
                blocks.push(heading);
                blocks.push(Block::Body(body));
                continue;
            }

            match classification {
                Classification::Heading { layer, .. } => blocks.push(Block::Heading { layer, text }),
                _ => blocks.push(Block::Body(text)),
            }
        }

        blocks
    }

    fn candidate_blocks<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        dom::find_all(root, BLOCK_TAGS)
            .into_iter()
            .filter(|block| dom::ancestor_of_kind(*block, ENCLOSING_TAGS).is_none())
            .filter(|block| {
                dom::tag_name(block) != "div" || !dom::has_descendant(*block, NESTED_BLOCK_TAGS)
            })
            .collect()
    }

    fn block_style(&self, block: ElementRef<'_>) -> BlockStyle {
        let tag = dom::tag_name(&block);
        let blob = dom::style_blob(block);
        let heading_tag = dom::HEADING_TAGS.contains(&tag);

        let bold = heading_tag
            || dom::styled_text_share(block, |element| self.is_bold_element(element)) >= BOLD_COVERAGE;

        BlockStyle {
            bold,
            italic: self.italic_style.is_match(&blob) || dom::has_descendant(block, ITALIC_TAGS),
            underline: self.underline_style.is_match(&blob) || dom::has_descendant(block, &["u"]),
            centered: self.center_style.is_match(&blob)
                || dom::attr(&block, "align").is_some_and(|align| align.eq_ignore_ascii_case("center")),
            bold_only_bullet: self.bold_only_bullet(block),
            table: tag == "table",
        }
    }

    fn is_bold_element(&self, element: ElementRef<'_>) -> bool {
        BOLD_TAGS.contains(&dom::tag_name(&element))
            || dom::attr(&element, "style")
                .is_some_and(|style| self.bold_style.is_match(&style.to_lowercase()))
    }

    fn bold_only_bullet(&self, block: ElementRef<'_>) -> bool {
        let mut found_bold = false;
        for element in dom::elements(block).filter(|element| self.is_bold_element(*element)) {
            found_bold = true;
            let text = self.normalizer.clean(&dom::block_text(element, ' '));
            if text.chars().any(char::is_alphanumeric) {
                return false;
            }
        }
        found_bold
    }

    fn split_bold_lead(&self, block: ElementRef<'_>, text: &str, style: &BlockStyle) -> Option<(Block, String)> {
        if style.table
            || (self.classifier.is_item_heading(text) && text.chars().count() <= MAX_HEADING_CHARS)
        {
            return None;
        }

        let lead = dom::elements(block).find(|element| self.is_bold_element(*element))?;
        let lead = self.normalizer.clean(&dom::block_text(lead, ' '));
        if lead.is_empty() || lead.chars().count() > MAX_LEAD_IN_CHARS {
            return None;
        }

        let head = text.get(..lead.len())?;
        if !head.eq_ignore_ascii_case(&lead) {
            return None;
        }

        let remainder = text[lead.len()..].trim();
        if !lead.ends_with('.') && !remainder.starts_with(['.', ':']) {
            return None;
        }
        let remainder = remainder.trim_start_matches(['.', ':']).trim();
        if remainder.is_empty() {
            return None;
        }

        let heading = lead.trim_end_matches(['.', ':']).trim();
        if heading.is_empty() {
            return None;
        }

        let lead_style = BlockStyle {
            bold: true,
            table: false,
            ..*style
        };
        let layer = match self.classifier.classify(heading, &lead_style) {
            Classification::Heading { layer, .. } => layer,
            _ => 2,
        };

        Some((
            Block::Heading {
                layer,
                text: heading.to_string(),
            },
            remainder.to_string(),
        ))
    }
}
