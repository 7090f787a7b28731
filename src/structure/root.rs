use regex::Regex;

use crate::model::{NodeKind, StructureNode};

use super::StructureBuilder;

const PREFIX_TRIM: &[char] = &[' ', '.', ':', '-', '|', ',', ';', '/'];

impl StructureBuilder {
    pub(crate) fn apply_root_heading(
        &self,
        forest: Vec<StructureNode>,
        root_heading: &str,
    ) -> Vec<StructureNode> {
        let root_title = self.normalizer.clean(root_heading);
        if root_title.is_empty() {
            return forest;
        }

        let token = self
            .item_token
            .captures(&root_title)
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().to_ascii_uppercase());
        let own_heading = self.own_heading_pattern(token.as_deref());

        let mut body_parts = Vec::<String>::new();
        let mut children = Vec::<StructureNode>::new();
        for node in forest {
            let is_own_heading = node.is_heading()
                && own_heading
                    .as_ref()
                    .zip(node.heading.as_deref())
                    .is_some_and(|(pattern, heading)| pattern.is_match(heading));

            if is_own_heading {
                if let Some(body) = node.body.as_deref().map(str::trim).filter(|body| !body.is_empty()) {
                    body_parts.push(self.strip_root_prefix(body, &root_title));
                }
                children.extend(node.children);
            } else {
                children.push(node);
            }
        }

        let mut seen = Vec::<(u8, String)>::new();
        let mut kept = Vec::<StructureNode>::new();
        for node in children {
            if node.kind == NodeKind::SimpleText {
                let text = self.normalizer.clean(node.body.as_deref().unwrap_or_default());
                let text = self.strip_root_prefix(&text, &root_title);
                if !text.is_empty() {
                    body_parts.push(text);
                }
                continue;
            }

            let key = (
                node.layer,
                self.normalizer
                    .clean(node.heading.as_deref().unwrap_or_default())
                    .to_lowercase(),
            );
            if seen.contains(&key) && !node.has_content() {
                continue;
            }
            seen.push(key);
            kept.push(node);
        }

        bump_layers(&mut kept, 2);

        let body = body_parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<String>>()
            .join(" ");
        let body = self.strip_root_prefix(body.trim(), &root_title);

        let mut root = StructureNode::heading(1, &root_title);
        root.body = Some(body).filter(|body| !body.is_empty());
        root.children = kept;
        vec![root]
    }

    fn own_heading_pattern(&self, token: Option<&str>) -> Option<Regex> {
        let pattern = match token {
            Some(token) => format!(r"(?i)^\s*items?\s+{}\b", regex::escape(token)),
            None => r"(?i)^\s*items?\s+\d+[a-z]?\b".to_string(),
        };
        Regex::new(&pattern).ok()
    }

    pub(crate) fn strip_root_prefix(&self, text: &str, root_title: &str) -> String {
        let text = self.normalizer.clean(text);
        if text.is_empty() {
            return text;
        }

        let without_label = self.normalizer.strip_item_prefix(root_title);
        let normalized_text = loose_form(&text);
        for candidate in [root_title, without_label] {
            let prefix = loose_form(candidate);
            if prefix.is_empty() || !normalized_text.starts_with(&prefix) {
                continue;
            }
            if let Some(rest) = after_loose_prefix(&text, prefix.chars().count()) {
                return rest.trim_start_matches(PREFIX_TRIM).trim().to_string();
            }
        }
        text
    }
}

fn loose_form(text: &str) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for character in text.chars() {
        if character.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(character.to_lowercase());
        } else if !matches!(character, '\'' | '\u{2019}') {
            pending_space = true;
        }
    }
    out
}

fn after_loose_prefix(text: &str, loose_len: usize) -> Option<&str> {
    let mut consumed = 0usize;
    let mut previous_space = false;
    for (index, character) in text.char_indices() {
        let apostrophe = matches!(character, '\'' | '\u{2019}');
        if character.is_alphanumeric() {
            consumed += 1;
            previous_space = false;
        } else if !apostrophe && !previous_space && consumed > 0 {
            consumed += 1;
            previous_space = true;
        }

        if consumed >= loose_len {
            return Some(&text[index + character.len_utf8()..]);
        }
    }
    None
}

fn bump_layers(nodes: &mut [StructureNode], min_layer: u8) {
    for node in nodes {
        if node.is_heading() {
            node.layer = node.layer.max(min_layer);
        }
        bump_layers(&mut node.children, min_layer.saturating_add(1));
    }
}
