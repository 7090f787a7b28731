use scraper::{ElementRef, Html, Node};

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "caption",
    "center",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

const CELL_TAGS: &[&str] = &["td", "th"];

const DROPPED_TAGS: &[&str] = &["script", "style"];

pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

pub fn parse_fragment(html: &str) -> Html {
    Html::parse_fragment(html)
}

pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

pub fn attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

pub fn find_all<'a>(root: ElementRef<'a>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| tags.contains(&element.value().name()))
        .collect()
}

pub fn elements<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants().skip(1).filter_map(ElementRef::wrap)
}

pub fn has_descendant(element: ElementRef<'_>, tags: &[&str]) -> bool {
    elements(element).any(|child| tags.contains(&child.value().name()))
}

pub fn ancestor_of_kind<'a>(element: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| tags.contains(&ancestor.value().name()))
}

pub fn block_text(element: ElementRef<'_>, separator: char) -> String {
    collect_text(element, separator, usize::MAX).unwrap_or_default()
}

pub fn block_text_within(element: ElementRef<'_>, separator: char, limit: usize) -> Option<String> {
    collect_text(element, separator, limit)
}

fn collect_text(element: ElementRef<'_>, separator: char, limit: usize) -> Option<String> {
    let mut out = String::new();
    let mut stack = vec![(*element, false)];

    while let Some((node, closing)) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                // Source line wrapping is not a block boundary.
                out.extend(text.chars().map(|character| match character {
                    '\n' | '\r' => ' ',
                    other => other,
                }));
                if out.len() > limit {
                    return None;
                }
            }
            Node::Element(tag) => {
                let name = tag.name();
                if DROPPED_TAGS.contains(&name) {
                    continue;
                }

                if BLOCK_TAGS.contains(&name) {
                    out.push(separator);
                } else if CELL_TAGS.contains(&name) {
                    out.push(' ');
                }

                if closing {
                    continue;
                }

                stack.push((node, true));
                let children = node.children().collect::<Vec<_>>();
                for child in children.into_iter().rev() {
                    stack.push((child, false));
                }
            }
            _ => {}
        }
    }

    Some(out)
}

pub fn styled_text_share(element: ElementRef<'_>, styled: impl Fn(ElementRef<'_>) -> bool) -> f64 {
    let mut total = 0usize;
    let mut covered = 0usize;

    'text: for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let chars = text.chars().filter(|character| !character.is_whitespace()).count();
        if chars == 0 {
            continue;
        }

        let mut inside = false;
        for ancestor in node.ancestors().filter_map(ElementRef::wrap) {
            if DROPPED_TAGS.contains(&ancestor.value().name()) {
                continue 'text;
            }
            inside |= styled(ancestor);
            if ancestor.id() == element.id() {
                break;
            }
        }

        total += chars;
        if inside {
            covered += chars;
        }
    }

    if total == 0 {
        return 0.0;
    }
    covered as f64 / total as f64
}

pub fn style_blob(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|child| child.value().attr("style"))
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

pub fn fragment_without_scripts(html: &str) -> String {
    let mut fragment = parse_fragment(html);
    let doomed = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| DROPPED_TAGS.contains(&element.value().name()))
        .map(|element| element.id())
        .collect::<Vec<_>>();

    for id in doomed {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    fragment.root_element().inner_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_text_separates_blocks_but_joins_inline_runs() {
        let html = parse_fragment("<div><p><b>Item</b> 1A.</p><p>Risk<i>y</i> text</p></div>");
        let text = block_text(html.root_element(), '\n');
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>();
        assert_eq!(lines, vec!["Item 1A.", "Risky text"]);
    }

    #[test]
    fn block_text_spaces_table_cells_and_skips_scripts() {
        let html = parse_fragment(
            "<table><tr><td>Item 1.</td><td>Business</td><td>4</td></tr></table><script>var x = 1;</script>",
        );
        let text = block_text(html.root_element(), ' ');
        let words = text.split_whitespace().collect::<Vec<&str>>();
        assert_eq!(words, vec!["Item", "1.", "Business", "4"]);
    }

    #[test]
    fn block_text_within_gives_up_on_large_containers() {
        let html = parse_fragment("<div><p>Item 1. Business</p><p>Item 2. Properties</p></div>");
        assert!(block_text_within(html.root_element(), ' ', 10).is_none());
        assert!(block_text_within(html.root_element(), ' ', 1_000).is_some());
    }

    #[test]
    fn fragment_without_scripts_drops_whole_subtrees() {
        let cleaned = fragment_without_scripts(
            "<div>keep<script>alert('x')</script><style>p { color: red }</style></div><p>tail</p>",
        );
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("<style"));
        assert!(!cleaned.contains("alert"));
        assert!(cleaned.contains("keep"));
        assert!(cleaned.contains("<p>tail</p>"));
    }

    #[test]
    fn ancestor_of_kind_finds_nearest_container() {
        let html = parse_fragment("<table><tr><td><p><a href=\"#x\">go</a></p></td></tr></table>");
        let link = find_all(html.root_element(), &["a"])
            .into_iter()
            .next()
            .expect("link should parse");

        let cell = ancestor_of_kind(link, &["tr", "td"]).expect("cell ancestor");
        assert_eq!(tag_name(&cell), "td");
        assert!(ancestor_of_kind(link, &["li"]).is_none());
    }

    #[test]
    fn styled_text_share_counts_covered_characters() {
        let html = parse_fragment("<p><b>Risk</b> text<script>bold()</script></p>");
        let paragraph = find_all(html.root_element(), &["p"])
            .into_iter()
            .next()
            .expect("paragraph should parse");

        let share = styled_text_share(paragraph, |element| tag_name(&element) == "b");
        assert!((share - 0.5).abs() < f64::EPSILON);
        assert_eq!(styled_text_share(paragraph, |element| tag_name(&element) == "p"), 1.0);
    }

    #[test]
    fn style_blob_collects_descendant_styles() {
        let html = parse_fragment(
            "<p style=\"TEXT-ALIGN:center\"><span style=\"font-weight:700\">Overview</span></p>",
        );
        let paragraph = find_all(html.root_element(), &["p"])
            .into_iter()
            .next()
            .expect("paragraph should parse");
        let blob = style_blob(paragraph);
        assert!(blob.contains("text-align:center"));
        assert!(blob.contains("font-weight:700"));
    }
}
