use super::*;

fn locator() -> TocLocator {
    TocLocator::new(TocLimits::default()).expect("locator should build")
}

fn entry_of<'a>(toc: &'a TocMap, item: &str) -> (&'a str, Option<&'a str>) {
    let entry = toc.get(item).unwrap_or_else(|| panic!("missing item {item}"));
    (entry.title.as_str(), entry.anchor.as_deref())
}

#[test]
fn table_rows_with_anchors_become_ordered_entries() {
    let html = r##"<html><body>
        <p>TABLE OF CONTENTS</p>
        <table>
          <tr><td><a href="#item1">Item 1.</a></td><td>Business</td><td>#42</td></tr>
          <tr><td><a href="#item1a">Item 1A.</a></td><td>Risk Factors</td><td>#55</td></tr>
        </table>
        <div id="item1">Item 1. Business</div><p>We make things.</p>
        <div id="item1a">Item 1A. Risk Factors</div><p>Things may break.</p>
    </body></html>"##;

    let toc = locator()
        .parse_toc(html, &FilingKind::TenK)
        .expect("TOC should be found");

    assert_eq!(toc.item_numbers().collect::<Vec<&str>>(), vec!["1", "1A"]);
    assert_eq!(entry_of(&toc, "1"), ("Item 1. Business", Some("item1")));
    assert_eq!(entry_of(&toc, "1A"), ("Item 1A. Risk Factors", Some("item1a")));
}

#[test]
fn combined_row_shares_anchor_and_title() {
    let html = r##"<html><body>
        <p>Table of Contents</p>
        <table>
          <tr><td><a href="#item1and2">Items 1 and 2. Business and Properties</a></td><td>3</td></tr>
          <tr><td><a href="#item3">Item 3. Legal Proceedings</a></td><td>9</td></tr>
        </table>
        <div id="item1and2">Items 1 and 2.</div><div id="item3">Item 3.</div>
    </body></html>"##;

    let toc = locator()
        .parse_toc(html, &FilingKind::TenK)
        .expect("TOC should be found");

    assert_eq!(toc.item_numbers().collect::<Vec<&str>>(), vec!["1", "2", "3"]);
    assert_eq!(entry_of(&toc, "1"), entry_of(&toc, "2"));
    assert_eq!(
        entry_of(&toc, "1"),
        ("Items 1 and 2. Business and Properties", Some("item1and2"))
    );
}

#[test]
fn later_unanchored_row_never_replaces_anchored_entry() {
    let html = r##"<html><body>
        <p>Table of Contents</p>
        <table>
          <tr><td><a href="#item7">Item 7. Management's Discussion</a></td><td>30</td></tr>
          <tr><td><a href="#item8">Item 8. Financial Statements</a></td><td>50</td></tr>
          <tr><td>Item 7. Management's Discussion (continued)</td><td>31</td></tr>
        </table>
    </body></html>"##;

    let toc = locator()
        .parse_toc(html, &FilingKind::TenK)
        .expect("TOC should be found");

    assert_eq!(entry_of(&toc, "7"), ("Item 7. Management's Discussion", Some("item7")));
    assert_eq!(toc.item_numbers().collect::<Vec<&str>>(), vec!["7", "8"]);
}

#[test]
fn link_only_toc_is_accepted_with_five_anchored_items() {
    let html = r##"<html><body>
        <div>INDEX</div>
        <p><a href="#i1">Item 1. Business</a></p>
        <p><a href="#i1a">Item 1A. Risk Factors</a></p>
        <p><a href="#i2">Item 2. Properties</a></p>
        <p><a href="#i3">Item 3. Legal Proceedings</a></p>
        <p><a href="#i4">Item 4. Mine Safety Disclosures</a></p>
        <p><a href="#top">Back to top</a></p>
    </body></html>"##;

    let toc = locator()
        .parse_toc(html, &FilingKind::TenK)
        .expect("TOC should be found");

    assert_eq!(
        toc.item_numbers().collect::<Vec<&str>>(),
        vec!["1", "1A", "2", "3", "4"]
    );
    assert_eq!(toc.anchored_count(), 5);
}

#[test]
fn too_few_links_without_table_or_marker_is_not_found() {
    let html = r##"<html><body>
        <p><a href="#i1">Item 1. Business</a></p>
        <p><a href="#i2">Item 2. Properties</a></p>
    </body></html>"##;

    assert_eq!(
        locator().parse_toc(html, &FilingKind::TenK),
        Err(ExtractError::TocNotFound)
    );
}

#[test]
fn heading_fallback_is_disabled_without_marker() {
    let html = r#"<html><body>
        <h2 id="business">Item 1. Business</h2><p>We make things.</p>
        <h2 id="properties">Item 2. Properties</h2><p>We own buildings.</p>
    </body></html>"#;

    assert_eq!(
        locator().parse_toc(html, &FilingKind::TenK),
        Err(ExtractError::TocNotFound)
    );
}

#[test]
fn heading_fallback_runs_when_marker_present() {
    let html = r#"<html><body>
        <p>Table of Contents</p>
        <h2 id="business">Item 1. Business</h2><p>We make things.</p>
        <a name="props"></a>
        <h2>Item 2. Properties</h2><p>We own buildings.</p>
    </body></html>"#;

    let toc = locator()
        .parse_toc(html, &FilingKind::TenK)
        .expect("heading fallback should find items");

    assert_eq!(entry_of(&toc, "1"), ("Item 1. Business", Some("business")));
    assert_eq!(entry_of(&toc, "2"), ("Item 2. Properties", Some("props")));
}

#[test]
fn parse_toc_is_deterministic() {
    let html = r##"<p>Table of Contents</p><table>
        <tr><td><a href="#a">Item 1. Business</a></td><td>1</td></tr>
        <tr><td><a href="#b">Item 2. Properties</a></td><td>5</td></tr>
    </table>"##;
    let locator = locator();

    assert_eq!(
        locator.parse_toc(html, &FilingKind::TenK),
        locator.parse_toc(html, &FilingKind::TenK)
    );
}
