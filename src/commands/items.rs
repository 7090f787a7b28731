use anyhow::{Context, Result};
use filing_items::model::ItemRecord;
use filing_items::{ProcessOptions, TocMap};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ItemsArgs;
use crate::commands::{OutputDocument, prepare};
use crate::util::emit_json;

#[derive(Debug, Serialize)]
struct ItemsOutput {
    toc_items: TocMap,
    missing_expected: Vec<String>,
    items: IndexMap<String, ItemRecord>,
}

pub fn run(args: ItemsArgs) -> Result<()> {
    let (source, extractor) = prepare(&args.source)?;
    let kind = &args.source.filing;

    let options = ProcessOptions {
        items: (!args.items.is_empty()).then_some(args.items),
        ..ProcessOptions::default()
    };
    let report = extractor
        .process_filing(&source.html, kind, &options)
        .with_context(|| format!("failed to process {}", source.path.display()))?;

    for (item, result) in &report.items {
        if let Err(error) = result {
            warn!(item = %item, error = %error, "item extraction failed");
        }
    }
    info!(
        extracted = report.extracted_count(),
        failed = report.failed_count(),
        missing_expected = report.missing_expected.len(),
        "item extraction completed"
    );

    let items = report
        .items
        .iter()
        .map(|(item, result)| (item.clone(), ItemRecord::from(result)))
        .collect();
    let output = OutputDocument::new(
        &source,
        kind,
        ItemsOutput {
            toc_items: report.toc,
            missing_expected: report.missing_expected,
            items,
        },
    );
    emit_json(args.source.output.as_deref(), &output)
}
