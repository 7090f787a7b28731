use anyhow::{Context, Result};
use filing_items::TocMap;
use serde::Serialize;
use tracing::info;

use crate::cli::TocArgs;
use crate::commands::{OutputDocument, prepare};
use crate::util::emit_json;

#[derive(Debug, Serialize)]
struct TocOutput {
    entry_count: usize,
    anchored_count: usize,
    toc_items: TocMap,
}

pub fn run(args: TocArgs) -> Result<()> {
    let (source, extractor) = prepare(&args.source)?;
    let kind = &args.source.filing;

    let toc = extractor
        .parse_toc(&source.html, kind)
        .with_context(|| format!("failed to locate TOC in {}", source.path.display()))?;

    info!(
        entries = toc.len(),
        anchored = toc.anchored_count(),
        "table of contents located"
    );

    let output = OutputDocument::new(
        &source,
        kind,
        TocOutput {
            entry_count: toc.len(),
            anchored_count: toc.anchored_count(),
            toc_items: toc,
        },
    );
    emit_json(args.source.output.as_deref(), &output)
}
