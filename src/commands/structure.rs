use anyhow::{Context, Result};
use filing_items::ProcessOptions;
use filing_items::model::StructureRecord;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::StructureArgs;
use crate::commands::{OutputDocument, prepare};
use crate::util::emit_json;

#[derive(Debug, Serialize)]
struct StructureOutput {
    root_heading: bool,
    structures: IndexMap<String, StructureRecord>,
}

pub fn run(args: StructureArgs) -> Result<()> {
    let (source, extractor) = prepare(&args.source)?;
    let kind = &args.source.filing;

    let options = ProcessOptions {
        items: (!args.items.is_empty()).then_some(args.items),
        structures: true,
        root_heading: args.root_heading,
    };
    let report = extractor
        .process_filing(&source.html, kind, &options)
        .with_context(|| format!("failed to process {}", source.path.display()))?;

    let mut node_count = 0usize;
    for (item, result) in &report.structures {
        match result {
            Ok(forest) => node_count += forest.len(),
            Err(error) => warn!(item = %item, error = %error, "structure extraction failed"),
        }
    }
    info!(
        items = report.structures.len(),
        top_level_nodes = node_count,
        "structure extraction completed"
    );

    let structures = report
        .structures
        .iter()
        .map(|(item, result)| (item.clone(), StructureRecord::from(result)))
        .collect();
    let output = OutputDocument::new(
        &source,
        kind,
        StructureOutput {
            root_heading: args.root_heading,
            structures,
        },
    );
    emit_json(args.source.output.as_deref(), &output)
}
