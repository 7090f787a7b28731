pub mod items;
pub mod structure;
pub mod toc;

use anyhow::{Context, Result};
use filing_items::{FilingExtractor, FilingKind};
use serde::Serialize;
use tracing::info;

use crate::cli::SourceArgs;
use crate::util::{FilingSource, load_config, now_utc_string, read_filing};

#[derive(Debug, Serialize)]
pub struct OutputDocument<T: Serialize> {
    pub generated_at: String,
    pub source_file: String,
    pub source_sha256: String,
    pub filing: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> OutputDocument<T> {
    pub fn new(source: &FilingSource, kind: &FilingKind, body: T) -> Self {
        Self {
            generated_at: now_utc_string(),
            source_file: source.path.display().to_string(),
            source_sha256: source.sha256.clone(),
            filing: kind.to_string(),
            body,
        }
    }
}

pub fn prepare(args: &SourceArgs) -> Result<(FilingSource, FilingExtractor)> {
    let config = load_config(args.config.as_deref())?;
    let extractor = FilingExtractor::new(config).context("failed to build extractor")?;
    let source = read_filing(&args.input)?;

    info!(
        path = %source.path.display(),
        filing = %args.filing,
        bytes = source.html.len(),
        "loaded filing"
    );
    Ok((source, extractor))
}
