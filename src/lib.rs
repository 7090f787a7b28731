pub mod boundary;
pub mod cleaner;
pub mod config;
pub mod dom;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod structure;
pub mod text;
pub mod toc;

pub use config::ExtractorConfig;
pub use error::ExtractError;
pub use model::{ExtractedItem, FilingKind, ItemSpan, StructureNode, TocEntry, TocMap};
pub use pipeline::{FilingExtractor, FilingReport, ProcessOptions};
