use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no table of contents located in filing")]
    TocNotFound,

    #[error("item {0} not found in TOC")]
    ItemNotInToc(String),

    #[error("could not locate item {0} in the document")]
    ItemBoundaryUnresolved(String),

    #[error("failed to extract item {item}: {reason}")]
    ItemExtraction { item: String, reason: String },

    #[error("failed to build structure for item {item}: {reason}")]
    StructureExtraction { item: String, reason: String },
}

impl ExtractError {
    pub fn item(&self) -> Option<&str> {
        match self {
            Self::TocNotFound => None,
            Self::ItemNotInToc(item) | Self::ItemBoundaryUnresolved(item) => Some(item),
            Self::ItemExtraction { item, .. } | Self::StructureExtraction { item, .. } => Some(item),
        }
    }
}
