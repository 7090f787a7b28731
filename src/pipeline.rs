use anyhow::Result;
use indexmap::IndexMap;
use tracing::debug;

use crate::boundary::ItemBoundaryResolver;
use crate::cleaner::ItemContentCleaner;
use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::model::{
    ExtractedItem, FilingKind, ItemPositions, StructureNode, TocMap, item_sort_key,
};
use crate::structure::{StructureBuilder, validate_layers};
use crate::toc::TocLocator;

pub type ItemResults = IndexMap<String, Result<ExtractedItem, ExtractError>>;
pub type StructureResults = IndexMap<String, Result<Vec<StructureNode>, ExtractError>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    pub items: Option<Vec<String>>,
    pub structures: bool,
    pub root_heading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingReport {
    pub filing: FilingKind,
    pub toc: TocMap,
    pub missing_expected: Vec<String>,
    pub items: ItemResults,
    pub structures: StructureResults,
}

impl FilingReport {
    pub fn extracted_count(&self) -> usize {
        self.items.values().filter(|result| result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.extracted_count()
    }
}

#[derive(Debug, Clone)]
pub struct FilingExtractor {
    toc: TocLocator,
    boundaries: ItemBoundaryResolver,
    cleaner: ItemContentCleaner,
    structure: StructureBuilder,
}

impl FilingExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        Ok(Self {
            toc: TocLocator::new(config.toc)?,
            boundaries: ItemBoundaryResolver::new(config.boundary)?,
            cleaner: ItemContentCleaner::new(config.cleaner)?,
            structure: StructureBuilder::new()?,
        })
    }

    pub fn parse_toc(&self, html: &str, kind: &FilingKind) -> Result<TocMap, ExtractError> {
        self.toc.parse_toc(html, kind)
    }

    pub fn scoped_toc(&self, toc: &TocMap, kind: &FilingKind) -> TocMap {
        let mut scoped = toc.clone();
        if !kind.expected_items().is_empty() {
            scoped.retain(|entry| kind.expects_item(&entry.item_number));
        }
        scoped
    }

    pub fn resolve_positions(&self, html: &str, toc: &TocMap) -> ItemPositions {
        self.boundaries.resolve(html, toc)
    }

    pub fn extract_item(
        &self,
        html: &str,
        item_number: &str,
        toc: &TocMap,
    ) -> Result<ExtractedItem, ExtractError> {
        if !toc.contains(item_number) {
            return Err(ExtractError::ItemNotInToc(item_number.to_string()));
        }
        let positions = self.resolve_positions(html, toc);
        self.extract_resolved(html, item_number, toc, &positions)
    }

    pub fn extract_items<S: AsRef<str>>(&self, html: &str, item_numbers: &[S], toc: &TocMap) -> ItemResults {
        let mut requested = item_numbers
            .iter()
            .map(|item| item.as_ref().trim().to_ascii_uppercase())
            .filter(|item| !item.is_empty())
            .collect::<Vec<String>>();
        requested.sort_by_key(|item| item_sort_key(item));
        requested.dedup();

        let positions = self.resolve_positions(html, toc);
        requested
            .into_iter()
            .map(|item| {
                let result = self.extract_resolved(html, &item, toc, &positions);
                (item, result)
            })
            .collect()
    }

    pub fn extract_all_items(&self, html: &str, toc: &TocMap) -> ItemResults {
        let items = toc.item_numbers().collect::<Vec<&str>>();
        self.extract_items(html, &items, toc)
    }

    pub fn extract_structure(
        &self,
        item: &ExtractedItem,
        root_heading: Option<&str>,
    ) -> Result<Vec<StructureNode>, ExtractError> {
        let forest = self.structure.build(&item.html_content, root_heading);
        validate_layers(&forest).map_err(|violation| ExtractError::StructureExtraction {
            item: item.item_number.clone(),
            reason: violation.to_string(),
        })?;
        Ok(forest)
    }

    pub fn process_filing(
        &self,
        html: &str,
        kind: &FilingKind,
        options: &ProcessOptions,
    ) -> Result<FilingReport, ExtractError> {
        let toc = self.scoped_toc(&self.parse_toc(html, kind)?, kind);

        let missing_expected = kind
            .expected_items()
            .iter()
            .map(|(number, _)| *number)
            .filter(|number| !toc.contains(number))
            .map(str::to_string)
            .collect::<Vec<String>>();

        let items = match options.items.as_deref() {
            Some(requested) => self.extract_items(html, requested, &toc),
            None => self.extract_all_items(html, &toc),
        };

        let structures = if options.structures {
            items
                .iter()
                .map(|(number, result)| {
                    let structure = match result {
                        Ok(item) => {
                            let root = options
                                .root_heading
                                .then(|| canonical_root_heading(kind, item));
                            self.extract_structure(item, root.as_deref())
                        }
                        Err(error) => Err(ExtractError::StructureExtraction {
                            item: number.clone(),
                            reason: error.to_string(),
                        }),
                    };
                    (number.clone(), structure)
                })
                .collect()
        } else {
            StructureResults::new()
        };

        let report = FilingReport {
            filing: kind.clone(),
            toc,
            missing_expected,
            items,
            structures,
        };
        debug!(
            filing = %kind,
            toc_entries = report.toc.len(),
            extracted = report.extracted_count(),
            failed = report.failed_count(),
            "processed filing"
        );
        Ok(report)
    }

    fn extract_resolved(
        &self,
        html: &str,
        item_number: &str,
        toc: &TocMap,
        positions: &ItemPositions,
    ) -> Result<ExtractedItem, ExtractError> {
        let entry = toc
            .get(item_number)
            .ok_or_else(|| ExtractError::ItemNotInToc(item_number.to_string()))?;
        let span = positions
            .get(item_number)
            .ok_or_else(|| ExtractError::ItemBoundaryUnresolved(item_number.to_string()))?;
        let slice = html
            .get(span.start..span.end)
            .ok_or_else(|| ExtractError::ItemExtraction {
                item: item_number.to_string(),
                reason: format!(
                    "span {}..{} is not a valid slice of a {}-byte document",
                    span.start,
                    span.end,
                    html.len()
                ),
            })?;

        Ok(self.cleaner.clean(slice, item_number, Some(&entry.title)))
    }
}

pub fn canonical_root_heading(kind: &FilingKind, item: &ExtractedItem) -> String {
    if let Some(title) = kind.canonical_title(&item.item_number) {
        return format!("Item {}. {}", item.item_number, title);
    }

    let title = item.item_title.trim();
    let labelled = title
        .get(..4)
        .is_some_and(|head| head.eq_ignore_ascii_case("item"));
    if labelled {
        title.to_string()
    } else {
        format!("Item {}. {}", item.item_number, title)
    }
}
