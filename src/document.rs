use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// One positioned word on a page, in page coordinates (top grows downward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub top: f32,
    pub left: f32,
    pub right: f32,
}

/// Bounding box as `(left, top, right, bottom)` in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// One extracted table row together with its vertical position, so tables
/// that span a heading can be filtered row by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub top: f32,
    pub cells: Vec<String>,
}

/// A table detected by the external provider: a bounding box plus its
/// already-extracted rows of cell strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTable {
    pub bbox: BBox,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number as reported by the provider.
    pub number: u32,
    pub text: String,
    pub words: Vec<Word>,
    pub tables: Vec<PageTable>,
}

/// An immutable, fully materialized report document. Owned by a single
/// pipeline invocation; the engine holds no state beyond it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub pages: Vec<Page>,
}

impl ReportDocument {
    #[must_use]
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Consumes a possibly lazy provider eagerly, page by page. Any provider
    /// failure aborts this document and surfaces as
    /// [`ExtractError::Provider`].
    pub fn from_provider<I>(pages: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = Result<Page, String>>,
    {
        let pages = pages
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(ExtractError::Provider)?;
        Ok(Self { pages })
    }

    #[must_use]
    pub fn first_page(&self) -> Option<&Page> {
        self.pages.first()
    }
}
