//! Heading-anchored table location.
//!
//! Table geometry alone is unreliable in these reports; the numbered section
//! headings ("2(A)", "3(B)") are the stable anchors. A table belongs to a
//! heading when its bounding box ends below the heading's vertical position,
//! and rows above the heading are cropped away so a grid spanning the whole
//! page cannot leak unrelated content in.

use regex::Regex;
use tracing::debug;

use crate::document::ReportDocument;
use crate::scalars::clean_cell;
use crate::schema::TableSchema;

/// Rows printed this close below a heading still count as above it.
const HEADING_MARGIN: f32 = 2.0;

/// One cleaned table row with enough provenance to trace records back to the
/// document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub page: u32,
    pub table_index: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    fn new(page: u32, table_index: usize, cells: &[String]) -> Self {
        Self {
            page,
            table_index,
            cells: cells.iter().map(|cell| clean_cell(cell)).collect(),
        }
    }
}

/// A fixed-grid table pinned to its heading: the raw header rows (for
/// reconciliation) and everything below them.
#[derive(Debug, Clone)]
pub struct LocatedGrid {
    pub page: u32,
    pub table_index: usize,
    pub header: Vec<Vec<String>>,
    pub rows: Vec<RawRow>,
}

fn normalize_word(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Finds the first word matching the heading pattern, scanning pages in
/// order. Returns the page index and the heading's vertical position.
#[must_use]
pub fn find_heading(document: &ReportDocument, heading: &Regex) -> Option<(usize, f32)> {
    for (page_index, page) in document.pages.iter().enumerate() {
        for word in &page.words {
            if heading.is_match(&normalize_word(&word.text)) {
                debug!(page = page.number, top = word.top, "heading located");
                return Some((page_index, word.top));
            }
        }
    }
    None
}

fn row_has_signature(cells: &[String], signature: &[String]) -> bool {
    let joined = cells
        .iter()
        .map(|cell| clean_cell(cell).to_uppercase())
        .collect::<Vec<_>>()
        .join(" ");
    signature.iter().all(|keyword| joined.contains(keyword))
}

/// Locates a fixed-grid table: the first table below the heading whose rows
/// contain the header signature. Rows above the heading are dropped before
/// the signature scan so a page-spanning grid reports only its own rows.
#[must_use]
pub fn locate_fixed_grid(document: &ReportDocument, table: &TableSchema) -> Option<LocatedGrid> {
    let (page_index, heading_top) = find_heading(document, &table.heading)?;
    let page = &document.pages[page_index];

    for (table_index, candidate) in page.tables.iter().enumerate() {
        if candidate.bbox.bottom < heading_top {
            continue;
        }
        let rows: Vec<&crate::document::TableRow> = candidate
            .rows
            .iter()
            .filter(|row| row.top > heading_top + HEADING_MARGIN)
            .collect();

        let signature_index = if table.header_signature.is_empty() {
            Some(0)
        } else {
            rows.iter()
                .position(|row| row_has_signature(&row.cells, &table.header_signature))
        };
        let Some(signature_index) = signature_index else {
            continue;
        };

        // Pull in a super-header row ("STATE") sitting directly above the
        // signature row; its labels span the merged header.
        let mut header: Vec<Vec<String>> = Vec::new();
        if signature_index > 0 {
            if let Some(hint) = &table.super_header_hint {
                let above = &rows[signature_index - 1].cells;
                if row_has_signature(above, std::slice::from_ref(hint)) {
                    header.push(above.iter().map(|cell| clean_cell(cell)).collect());
                }
            }
        }
        header.push(
            rows[signature_index]
                .cells
                .iter()
                .map(|cell| clean_cell(cell))
                .collect(),
        );

        let data = rows[signature_index + 1..]
            .iter()
            .map(|row| RawRow::new(page.number, table_index, &row.cells))
            .collect();
        return Some(LocatedGrid {
            page: page.number,
            table_index,
            header,
            rows: data,
        });
    }
    None
}

/// Collects every row belonging to a sectioned table: tables below the
/// heading on its page, then every table on subsequent pages (the section
/// state machine decides where the table actually ends).
#[must_use]
pub fn locate_sectioned_rows(document: &ReportDocument, table: &TableSchema) -> Option<Vec<RawRow>> {
    let (heading_page, heading_top) = find_heading(document, &table.heading)?;
    let mut rows = Vec::new();

    for (page_index, page) in document.pages.iter().enumerate().skip(heading_page) {
        for (table_index, candidate) in page.tables.iter().enumerate() {
            if page_index == heading_page && candidate.bbox.bottom < heading_top {
                continue;
            }
            for row in &candidate.rows {
                if page_index == heading_page && row.top <= heading_top + HEADING_MARGIN {
                    continue;
                }
                rows.push(RawRow::new(page.number, table_index, &row.cells));
            }
        }
    }
    if rows.is_empty() { None } else { Some(rows) }
}
