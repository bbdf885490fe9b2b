//! Table extraction and normalization for daily power supply position (PSP)
//! reports published by regional grid operators.
//!
//! The input is a [`ReportDocument`]: pages of text, positioned words, and
//! provider-detected tables. The output is a [`Snapshot`]: per-section lists
//! of typed, canonically named records, ready for upsert keyed on
//! (report date, entity).
//!
//! The pipeline is operator-agnostic; everything format-specific (headings,
//! section markers, column templates, entity rosters) is data in an
//! [`OperatorSchema`]. Extraction is best-effort: malformed or missing
//! pieces degrade to nulls, template records, and [`ExtractWarning`]s rather
//! than failing the document.

pub mod assemble;
pub mod dates;
pub mod document;
pub mod error;
pub mod header;
pub mod locate;
pub mod pattern;
pub mod record;
pub mod scalars;
pub mod schema;
pub mod section;
pub mod tokenize;
pub mod warning;

use chrono::NaiveDate;
use tracing::{debug, info};

pub use crate::document::{BBox, Page, PageTable, ReportDocument, TableRow, Word};
pub use crate::error::ExtractError;
pub use crate::pattern::PatternVariant;
pub use crate::record::{CanonicalRecord, EntityKey, Provenance, RowType, Snapshot, Value};
pub use crate::schema::{OperatorSchema, builtin, northern_region, southern_region};
pub use crate::warning::{ExtractWarning, WarningCode};

use crate::assemble::{SectionDraft, assemble};
use crate::dates::{ReportDates, resolve_report_dates};
use crate::locate::{locate_fixed_grid, locate_sectioned_rows};
use crate::pattern::classify_variant;
use crate::scalars::clean_cell;
use crate::schema::{FixedGridSpec, TableMode, TableSchema};
use crate::section::split_sections;
use crate::tokenize::{tokenize_fixed_row, tokenize_sectioned_row};
use crate::warning::WarningCode as Code;

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub snapshot: Snapshot,
    pub variant: PatternVariant,
    pub dates: ReportDates,
    pub warnings: Vec<ExtractWarning>,
}

/// Raw rows of the table the layout classifier samples.
fn reference_rows(document: &ReportDocument, table: &TableSchema) -> Option<Vec<Vec<String>>> {
    match &table.mode {
        TableMode::Sectioned(_) => locate_sectioned_rows(document, table)
            .map(|rows| rows.into_iter().map(|row| row.cells).collect()),
        TableMode::FixedGrid(_) => locate_fixed_grid(document, table).map(|grid| {
            let mut rows = grid.header;
            rows.extend(grid.rows.into_iter().map(|row| row.cells));
            rows
        }),
    }
}

/// Matches a fixed-grid row's leading label against the entity roster and
/// canonicalizes abbreviations.
fn match_entity(cells: &[String], grid: &FixedGridSpec) -> Option<String> {
    let label = cells.iter().find(|cell| !cell.is_empty())?;
    let upper = clean_cell(label).to_uppercase();
    if !grid.entities.contains(&upper) {
        return None;
    }
    Some(
        grid.aliases
            .iter()
            .find(|(from, _)| *from == upper)
            .map_or(upper, |(_, to)| to.clone()),
    )
}

fn extract_fixed_grid(
    document: &ReportDocument,
    table: &TableSchema,
    grid: &FixedGridSpec,
    variant: PatternVariant,
    warnings: &mut Vec<ExtractWarning>,
) -> SectionDraft {
    let located = locate_fixed_grid(document, table);
    let observed = located
        .as_ref()
        .map_or_else(Vec::new, |grid| header::merge_header_rows(&grid.header));
    // Generic tables declare no template; their fields take the observed
    // header's names instead.
    let template = table
        .template_for(variant)
        .unwrap_or_else(|| header::template_from_header(&observed));
    let mut records = Vec::new();

    if let Some(located) = located {
        if header::width_mismatch(&template, observed.len()) {
            warnings.push(
                ExtractWarning::new(
                    Code::Malformed,
                    format!(
                        "observed {} header columns where the template declares {}",
                        observed.len(),
                        template.fields.len()
                    ),
                )
                .with_table(&table.name)
                .with_page(located.page),
            );
        }
        for row in &located.rows {
            let Some(entity) = match_entity(&row.cells, grid) else {
                continue;
            };
            let is_cutoff = grid
                .cutoff_entity
                .as_deref()
                .is_some_and(|cutoff| cutoff == entity);
            records.push(tokenize_fixed_row(row, &template, entity));
            // Rows below the cutoff entity are footnotes and disclaimers.
            if is_cutoff {
                break;
            }
        }
        debug!(table = %table.name, rows = records.len(), "fixed grid extracted");
    } else {
        warnings.push(
            ExtractWarning::new(Code::NotFound, "heading or table not located")
                .with_table(&table.name),
        );
    }

    SectionDraft {
        table: table.name.clone(),
        name: grid.section_name.clone(),
        records,
        template,
        template_entities: grid.template_entities.clone(),
    }
}

fn extract_sectioned(
    document: &ReportDocument,
    table: &TableSchema,
    spec: &schema::SectionedSpec,
    variant: PatternVariant,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<SectionDraft> {
    let Some(shape) = spec.shape_for(variant) else {
        return Vec::new();
    };
    let template = shape.template();

    let sections = match locate_sectioned_rows(document, table) {
        Some(rows) => split_sections(spec, &rows),
        None => {
            warnings.push(
                ExtractWarning::new(Code::NotFound, "heading or table not located")
                    .with_table(&table.name),
            );
            spec.sections
                .iter()
                .map(|section| (section.name.clone(), Vec::new()))
                .collect()
        }
    };

    spec.sections
        .iter()
        .zip(sections)
        .map(|(section, (name, rows))| {
            let records: Vec<CanonicalRecord> = rows
                .iter()
                .filter_map(|row| tokenize_sectioned_row(row, shape))
                .collect();
            debug!(table = %table.name, section = %name, rows = records.len(), "section extracted");
            SectionDraft {
                table: table.name.clone(),
                name,
                records,
                template: template.clone(),
                template_entities: section.template_entities.clone(),
            }
        })
        .collect()
}

/// Runs the full pipeline over one document.
///
/// `target_date` overrides whatever report date the document resolves to;
/// callers re-ingesting a known day's filing pass it to pin the snapshot.
/// The only fatal failures are an invalid schema and (upstream) a provider
/// error; everything else degrades into warnings on the [`Extraction`].
pub fn extract(
    document: &ReportDocument,
    schema: &OperatorSchema,
    target_date: Option<NaiveDate>,
) -> Result<Extraction, ExtractError> {
    schema.validate()?;
    let mut warnings = Vec::new();

    let dates = match document.first_page() {
        Some(page) => resolve_report_dates(page, &mut warnings),
        None => {
            warnings.push(ExtractWarning::new(Code::NotFound, "document has no pages"));
            ReportDates::default()
        }
    };

    let variant = schema
        .variant_reference_table()
        .and_then(|table| reference_rows(document, table))
        .map_or(PatternVariant::Unknown, |rows| classify_variant(&rows));
    info!(
        operator = %schema.operator,
        ?variant,
        report_date = ?dates.report_date,
        "document classified"
    );

    let mut drafts = Vec::new();
    for table in &schema.tables {
        match &table.mode {
            TableMode::FixedGrid(grid) => {
                drafts.push(extract_fixed_grid(document, table, grid, variant, &mut warnings));
            }
            TableMode::Sectioned(spec) => {
                drafts.extend(extract_sectioned(document, table, spec, variant, &mut warnings));
            }
        }
    }

    let snapshot = assemble(drafts, &dates, target_date, &mut warnings);
    Ok(Extraction {
        snapshot,
        variant,
        dates,
        warnings,
    })
}
