//! Snapshot assembly: deduplication, template fallback, and confidence
//! tagging over the per-section record streams.

use chrono::NaiveDate;
use tracing::warn;

use crate::dates::ReportDates;
use crate::record::{CanonicalRecord, EntityKey, Provenance, RowType, Snapshot, Value};
use crate::schema::ColumnTemplate;
use crate::warning::{ExtractWarning, WarningCode};

/// One section's extracted records plus what is needed to substitute a
/// template when the document yielded nothing for it.
#[derive(Debug, Clone)]
pub struct SectionDraft {
    pub table: String,
    pub name: String,
    pub records: Vec<CanonicalRecord>,
    pub template: ColumnTemplate,
    pub template_entities: Vec<String>,
}

/// An all-null record for one expected entity, so consumers keying on
/// (date, entity) see the absence explicitly instead of a missing row.
fn template_record(template: &ColumnTemplate, entity: &str) -> CanonicalRecord {
    let mut fields: Vec<(String, Value)> = Vec::with_capacity(template.fields.len());
    fields.push((
        template.fields[0].name.clone(),
        Value::Text(entity.to_string()),
    ));
    for field in &template.fields[1..] {
        fields.push((field.name.clone(), Value::Null));
    }
    CanonicalRecord {
        entity: entity.to_string(),
        fields,
        row_type: RowType::from_entity(entity),
        provenance: Provenance {
            page: 0,
            table_index: 0,
        },
    }
}

fn dedup_last_wins(
    draft_table: &str,
    draft_name: &str,
    records: Vec<CanonicalRecord>,
    report_date: Option<NaiveDate>,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<CanonicalRecord> {
    let mut keys: Vec<EntityKey> = Vec::new();
    let mut out: Vec<CanonicalRecord> = Vec::new();
    for record in records {
        let key = EntityKey::new(report_date, &record.entity);
        if let Some(index) = keys.iter().position(|existing| *existing == key) {
            warn!(
                section = draft_name,
                entity = %record.entity,
                "duplicate entity, keeping the later row"
            );
            warnings.push(
                ExtractWarning::new(
                    WarningCode::DuplicateEntity,
                    format!("entity {:?} appeared more than once", record.entity),
                )
                .with_table(draft_table)
                .with_section(draft_name),
            );
            out[index] = record;
        } else {
            keys.push(key);
            out.push(record);
        }
    }
    out
}

/// Builds the final snapshot. Sections keep their declaration order; a
/// section with no extracted rows is filled from its entity template so the
/// output shape stays stable across good and bad documents.
#[must_use]
pub fn assemble(
    drafts: Vec<SectionDraft>,
    dates: &ReportDates,
    target_date: Option<NaiveDate>,
    warnings: &mut Vec<ExtractWarning>,
) -> Snapshot {
    let report_date = target_date.or(dates.report_date);
    let low_confidence = report_date.is_none();
    if low_confidence {
        warnings.push(ExtractWarning::new(
            WarningCode::LowConfidence,
            "snapshot emitted without a resolved report date",
        ));
    }

    let mut sections = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let records = if draft.records.is_empty() {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::NotFound,
                    "no rows extracted; emitting the entity template",
                )
                .with_table(&draft.table)
                .with_section(&draft.name),
            );
            draft
                .template_entities
                .iter()
                .map(|entity| template_record(&draft.template, entity))
                .collect()
        } else {
            dedup_last_wins(
                &draft.table,
                &draft.name,
                draft.records,
                report_date,
                warnings,
            )
        };
        sections.push((draft.name, records));
    }

    Snapshot {
        report_date,
        reporting_datetime: dates.reporting_datetime,
        low_confidence,
        sections,
    }
}
